use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::app::{EstuaryError, Result};
use crate::bridge::{Bridge, BridgeRunner};
use crate::domain::BridgeMetadata;

/// File suffix of bridge descriptors under the registry root.
pub const DESCRIPTOR_SUFFIX: &str = ".toml";

/// Factory producing a concrete bridge from its descriptor metadata.
pub type BridgeFactory = Box<dyn Fn(BridgeMetadata) -> Box<dyn Bridge> + Send + Sync>;

/// Outcome of [`BridgeRegistry::create`]: a usable bridge, or an explicit
/// "not usable" marker for names whose descriptor exists but which no
/// concrete factory backs. The marker is a normal outcome, not an error:
/// discovery uses it to silently skip non-leaf names.
pub enum Created {
    Bridge(BridgeRunner),
    NotInstantiable,
}

/// Validates names, enumerates descriptor files and instantiates bridges.
///
/// The registry is constructed with an explicit root; there is no ambient
/// process-wide state. Concrete bridges are bound to their names through
/// [`register`](Self::register) at startup.
pub struct BridgeRegistry {
    root: PathBuf,
    factories: HashMap<String, BridgeFactory>,
}

impl BridgeRegistry {
    /// Create a registry over a bridge descriptor directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            return Err(EstuaryError::Config(format!(
                "bridge directory does not exist: {}",
                root.display()
            )));
        }
        Ok(Self {
            root,
            factories: HashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Bind `name` to a concrete factory.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(BridgeMetadata) -> Box<dyn Bridge> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// A valid bridge name is one uppercase letter followed by any number
    /// of alphanumeric or dash characters.
    pub fn validate_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_uppercase() => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
    }

    /// Bridge names derivable from descriptor files under the root, with no
    /// duplicates. Directory listing order is not part of the contract.
    pub fn list(&self) -> Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(name) = file_name.strip_suffix(DESCRIPTOR_SUFFIX) {
                if !name.is_empty() {
                    names.insert(name.to_string());
                }
            }
        }
        Ok(names)
    }

    /// Membership test tried with and without the descriptor suffix.
    pub fn is_whitelisted<S: AsRef<str>>(whitelist: &[S], name: &str) -> bool {
        let with_suffix = format!("{name}{DESCRIPTOR_SUFFIX}");
        whitelist
            .iter()
            .any(|entry| entry.as_ref() == name || entry.as_ref() == with_suffix)
    }

    /// Instantiate a bridge by registered name.
    ///
    /// The name is validated before storage is touched. The descriptor file
    /// is loaded as the bridge's metadata; the bound factory turns it into
    /// a runnable bridge.
    pub fn create(&self, name: &str) -> Result<Created> {
        if !Self::validate_name(name) {
            return Err(EstuaryError::InvalidName(format!(
                "bridge name must be one uppercase letter followed by \
                 alphanumeric or dash characters, got {name:?}"
            )));
        }

        let path = self.descriptor_path(name);
        if !path.exists() {
            return Err(EstuaryError::BridgeNotFound(format!(
                "no descriptor at {}",
                path.display()
            )));
        }

        let metadata = load_metadata(&path)?;

        match self.factories.get(name) {
            Some(factory) => Ok(Created::Bridge(BridgeRunner::new(name, factory(metadata)))),
            None => {
                debug!(bridge = name, "descriptor present but no concrete factory bound");
                Ok(Created::NotInstantiable)
            }
        }
    }

    fn descriptor_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}{DESCRIPTOR_SUFFIX}"))
    }
}

fn load_metadata(path: &Path) -> Result<BridgeMetadata> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}
