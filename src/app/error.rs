use thiserror::Error;

#[derive(Error, Debug)]
pub enum EstuaryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid bridge name: {0}")]
    InvalidName(String),

    #[error("Bridge not found: {0}")]
    BridgeNotFound(String),

    /// The upstream source is missing, unusable or unparsable. Carries an
    /// HTTP-like status for the boundary layer.
    #[error("Data source error ({code}): {message}")]
    DataSource { code: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Bridge descriptor error: {0}")]
    Descriptor(#[from] toml::de::Error),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl EstuaryError {
    pub fn data_source(code: u16, message: impl Into<String>) -> Self {
        Self::DataSource {
            code,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EstuaryError>;
