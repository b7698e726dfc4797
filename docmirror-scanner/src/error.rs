use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported URL scheme '{0}': only http and https can be mirrored")]
    UnsupportedScheme(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Diagram placeholder {token} occurred {occurrences} time(s) after conversion")]
    DiagramPlaceholder { token: String, occurrences: usize },
}

pub type Result<T> = std::result::Result<T, ScanError>;
