use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("network error: {0}")]
    Network(String),

    #[error("http {status}: {body}")]
    Http { status: u16, body: String },

    #[error("parse error: {0}")]
    Parse(String),

    /// The exchange answered with its own error envelope.
    #[error("upstream error {code}: {message}")]
    Upstream { code: i64, message: String },

    #[error("other: {0}")]
    Other(String),
}

impl From<serde_json::Error> for ConnectorError {
    fn from(e: serde_json::Error) -> Self {
        ConnectorError::Parse(e.to_string())
    }
}
