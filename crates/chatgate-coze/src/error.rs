use thiserror::Error;

#[derive(Debug, Error)]
pub enum CozeError {
    /// The provider could not be reached or the body could not be read.
    #[error("coze transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The provider answered with something other than the expected envelope.
    #[error("coze response unreadable: {0}")]
    Decode(String),
    /// The provider answered with a non-zero `code`.
    #[error("coze returned code {code}: {msg}")]
    Upstream { code: i64, msg: String },
}
