use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}
