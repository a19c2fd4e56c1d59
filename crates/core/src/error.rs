#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("saved state could not be (de)serialized: {0}")]
    SavedState(#[from] serde_json::Error),

    #[error("no tokio runtime to run the screen pipelines on: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
