use thiserror::Error;

/// Why a stage stopped. Its `Display` is the cause shown to the requester.
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Tool(#[from] crate::error::ToolError),

    #[error(transparent)]
    Storage(#[from] crate::error::StorageError),
}
