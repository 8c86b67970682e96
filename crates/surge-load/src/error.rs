//! Load worker error types.

use thiserror::Error;

pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to spawn load worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}
