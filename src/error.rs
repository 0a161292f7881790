use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChunkcastError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Chunk {0} not found")]
    ChunkNotFound(u32),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Audio codec error: {0}")]
    Audio(String),

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of a [`ChunkcastError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidConfiguration,
    Io,
}

impl ChunkcastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChunkcastError::FileNotFound(_) | ChunkcastError::ChunkNotFound(_) => {
                ErrorKind::NotFound
            }
            ChunkcastError::Config(_) => ErrorKind::InvalidConfiguration,
            ChunkcastError::Audio(_)
            | ChunkcastError::Resample(_)
            | ChunkcastError::Render(_)
            | ChunkcastError::Io(_)
            | ChunkcastError::Json(_) => ErrorKind::Io,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<hound::Error> for ChunkcastError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => ChunkcastError::Io(e),
            other => ChunkcastError::Audio(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChunkcastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ChunkcastError::FileNotFound("x".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(ChunkcastError::ChunkNotFound(3).kind(), ErrorKind::NotFound);
        assert_eq!(
            ChunkcastError::Config("bad".into()).kind(),
            ErrorKind::InvalidConfiguration
        );
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(ChunkcastError::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_chunk_not_found_message() {
        assert_eq!(ChunkcastError::ChunkNotFound(7).to_string(), "Chunk 7 not found");
    }
}
