use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StitchError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("invalid pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },
    #[error("tool error: {0}")]
    Tool(String),
    #[error("probe failed for {}: {reason}", path.display())]
    Probe { path: PathBuf, reason: String },
    #[error("concat failed: {reason}")]
    Concat { reason: String },
    #[error("move {} -> {}: {source}", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type StitchResult<T> = Result<T, StitchError>;

impl StitchError {
    pub fn probe(path: &std::path::Path, reason: impl Into<String>) -> Self {
        StitchError::Probe {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}
