use std::path::PathBuf;

/// Errors produced by the network, its samples and the model file codec.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A vector's length disagrees with the network topology.
    #[error("shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The topology stored in a model file is not the one of the live network.
    #[error("topology mismatch: network is {expected}, model file is {actual}")]
    TopologyMismatch { expected: String, actual: String },

    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// Malformed model or sample file.
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// No model file exists at the requested path.
    #[error("model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Error::ShapeMismatch {
                what,
                expected,
                actual,
            })
        }
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}
