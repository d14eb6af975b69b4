use std::fmt;
use std::io;

/// A handful of richer error cases the core needs beyond bare `io::Error`.
/// Everywhere else flows through `io::Result` and `?`, matching the
/// teacher's style of not reaching for `anyhow`/`thiserror`.
#[derive(Debug)]
pub enum MuxError {
    Io(io::Error),
    Spawn(String),
}

impl fmt::Display for MuxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MuxError::Io(e) => write!(f, "{e}"),
            MuxError::Spawn(msg) => write!(f, "spawn failed: {msg}"),
        }
    }
}

impl std::error::Error for MuxError {}

impl From<io::Error> for MuxError {
    fn from(e: io::Error) -> Self {
        MuxError::Io(e)
    }
}

impl From<MuxError> for io::Error {
    fn from(e: MuxError) -> Self {
        match e {
            MuxError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, MuxError>;
