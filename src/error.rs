use crate::method::InvalidMethod;
use crate::runner::RunError;
use crate::syntax::ParseError;
use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    #[error("{}: {source}", path.display())]
    Parse { path: PathBuf, source: ParseError },

    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error(transparent)]
    InvalidMethod(#[from] InvalidMethod),

    #[error(transparent)]
    Run(#[from] RunError),
}

impl OptimizeError {
    /// Process exit code for this failure.  A failed run still leaves the
    /// optimized file on disk, so it gets its own code.
    pub fn exit_code(&self) -> i32 {
        match self {
            OptimizeError::Run(_) => 3,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LineCol;

    #[test]
    fn test_parse_error_display() {
        let err = OptimizeError::Parse {
            path: PathBuf::from("demo.py"),
            source: ParseError {
                message: "invalid syntax".to_string(),
                at: LineCol { line: 3, col: 7 },
            },
        };
        assert_eq!(err.to_string(), "demo.py: invalid syntax (line 3, column 7)");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_exit_codes() {
        let invalid: OptimizeError = InvalidMethod("9".to_string()).into();
        assert_eq!(invalid.exit_code(), 2);

        let run: OptimizeError = RunError::Spawn {
            interpreter: "python3".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        }
        .into();
        assert_eq!(run.exit_code(), 3);
    }
}
