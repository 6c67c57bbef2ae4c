use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("could not start `{interpreter}`: {source}")]
    Spawn {
        interpreter: String,
        source: io::Error,
    },

    #[error("`{interpreter} {}` exited with {status}", script.display())]
    Failed {
        interpreter: String,
        script: PathBuf,
        status: ExitStatus,
    },
}

/// Run `script` with `interpreter`, inheriting stdio, and wait for it.
pub fn run_script(interpreter: &str, script: &Path) -> Result<(), RunError> {
    tracing::debug!(interpreter, script = %script.display(), "spawning");
    let status = Command::new(interpreter)
        .arg(script)
        .status()
        .map_err(|source| RunError::Spawn {
            interpreter: interpreter.to_string(),
            source,
        })?;
    tracing::debug!(%status, "child exited");

    if status.success() {
        Ok(())
    } else {
        Err(RunError::Failed {
            interpreter: interpreter.to_string(),
            script: script.to_path_buf(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_interpreter() {
        let err = run_script("/nonexistent/python-fastpy", Path::new("x.py")).unwrap_err();
        assert!(matches!(err, RunError::Spawn { .. }));
        assert!(err.to_string().starts_with("could not start `/nonexistent/python-fastpy`"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_is_captured() {
        assert!(run_script("true", Path::new("x.py")).is_ok());
        let err = run_script("false", Path::new("x.py")).unwrap_err();
        match err {
            RunError::Failed { status, script, .. } => {
                assert!(!status.success());
                assert_eq!(script, PathBuf::from("x.py"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
