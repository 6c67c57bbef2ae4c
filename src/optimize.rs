use crate::error::OptimizeError;
use crate::method::{Method, Optimized};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A completed optimization of one file.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub method: Method,
    #[serde(flatten)]
    pub result: Optimized,
}

pub fn read_source(path: &Path) -> Result<String, OptimizeError> {
    fs::read_to_string(path).map_err(|source| OptimizeError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// `dir/name.py` becomes `dir/name_FAST.py`.  The `_FAST` marker goes before
/// the last extension; a file without one just gets the suffix.
pub fn output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{stem}_FAST.{}", ext.to_string_lossy()),
        None => format!("{stem}_FAST"),
    };
    input.with_file_name(name)
}

pub fn write_output(path: &Path, text: &str) -> Result<(), OptimizeError> {
    fs::write(path, text).map_err(|source| OptimizeError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Read `input`, apply `method` and write the result next to it.  Nothing is
/// written unless the transform succeeds.
pub fn optimize_file(input: &Path, method: Method) -> Result<Outcome, OptimizeError> {
    let source = read_source(input)?;
    tracing::debug!(path = %input.display(), bytes = source.len(), "read source");

    let result = method.apply(&source).map_err(|source| OptimizeError::Parse {
        path: input.to_path_buf(),
        source,
    })?;

    let output = output_path(input);
    write_output(&output, &result.text)?;
    tracing::debug!(path = %output.display(), bytes = result.text.len(), "wrote output");

    Ok(Outcome {
        input: input.to_path_buf(),
        output,
        method,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_path() {
        assert_eq!(output_path(Path::new("demo.py")), PathBuf::from("demo_FAST.py"));
        assert_eq!(
            output_path(Path::new("pkg/sub/mod.py")),
            PathBuf::from("pkg/sub/mod_FAST.py")
        );
        assert_eq!(output_path(Path::new("script")), PathBuf::from("script_FAST"));
        assert_eq!(
            output_path(Path::new("archive.tar.py")),
            PathBuf::from("archive.tar_FAST.py")
        );
    }

    #[test]
    fn test_optimize_file_writes_sibling() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("calc.py");
        fs::write(&input, "def f(x): return x+1\n").unwrap();

        let outcome = optimize_file(&input, Method::Caching).unwrap();
        assert_eq!(outcome.output, dir.path().join("calc_FAST.py"));
        let written = fs::read_to_string(&outcome.output).unwrap();
        assert_eq!(written, outcome.result.text);
        assert!(written.contains("@lru_cache\ndef f(x)"));
        // input untouched
        assert_eq!(fs::read_to_string(&input).unwrap(), "def f(x): return x+1\n");
    }

    #[test]
    fn test_parse_error_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("bad.py");
        fs::write(&input, "def broken(:\n").unwrap();

        let err = optimize_file(&input, Method::Numba).unwrap_err();
        assert!(matches!(err, OptimizeError::Parse { .. }));
        assert!(!dir.path().join("bad_FAST.py").exists());
    }

    #[test]
    fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let err = optimize_file(&dir.path().join("nope.py"), Method::Numba).unwrap_err();
        assert!(matches!(err, OptimizeError::Read { .. }));
    }

    #[test]
    fn test_write_into_missing_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("missing").join("out_FAST.py");

        let err = write_output(&target, "x = 1\n").unwrap_err();
        assert!(matches!(&err, OptimizeError::Write { path, .. } if *path == target));
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().starts_with("cannot write "));
        assert!(!target.exists());
    }

    #[test]
    fn test_unwritable_output_is_write_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("calc.py");
        fs::write(&input, "def f(x): return x+1\n").unwrap();
        // A directory squatting on the output name makes the write fail.
        fs::create_dir(dir.path().join("calc_FAST.py")).unwrap();

        let err = optimize_file(&input, Method::Numba).unwrap_err();
        assert!(matches!(err, OptimizeError::Write { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_outcome_json() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("m.py");
        fs::write(&input, "x = 1\n").unwrap();
        let outcome = optimize_file(&input, Method::Multiprocessing).unwrap();
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["method"], "multiprocessing");
        assert_eq!(value["guard"]["outcome"], "added");
        assert_eq!(value["guard"]["stub_main"], true);
    }
}
