use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

// ── helpers ──────────────────────────────────────────────────────────────────

fn fastpy_bin() -> PathBuf {
    // CARGO_BIN_EXE_fastpy is set by cargo test for integration tests
    PathBuf::from(env!("CARGO_BIN_EXE_fastpy"))
}

struct TempPy {
    dir: tempfile::TempDir,
}

impl TempPy {
    fn new() -> Self {
        Self {
            dir: tempfile::TempDir::new().unwrap(),
        }
    }

    fn file(&self, name: &str, content: &str) -> &Self {
        std::fs::write(self.path(name), content).unwrap();
        self
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name)).unwrap()
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(fastpy_bin());
        cmd.current_dir(self.dir.path()).args(args);
        cmd
    }

    /// Run fastpy in the temp dir.  Returns (stdout, stderr, exit_code).
    fn run(&self, args: &[&str]) -> (String, String, i32) {
        let out = self
            .command(args)
            .stdin(Stdio::null())
            .output()
            .expect("failed to run fastpy");
        (
            String::from_utf8_lossy(&out.stdout).into_owned(),
            String::from_utf8_lossy(&out.stderr).into_owned(),
            out.status.code().unwrap_or(-1),
        )
    }

    /// Run fastpy feeding `stdin` to the prompts.
    fn run_with_input(&self, args: &[&str], stdin: &str) -> (String, String, i32) {
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to run fastpy");
        child
            .stdin
            .take()
            .unwrap()
            .write_all(stdin.as_bytes())
            .unwrap();
        let out = child.wait_with_output().unwrap();
        (
            String::from_utf8_lossy(&out.stdout).into_owned(),
            String::from_utf8_lossy(&out.stderr).into_owned(),
            out.status.code().unwrap_or(-1),
        )
    }
}

fn exists(path: &Path) -> bool {
    path.try_exists().unwrap()
}

// ── methods ──────────────────────────────────────────────────────────────────

#[test]
fn test_numba_single_function() {
    let t = TempPy::new();
    t.file("calc.py", "def f(x): return x+1\n");
    let (stdout, _, code) = t.run(&["calc.py", "3"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Optimized file saved as 'calc_FAST.py'."));
    let out = t.read("calc_FAST.py");
    assert!(out.contains("from numba import njit\n@njit\ndef f(x): return x+1\n"));
}

#[test]
fn test_caching_two_functions() {
    let t = TempPy::new();
    t.file(
        "fib.py",
        "def fib(n):\n    return n if n < 2 else fib(n - 1) + fib(n - 2)\n\n\ndef double(n):\n    return 2 * n\n",
    );
    let (_, _, code) = t.run(&["fib.py", "5"]);
    assert_eq!(code, 0);
    let out = t.read("fib_FAST.py");
    assert_eq!(out.matches("@lru_cache\n").count(), 2);
    assert_eq!(out.matches("from functools import lru_cache\n").count(), 1);
    assert!(out.starts_with("# [OPTIMIZATION: Caching with lru_cache applied]\n"));
}

#[test]
fn test_method_by_name() {
    let t = TempPy::new();
    t.file("v.py", "total = sum(i * i for i in range(10))\n");
    let (_, _, code) = t.run(&["v.py", "vectorize"]);
    assert_eq!(code, 0);
    assert!(t.read("v_FAST.py").contains("import numpy as np\n"));
}

#[test]
fn test_source_file_untouched() {
    let t = TempPy::new();
    let src = "def f():\n    pass\n";
    t.file("keep.py", src);
    t.run(&["keep.py", "1"]);
    assert_eq!(t.read("keep.py"), src);
    assert!(t.read("keep_FAST.py").contains("multiprocessing.Process(target=main)"));
}

// ── errors ───────────────────────────────────────────────────────────────────

#[test]
fn test_invalid_method_writes_nothing() {
    let t = TempPy::new();
    t.file("calc.py", "def f(x): return x+1\n");
    let (_, stderr, code) = t.run(&["calc.py", "9"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("invalid method `9`"));
    assert!(!exists(&t.path("calc_FAST.py")));
}

#[test]
fn test_missing_file() {
    let t = TempPy::new();
    let (_, stderr, code) = t.run(&["nope.py", "3"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("cannot read nope.py"));
}

#[test]
fn test_syntax_error_exit_2() {
    let t = TempPy::new();
    t.file("bad.py", "def f(x)\n    return x\n");
    let (_, stderr, code) = t.run(&["bad.py", "2"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("bad.py"));
    assert!(stderr.contains("line 1"));
    assert!(!exists(&t.path("bad_FAST.py")));
}

#[test]
fn test_unwritable_output_exit_2() {
    let t = TempPy::new();
    t.file("calc.py", "def f(x): return x+1\n");
    std::fs::create_dir(t.path("calc_FAST.py")).unwrap();
    let (stdout, stderr, code) = t.run(&["calc.py", "3"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("cannot write calc_FAST.py"), "{stderr}");
    assert!(!stdout.contains("Optimized file saved"));
}

// ── --run ────────────────────────────────────────────────────────────────────

#[test]
fn test_run_failure_keeps_output() {
    let t = TempPy::new();
    t.file("calc.py", "def f(x): return x+1\n");
    let (stdout, stderr, code) =
        t.run(&["calc.py", "3", "--run", "--python", "/nonexistent/python3"]);
    assert_eq!(code, 3);
    assert!(stdout.contains("Executing the optimized file..."));
    assert!(stderr.contains("warning"));
    assert!(exists(&t.path("calc_FAST.py")));
}

#[cfg(unix)]
#[test]
fn test_run_success() {
    let t = TempPy::new();
    t.file("calc.py", "x = 1\n");
    let (_, _, code) = t.run(&["calc.py", "--run", "2", "--python", "true"]);
    assert_eq!(code, 0);
}

#[cfg(unix)]
#[test]
fn test_run_nonzero_exit() {
    let t = TempPy::new();
    t.file("calc.py", "x = 1\n");
    let (_, stderr, code) = t.run(&["calc.py", "4", "--run", "--python", "false"]);
    assert_eq!(code, 3);
    assert!(stderr.contains("exited with"));
    assert!(exists(&t.path("calc_FAST.py")));
}

// ── output formats ───────────────────────────────────────────────────────────

#[test]
fn test_json_report() {
    let t = TempPy::new();
    t.file("calc.py", "def f(x): return x+1\ndef g(): pass\n");
    let (stdout, _, code) = t.run(&["calc.py", "numba", "--json"]);
    assert_eq!(code, 0);
    let v: serde_json::Value = serde_json::from_str(&stdout).expect("stdout should be JSON");
    assert_eq!(v["method"], "numba");
    assert_eq!(v["functions_decorated"], 2);
    assert_eq!(v["import_added"], true);
    assert!(v["output"].as_str().unwrap().ends_with("calc_FAST.py"));
    assert!(v.get("run").is_none());
}

#[test]
fn test_list_methods() {
    let t = TempPy::new();
    let (stdout, _, code) = t.run(&["--list-methods"]);
    assert_eq!(code, 0);
    for name in ["multiprocessing", "c_translation", "numba", "cython", "caching", "vectorize"] {
        assert!(stdout.contains(name), "missing {name}");
    }
}

// ── interactive ──────────────────────────────────────────────────────────────

#[test]
fn test_interactive_mode() {
    let t = TempPy::new();
    t.file("calc.py", "def f(x): return x+1\n");
    let (stdout, _, code) = t.run_with_input(&[], "calc.py\n7\n5\n");
    assert_eq!(code, 0);
    assert!(stdout.contains("Enter the Python file name to optimize: "));
    assert!(stdout.contains("Invalid selection!"));
    assert!(t.read("calc_FAST.py").contains("@lru_cache\ndef f(x)"));
}

#[test]
fn test_menu_when_method_omitted() {
    let t = TempPy::new();
    t.file("calc.py", "x = 1\n");
    let (stdout, _, code) = t.run_with_input(&["calc.py"], "4\n");
    assert_eq!(code, 0);
    assert!(stdout.contains("Your choice (1-6): "));
    assert!(t.read("calc_FAST.py").contains("# cython: language_level=3\n"));
}

#[test]
fn test_prompt_without_input_fails() {
    let t = TempPy::new();
    t.file("calc.py", "x = 1\n");
    let (_, stderr, code) = t.run(&["calc.py"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("no input given"));
}
