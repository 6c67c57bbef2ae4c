//! `fastpy` rewrites a Python file into a `_FAST` variant: JIT or caching
//! decorators on every function, a multiprocessing entry point, or guidance
//! comments for Cython, C/C++ translation and NumPy vectorization.
//!
//! ```
//! use fastpy::Method;
//! let out = Method::Numba.apply("def f(x): return x+1\n").unwrap();
//! assert!(out.text.contains("from numba import njit\n@njit\ndef f(x): return x+1\n"));
//! ```

pub mod error;
pub mod location;
pub mod menu;
pub mod method;
pub mod optimize;
pub mod runner;
pub mod syntax;
pub mod transform;

pub use error::OptimizeError;
pub use method::{InvalidMethod, Method, Optimized};
pub use optimize::{Outcome, optimize_file, output_path};
pub use runner::{RunError, run_script};
