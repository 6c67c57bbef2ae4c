//! Python syntax: a zero-copy lexer, a strict statement parser producing a
//! span-preserving tree, and a printer that turns the tree back into text.
//!
//! # Usage
//! ```
//! use fastpy::syntax::{parse, unparse};
//! let module = parse("import os\n").unwrap();
//! assert_eq!(unparse(&module), "import os\n");
//! ```

pub mod lexer;
pub mod parser;
pub mod printer;
pub mod tree;

pub use parser::{ParseError, parse};
pub use printer::unparse;
pub use tree::Module;
