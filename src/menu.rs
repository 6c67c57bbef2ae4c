//! Method catalogue and the interactive prompts.

use crate::method::Method;
use anyhow::{Context, Result, bail};
use colored::Colorize;
use std::io::{BufRead, Write};
use std::path::PathBuf;

// ── Catalogue ─────────────────────────────────────────────────────────────────

/// What each method does to the file, shown by `--list-methods`.
fn effect(method: Method) -> &'static str {
    match method {
        Method::Multiprocessing => "adds an `if __name__ == '__main__'` block running main() in a Process",
        Method::CTranslation => "adds pybind11/Cython translation guidance comments",
        Method::Numba => "adds @njit to every function and imports it",
        Method::Cython => "adds the language_level=3 directive and .pyx guidance",
        Method::Caching => "adds @lru_cache to every function and imports it",
        Method::Vectorize => "imports numpy as np and adds vectorization guidance",
    }
}

pub fn print_methods() {
    println!("  {}", "Methods".bold().underline());
    println!();
    for m in Method::ALL {
        println!(
            "    {}  {:<16}  {:<30}  {}",
            m.number().to_string().cyan().bold(),
            m.name().white().bold(),
            m.label(),
            format!("# {}", effect(m)).truecolor(90, 90, 90),
        );
    }
    println!();
    println!("  Usage:  fastpy <FILE> [METHOD] [--run]");
    println!("          fastpy calc.py 3                 numba, writes calc_FAST.py");
    println!("          fastpy calc.py caching --run     cache, then run the result");
    println!("          fastpy                           interactive mode");
    println!();
}

// ── Prompts ───────────────────────────────────────────────────────────────────

fn read_answer<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    let n = input.read_line(&mut line).context("failed to read from stdin")?;
    if n == 0 {
        bail!("no input given");
    }
    Ok(line.trim().to_string())
}

/// Ask for the file to optimize.  Blank answers are asked again.
pub fn prompt_file<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<PathBuf> {
    loop {
        write!(out, "Enter the Python file name to optimize: ")?;
        out.flush()?;
        let answer = read_answer(input)?;
        if !answer.is_empty() {
            return Ok(PathBuf::from(answer));
        }
    }
}

/// Show the menu until a valid method is chosen.
pub fn prompt_method<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Method> {
    loop {
        writeln!(out, "Please select one of the following optimization methods:")?;
        for m in Method::ALL {
            writeln!(out, "{} - {}", m.number(), m.label())?;
        }
        write!(out, "Your choice (1-6): ")?;
        out.flush()?;

        let answer = read_answer(input)?;
        match answer.parse::<Method>() {
            Ok(m) => return Ok(m),
            Err(e) => {
                tracing::debug!(%e, "rejected menu choice");
                writeln!(out, "Invalid selection!")?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_prompt_file() {
        let mut input = Cursor::new("\n  calc.py  \n");
        let mut out = Vec::new();
        let path = prompt_file(&mut input, &mut out).unwrap();
        assert_eq!(path, PathBuf::from("calc.py"));
        let shown = String::from_utf8(out).unwrap();
        assert_eq!(shown.matches("Enter the Python file name to optimize: ").count(), 2);
    }

    #[test]
    fn test_prompt_method_menu() {
        let mut input = Cursor::new("3\n");
        let mut out = Vec::new();
        assert_eq!(prompt_method(&mut input, &mut out).unwrap(), Method::Numba);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Please select one of the following optimization methods:\n\
             1 - Multiprocessing support\n\
             2 - Translation to C/C++\n\
             3 - Numba JIT optimization\n\
             4 - Cython preparation\n\
             5 - Caching with lru_cache\n\
             6 - Vectorized operations (NumPy)\n\
             Your choice (1-6): "
        );
    }

    #[test]
    fn test_prompt_method_reprompts() {
        let mut input = Cursor::new("9\nabc\n5\n");
        let mut out = Vec::new();
        assert_eq!(prompt_method(&mut input, &mut out).unwrap(), Method::Caching);
        let shown = String::from_utf8(out).unwrap();
        assert_eq!(shown.matches("Invalid selection!").count(), 2);
        assert_eq!(shown.matches("Your choice (1-6): ").count(), 3);
    }

    #[test]
    fn test_prompt_eof_is_error() {
        let mut out = Vec::new();
        assert!(prompt_method(&mut Cursor::new("7\n"), &mut out).is_err());
        assert!(prompt_file(&mut Cursor::new(""), &mut out).is_err());
    }
}
