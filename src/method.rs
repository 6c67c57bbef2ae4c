use crate::syntax::{ParseError, parse, unparse};
use crate::transform::{
    GuardOutcome, add_decorator, append_note, ensure_entry_point_guard, ensure_import,
    prepend_comments,
};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// One of the six optimization methods, numbered 1-6 as on the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Multiprocessing,
    CTranslation,
    Numba,
    Cython,
    Caching,
    Vectorize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid method `{0}`: expected a number from 1 to 6 or a method name")]
pub struct InvalidMethod(pub String);

/// The result of applying a method to a source text.
#[derive(Debug, Clone, Serialize)]
pub struct Optimized {
    #[serde(skip)]
    pub text: String,
    pub functions_decorated: usize,
    pub import_added: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard: Option<GuardOutcome>,
}

impl Method {
    pub const ALL: [Method; 6] = [
        Method::Multiprocessing,
        Method::CTranslation,
        Method::Numba,
        Method::Cython,
        Method::Caching,
        Method::Vectorize,
    ];

    pub fn number(self) -> u8 {
        match self {
            Method::Multiprocessing => 1,
            Method::CTranslation => 2,
            Method::Numba => 3,
            Method::Cython => 4,
            Method::Caching => 5,
            Method::Vectorize => 6,
        }
    }

    pub fn from_number(n: u8) -> Option<Method> {
        Self::ALL.into_iter().find(|m| m.number() == n)
    }

    /// Identifier accepted on the command line and used in JSON output.
    pub fn name(self) -> &'static str {
        match self {
            Method::Multiprocessing => "multiprocessing",
            Method::CTranslation => "c_translation",
            Method::Numba => "numba",
            Method::Cython => "cython",
            Method::Caching => "caching",
            Method::Vectorize => "vectorize",
        }
    }

    /// Menu text.
    pub fn label(self) -> &'static str {
        match self {
            Method::Multiprocessing => "Multiprocessing support",
            Method::CTranslation => "Translation to C/C++",
            Method::Numba => "Numba JIT optimization",
            Method::Cython => "Cython preparation",
            Method::Caching => "Caching with lru_cache",
            Method::Vectorize => "Vectorized operations (NumPy)",
        }
    }

    /// Transform `source`.  Every method parses its input, so a file that is
    /// not valid Python is rejected whichever method was chosen.
    pub fn apply(self, source: &str) -> Result<Optimized, ParseError> {
        let mut module = parse(source)?;
        let mut functions_decorated = 0;
        let mut import_added = false;
        let mut guard = None;

        match self {
            Method::Multiprocessing => guard = Some(ensure_entry_point_guard(&mut module)),
            Method::Numba => {
                functions_decorated = add_decorator(&mut module, "njit");
                import_added = ensure_import(&mut module, "from numba import njit")?;
            }
            Method::Caching => {
                functions_decorated = add_decorator(&mut module, "lru_cache");
                import_added = ensure_import(&mut module, "from functools import lru_cache")?;
            }
            Method::Vectorize => {
                import_added = ensure_import(&mut module, "import numpy as np")?;
            }
            Method::CTranslation | Method::Cython => {}
        }

        let printed = unparse(&module);
        let text = match self {
            Method::Multiprocessing => match guard {
                Some(GuardOutcome::AlreadyPresent) => prepend_comments(
                    &printed,
                    &[
                        "# [OPTIMIZATION: Multiprocessing]",
                        "# Note: Please ensure that the multiprocessing block in __main__ is correct.",
                    ],
                ),
                _ => prepend_comments(&printed, &["# [OPTIMIZATION: Multiprocessing]"]),
            },
            Method::CTranslation => append_note(
                &prepend_comments(
                    &printed,
                    &["# [OPTIMIZATION: Translated to a C/C++ version using pybind11]"],
                ),
                "# Note: For an actual translation, you need to manually configure tools such as Cython or pybind11.",
            ),
            Method::Numba => prepend_comments(&printed, &["# [OPTIMIZATION: Numba JIT applied]"]),
            Method::Cython => append_note(
                &prepend_comments(
                    &printed,
                    &["# [OPTIMIZATION: Prepared for Cython]", "# cython: language_level=3"],
                ),
                "# Note: To compile with Cython, change the file extension to .pyx and apply further configurations.",
            ),
            Method::Caching => {
                prepend_comments(&printed, &["# [OPTIMIZATION: Caching with lru_cache applied]"])
            }
            Method::Vectorize => append_note(
                &prepend_comments(&printed, &["# [OPTIMIZATION: Vectorized operations with NumPy]"]),
                "# Note: It is recommended to convert loops into numpy operations for better performance.",
            ),
        };

        tracing::debug!(
            method = self.name(),
            functions_decorated,
            import_added,
            "method applied"
        );
        Ok(Optimized {
            text,
            functions_decorated,
            import_added,
            guard,
        })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Method {
    type Err = InvalidMethod;

    /// Accepts the menu number (`"3"`) or the method name (`"numba"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        s.parse::<u8>()
            .ok()
            .and_then(Method::from_number)
            .or_else(|| {
                Method::ALL
                    .into_iter()
                    .find(|m| m.name().eq_ignore_ascii_case(s))
            })
            .ok_or_else(|| InvalidMethod(s.to_string()))
    }
}
