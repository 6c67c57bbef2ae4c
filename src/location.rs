use std::fmt;

/// Byte offset into the source buffer (0-indexed).
pub type Offset = u32;

/// Half-open byte range `[start, end)` into the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Offset,
    pub end: Offset,
}

impl Span {
    pub fn new(start: Offset, end: Offset) -> Self {
        Self { start, end }
    }

    /// The source text covered by this span.
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        &source[self.start as usize..self.end as usize]
    }
}

/// 1-indexed line/column pair used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Convert a byte offset into a 1-indexed line/column.
pub fn line_col(offset: usize, source: &str) -> LineCol {
    let mut line = 1;
    let mut line_start = 0;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    LineCol {
        line,
        col: offset - line_start + 1,
    }
}

/// The whitespace between the start of the line containing `offset` and
/// `offset` itself.  Empty when `offset` is not preceded only by blanks.
pub fn indent_before(source: &str, offset: usize) -> &str {
    let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &source[line_start..offset];
    if prefix.bytes().all(|b| b == b' ' || b == b'\t') {
        prefix
    } else {
        ""
    }
}

/// The line terminator `source` uses, judged by its first line: `"\r\n"` or
/// `"\n"`.
pub fn line_ending(source: &str) -> &'static str {
    match source.find('\n') {
        Some(i) if source[..i].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}
