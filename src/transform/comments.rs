//! Plain-text edits applied after the tree has been printed.  Added lines use
//! the line ending of the text they are added to.

use crate::location::line_ending;

/// Put `lines` at the top of `text`, one per line.  A `#!` interpreter line
/// stays first so the script remains executable.
pub fn prepend_comments(text: &str, lines: &[&str]) -> String {
    let newline = line_ending(text);
    let (shebang, rest) = match text.strip_prefix("#!") {
        Some(_) => match text.find('\n') {
            Some(i) => text.split_at(i + 1),
            None => (text, ""),
        },
        None => ("", text),
    };

    let added: usize = lines.iter().map(|l| l.len() + newline.len()).sum();
    let mut out = String::with_capacity(text.len() + added + newline.len());
    out.push_str(shebang);
    if !shebang.is_empty() && !shebang.ends_with('\n') {
        out.push_str(newline);
    }
    for line in lines {
        out.push_str(line);
        out.push_str(newline);
    }
    out.push_str(rest);
    out
}

/// Add `note` at the end of `text`, separated by a blank line.
pub fn append_note(text: &str, note: &str) -> String {
    let newline = line_ending(text);
    let mut out = String::with_capacity(text.len() + note.len() + 6);
    out.push_str(text);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push_str(newline);
    }
    out.push_str(newline);
    out.push_str(note);
    out.push_str(newline);
    out
}
