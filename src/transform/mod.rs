//! Tree and text transforms combined by the method dispatcher.

pub mod comments;
pub mod decorators;
pub mod entry_point;
pub mod imports;

pub use comments::{append_note, prepend_comments};
pub use decorators::add_decorator;
pub use entry_point::{GuardOutcome, ensure_entry_point_guard, has_entry_point_guard};
pub use imports::ensure_import;
