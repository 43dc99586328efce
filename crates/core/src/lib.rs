//! Pure domain logic for the comments service.
//!
//! No I/O and no async: the reply-nesting policy, text validation, import
//! record coercion, the shared id/timestamp aliases, and the domain error
//! type. Persistence lives in `comments-db`, HTTP in `comments-api`.

pub mod error;
pub mod import;
pub mod thread;
pub mod types;
