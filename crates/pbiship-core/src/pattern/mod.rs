//! Source path patterns.
//!
//! A pattern is a glob-like expression over forward-slash relative paths:
//! - `*` matches within one path segment
//! - `?` matches one character within a segment
//! - `**` matches anything, `**/` matches zero or more whole segments
//! - `{name}` captures one non-empty segment part under `name`

mod matcher;

pub use matcher::{PathPattern, PatternError, PatternMatch, normalize_relative};
