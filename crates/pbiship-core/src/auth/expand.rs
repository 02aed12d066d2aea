//! `%NAME%` expansion.

use crate::error::{DeployError, Result};

/// Expand `%NAME%` references using `lookup`. `%%` yields a literal `%`, and a
/// lone `%` without a closing partner is kept as-is.
pub fn expand_env<F>(value: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(0) => {
                out.push('%');
                rest = &after[1..];
            }
            Some(end) => {
                let name = &after[..end];
                let resolved = lookup(name).ok_or_else(|| {
                    DeployError::config(format!("environment variable '{}' is not set", name))
                })?;
                out.push_str(&resolved);
                rest = &after[end + 1..];
            }
            None => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);

    Ok(out)
}
