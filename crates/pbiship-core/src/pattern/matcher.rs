//! Pattern compilation and matching.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path};

use regex::Regex;
use thiserror::Error;

use crate::params::system::{FOLDER_MATCH, PATH_MATCH};

/// Errors raised while compiling a source path pattern.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("source path pattern is empty")]
    Empty,

    #[error("unterminated placeholder starting at position {0}")]
    Unterminated(usize),

    #[error("unexpected '}}' at position {0}")]
    UnexpectedClose(usize),

    #[error("invalid placeholder name '{0}'")]
    InvalidName(String),

    #[error("placeholder '{0}' appears more than once")]
    Duplicate(String),

    #[error("placeholder '{0}' is reserved for the whole match")]
    Reserved(String),

    #[error("pattern could not be compiled: {0}")]
    Regex(String),
}

/// Result of a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    /// The entire matched relative path.
    pub whole: String,
    /// Named placeholder values, keyed by placeholder name.
    pub captures: BTreeMap<String, String>,
}

/// A compiled source path pattern.
#[derive(Clone)]
pub struct PathPattern {
    expression: String,
    regex: Regex,
    names: Vec<String>,
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPattern")
            .field("expression", &self.expression)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

impl PathPattern {
    /// Compile a pattern expression.
    pub fn compile(expression: &str) -> Result<Self, PatternError> {
        let normalized = normalize_expression(expression);
        if normalized.is_empty() {
            return Err(PatternError::Empty);
        }

        let chars: Vec<char> = normalized.chars().collect();
        let mut source = String::from("^");
        let mut literal = String::new();
        let mut names: Vec<String> = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '*' if chars.get(i + 1) == Some(&'*') => {
                    flush_literal(&mut source, &mut literal);
                    if chars.get(i + 2) == Some(&'/') {
                        source.push_str("(?:[^/]+/)*");
                        i += 3;
                    } else {
                        source.push_str(".*");
                        i += 2;
                    }
                }
                '*' => {
                    flush_literal(&mut source, &mut literal);
                    source.push_str("[^/]*");
                    i += 1;
                }
                '?' => {
                    flush_literal(&mut source, &mut literal);
                    source.push_str("[^/]");
                    i += 1;
                }
                '{' => {
                    let close = chars[i + 1..]
                        .iter()
                        .position(|c| *c == '}')
                        .map(|offset| i + 1 + offset)
                        .ok_or(PatternError::Unterminated(i))?;
                    let name: String = chars[i + 1..close].iter().collect();
                    if !is_valid_name(&name) {
                        return Err(PatternError::InvalidName(name));
                    }
                    if name == FOLDER_MATCH || name == PATH_MATCH {
                        return Err(PatternError::Reserved(name));
                    }
                    if names.contains(&name) {
                        return Err(PatternError::Duplicate(name));
                    }
                    flush_literal(&mut source, &mut literal);
                    source.push_str(&format!("(?P<{}>[^/]+)", name));
                    names.push(name);
                    i = close + 1;
                }
                '}' => return Err(PatternError::UnexpectedClose(i)),
                c => {
                    literal.push(c);
                    i += 1;
                }
            }
        }
        flush_literal(&mut source, &mut literal);
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| PatternError::Regex(e.to_string()))?;

        Ok(Self {
            expression: normalized,
            regex,
            names,
        })
    }

    /// The normalized expression this pattern was compiled from.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Placeholder names in declaration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Match a forward-slash relative path.
    pub fn matches(&self, relative: &str) -> Option<PatternMatch> {
        let caps = self.regex.captures(relative)?;
        let whole = caps.get(0).map(|m| m.as_str().to_string())?;
        let captures = self
            .names
            .iter()
            .filter_map(|name| {
                caps.name(name)
                    .map(|m| (name.clone(), m.as_str().to_string()))
            })
            .collect();
        Some(PatternMatch { whole, captures })
    }

    /// Match a relative file-system path after normalizing its separators.
    pub fn matches_path(&self, relative: &Path) -> Option<PatternMatch> {
        self.matches(&normalize_relative(relative))
    }
}

/// Render a relative path with forward-slash separators.
pub fn normalize_relative(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn normalize_expression(expression: &str) -> String {
    let unified = expression.trim().replace('\\', "/");
    let mut rest = unified.as_str();
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break;
        }
    }
    rest.trim_end_matches('/').to_string()
}

fn flush_literal(source: &mut String, literal: &mut String) {
    if !literal.is_empty() {
        source.push_str(&regex::escape(literal));
        literal.clear();
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
