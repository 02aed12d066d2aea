//! `{NAME}` placeholder expansion.
//!
//! `{{` and `}}` produce literal braces.

use thiserror::Error;

use super::DeploymentParameters;

/// Errors raised while expanding a template string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template '{template}' references undefined parameter '{key}'")]
    UndefinedParameter { template: String, key: String },

    #[error("template '{template}' has an unterminated placeholder")]
    Unterminated { template: String },

    #[error("template '{template}' has an unmatched '}}'")]
    UnmatchedClose { template: String },
}

/// Expand every `{NAME}` in `template` from `params`.
pub fn expand_template(
    template: &str,
    params: &DeploymentParameters,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut key = String::new();
                let mut closed = false;
                for k in chars.by_ref() {
                    if k == '}' {
                        closed = true;
                        break;
                    }
                    key.push(k);
                }
                if !closed {
                    return Err(TemplateError::Unterminated {
                        template: template.to_string(),
                    });
                }
                let key = key.trim();
                let value = params
                    .get(key)
                    .ok_or_else(|| TemplateError::UndefinedParameter {
                        template: template.to_string(),
                        key: key.to_string(),
                    })?;
                out.push_str(value);
            }
            '}' => {
                return Err(TemplateError::UnmatchedClose {
                    template: template.to_string(),
                });
            }
            other => out.push(other),
        }
    }

    Ok(out)
}
