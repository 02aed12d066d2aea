//! Layered parameter mapping.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::template::{TemplateError, expand_template};

/// Ordered mapping of parameter name to value.
///
/// Keys are case-sensitive. Iteration order is sorted by key so diagnostics
/// and previews are stable between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentParameters(BTreeMap<String, String>);

impl DeploymentParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a parameter, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay every entry of `layer`, later values winning.
    pub fn overlay<K, V, I>(&mut self, layer: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in layer {
            self.insert(key, value);
        }
    }

    /// Build the final mapping for one artifact.
    ///
    /// `discovered` holds the system parameters and pattern captures. Manifest
    /// defaults are templated against `discovered`; environment overrides are
    /// templated against `discovered` plus the manifest defaults. Precedence is
    /// environment > manifest > discovered.
    pub fn resolve(
        discovered: &DeploymentParameters,
        manifest_defaults: &BTreeMap<String, String>,
        environment_overrides: &BTreeMap<String, String>,
    ) -> Result<Self, TemplateError> {
        let mut resolved = discovered.clone();

        let manifest_layer = expand_layer(manifest_defaults, discovered)?;
        resolved.overlay(manifest_layer);

        let environment_layer = expand_layer(environment_overrides, &resolved)?;
        resolved.overlay(environment_layer);

        Ok(resolved)
    }
}

/// `KEY=value` pairs in key order, comma separated.
impl fmt::Display for DeploymentParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

fn expand_layer(
    layer: &BTreeMap<String, String>,
    context: &DeploymentParameters,
) -> Result<Vec<(String, String)>, TemplateError> {
    layer
        .iter()
        .map(|(key, value)| Ok((key.clone(), expand_template(value, context)?)))
        .collect()
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DeploymentParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        params.overlay(iter);
        params
    }
}
