//! Enumerate folders and files under a base folder and match them against
//! a source path pattern.

use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{DeployError, Result};
use crate::params::{DeploymentParameters, system};
use crate::pattern::{PathPattern, PatternMatch};

use super::project::ProjectValidator;
use super::types::{DeploymentSourceInfo, Discovery, DiscoveryWarning, PACKAGE_EXTENSION};

/// Discover project folders under `base` matching `pattern`.
pub fn resolve_source_folders(
    pattern: &PathPattern,
    base: &Path,
    system_parameters: &DeploymentParameters,
    validator: &dyn ProjectValidator,
) -> Result<Discovery> {
    let mut discovery = Discovery::default();

    for entry in walk(base)?.filter(|e| e.file_type().is_dir()) {
        let Some(matched) = match_entry(pattern, base, &entry) else {
            continue;
        };
        if !validator.is_project_folder(entry.path()) {
            debug!(path = %entry.path().display(), "matched folder is not a project, skipping");
            continue;
        }

        let mut parameters = system_parameters.clone();
        system::add_project_folder(&mut parameters, entry.path());
        add_captures(&mut parameters, matched, system::FOLDER_MATCH);

        discovery.sources.push(DeploymentSourceInfo {
            path: entry.into_path(),
            parameters,
        });
    }

    report(&mut discovery, pattern, base);
    Ok(discovery)
}

/// Discover package files under `base` matching `pattern`.
pub fn resolve_source_files(
    pattern: &PathPattern,
    base: &Path,
    system_parameters: &DeploymentParameters,
) -> Result<Discovery> {
    let mut discovery = Discovery::default();

    for entry in walk(base)?.filter(|e| e.file_type().is_file()) {
        let Some(matched) = match_entry(pattern, base, &entry) else {
            continue;
        };

        if !has_package_extension(entry.path()) {
            let warning = DiscoveryWarning::UnexpectedExtension {
                path: entry.path().to_path_buf(),
            };
            warn!("{}", warning);
            discovery.warnings.push(warning);
        }

        let mut parameters = system_parameters.clone();
        system::add_source_file(&mut parameters, entry.path());
        add_captures(&mut parameters, matched, system::PATH_MATCH);

        discovery.sources.push(DeploymentSourceInfo {
            path: entry.into_path(),
            parameters,
        });
    }

    report(&mut discovery, pattern, base);
    Ok(discovery)
}

fn walk(base: &Path) -> Result<impl Iterator<Item = DirEntry>> {
    if !base.is_dir() {
        return Err(DeployError::config(format!(
            "source base folder does not exist: {}",
            base.display()
        )));
    }

    Ok(WalkDir::new(base)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry during discovery");
                None
            }
        }))
}

fn match_entry(pattern: &PathPattern, base: &Path, entry: &DirEntry) -> Option<PatternMatch> {
    let relative = entry.path().strip_prefix(base).ok()?;
    pattern.matches_path(relative)
}

fn add_captures(parameters: &mut DeploymentParameters, matched: PatternMatch, whole_key: &str) {
    parameters.insert(whole_key, matched.whole);
    parameters.overlay(matched.captures);
}

fn has_package_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(PACKAGE_EXTENSION))
        .unwrap_or(false)
}

fn report(discovery: &mut Discovery, pattern: &PathPattern, base: &Path) {
    if discovery.sources.is_empty() {
        let warning = DiscoveryWarning::NoMatches {
            pattern: pattern.expression().to_string(),
            base: base.to_path_buf(),
        };
        warn!("{}", warning);
        discovery.warnings.push(warning);
    } else {
        info!(
            count = discovery.sources.len(),
            pattern = pattern.expression(),
            "discovered deployment sources"
        );
    }
}
