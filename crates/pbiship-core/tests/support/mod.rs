#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pbiship_core::api::{
    Group, ImportHandle, ImportOptions, PackageUpload, PowerBiApi, ResolvedWorkspace,
};
use pbiship_core::compile::{CompiledPackage, PackageCompiler, list_entries};
use pbiship_core::config::AuthenticationConfig;
use pbiship_core::deploy::ServiceConnector;
use pbiship_core::error::{DeployError, Result};
use pbiship_core::params::DeploymentParameters;
use pbiship_core::source::PROJECT_MARKER;

/// In-memory service. Every import replays `script`: the upload response
/// carries the first state, each status request the next one, and the last
/// state repeats once the script is exhausted.
#[derive(Default)]
pub struct FakeApi {
    workspaces: HashMap<String, String>,
    script: Vec<Option<&'static str>>,
    failing_uploads: HashSet<String>,
    imports: Mutex<HashMap<String, VecDeque<Option<&'static str>>>>,
    pub uploads: Mutex<Vec<(String, String, u64)>>,
    pub resolve_calls: AtomicUsize,
    pub post_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            script: vec![Some("Succeeded")],
            ..Default::default()
        }
    }

    pub fn with_workspace(mut self, name: &str, id: &str) -> Self {
        self.workspaces.insert(name.to_string(), id.to_string());
        self
    }

    pub fn with_script(mut self, script: &[Option<&'static str>]) -> Self {
        self.script = script.to_vec();
        self
    }

    pub fn with_failing_upload(mut self, display_name: &str) -> Self {
        self.failing_uploads.insert(display_name.to_string());
        self
    }

    pub fn resolve_count(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn post_count(&self) -> usize {
        self.post_calls.load(Ordering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(_, name, _)| name.clone())
            .collect()
    }

    fn handle(id: &str, name: &str, state: Option<&str>) -> ImportHandle {
        ImportHandle {
            id: id.to_string(),
            name: Some(name.to_string()),
            import_state: state.map(str::to_string),
            ..Default::default()
        }
    }
}

#[async_trait]
impl PowerBiApi for FakeApi {
    async fn resolve_workspace(&self, reference: &str) -> Result<ResolvedWorkspace> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        let (name, id) = self
            .workspaces
            .iter()
            .find(|(name, id)| name.as_str() == reference || id.as_str() == reference)
            .ok_or_else(|| DeployError::WorkspaceNotFound(reference.to_string()))?;
        Ok(ResolvedWorkspace {
            group: Group {
                id: id.clone(),
                name: name.clone(),
                is_on_dedicated_capacity: false,
                capacity_id: None,
            },
            capacity: None,
        })
    }

    async fn post_import(
        &self,
        workspace_id: &str,
        package: PackageUpload,
        display_name: &str,
        _options: &ImportOptions,
    ) -> Result<ImportHandle> {
        let n = self.post_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_uploads.contains(display_name) {
            return Err(DeployError::Transport {
                status: 400,
                detail: serde_json::json!({"error": {"code": "InvalidFileFormat"}}),
            });
        }
        self.uploads.lock().unwrap().push((
            workspace_id.to_string(),
            display_name.to_string(),
            package.length,
        ));

        let id = format!("import-{}", n);
        let mut states: VecDeque<_> = self.script.iter().copied().collect();
        let first = states.pop_front().flatten();
        self.imports.lock().unwrap().insert(id.clone(), states);
        Ok(Self::handle(&id, display_name, first))
    }

    async fn get_import(&self, _workspace_id: &str, import_id: &str) -> Result<ImportHandle> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let mut imports = self.imports.lock().unwrap();
        let states = imports
            .get_mut(import_id)
            .ok_or_else(|| DeployError::Transport {
                status: 404,
                detail: serde_json::json!({"error": {"code": "ImportNotFound"}}),
            })?;
        let state = if states.len() > 1 {
            states.pop_front().flatten()
        } else {
            states
                .front()
                .copied()
                .flatten()
                .or_else(|| self.script.last().copied().flatten())
        };
        let mut handle = Self::handle(import_id, "", state);
        handle.name = None;
        Ok(handle)
    }
}

/// Hands out a shared [`FakeApi`] and counts connections.
pub struct FakeConnector {
    pub api: Arc<FakeApi>,
    pub connects: AtomicUsize,
}

impl FakeConnector {
    pub fn new(api: FakeApi) -> Self {
        Self {
            api: Arc::new(api),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceConnector for FakeConnector {
    async fn connect(&self, _auth: &AuthenticationConfig) -> Result<Arc<dyn PowerBiApi>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.api.clone())
    }
}

/// Writes a minimal package instead of running an external tool.
#[derive(Default)]
pub struct FakeCompiler {
    pub compiled: Mutex<Vec<(PathBuf, DeploymentParameters)>>,
    pub outputs: Mutex<Vec<PathBuf>>,
}

impl FakeCompiler {
    pub fn projects(&self) -> Vec<PathBuf> {
        self.compiled
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }
}

#[async_trait]
impl PackageCompiler for FakeCompiler {
    async fn compile(
        &self,
        project_folder: &Path,
        output_path: &Path,
        parameters: &DeploymentParameters,
    ) -> Result<CompiledPackage> {
        self.compiled
            .lock()
            .unwrap()
            .push((project_folder.to_path_buf(), parameters.clone()));
        self.outputs.lock().unwrap().push(output_path.to_path_buf());
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_package(output_path);
        let entries = list_entries(output_path).map_err(|e| DeployError::Compile {
            project: project_folder.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(CompiledPackage {
            path: output_path.to_path_buf(),
            entries,
        })
    }
}

pub fn write_package(path: &Path) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    zip.start_file("Report/Layout", options).unwrap();
    zip.write_all(b"{}").unwrap();
    zip.start_file("DataModel", options).unwrap();
    zip.write_all(b"model").unwrap();
    zip.finish().unwrap();
}

pub fn make_project(base: &Path, relative: &str) -> PathBuf {
    let dir = base.join(relative);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(PROJECT_MARKER), "{}").unwrap();
    dir
}

pub fn make_package(base: &Path, relative: &str) -> PathBuf {
    let path = base.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    write_package(&path);
    path
}
