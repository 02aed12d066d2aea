//! System parameter keys and builders.

use std::path::Path;

use super::DeploymentParameters;

/// Name of the target environment.
pub const ENVIRONMENT: &str = "ENVIRONMENT";
/// Label of the deployment profile inside the manifest.
pub const PROFILE: &str = "PROFILE";
/// Version of this tool.
pub const PBISHIP_VERSION: &str = "PBISHIP_VERSION";

/// Project folder name (folder mode).
pub const PBIXPROJ_NAME: &str = "PBIXPROJ_NAME";
/// Project folder name, second alias (folder mode).
pub const PBIXPROJ_FOLDER: &str = "PBIXPROJ_FOLDER";

/// File name including extension (file mode).
pub const FILE_NAME: &str = "FILE_NAME";
/// File name without its extension (file mode).
pub const FILE_NAME_WITHOUT_EXT: &str = "FILE_NAME_WITHOUT_EXT";
/// Name of the folder containing the file (file mode).
pub const FILE_FOLDER: &str = "FILE_FOLDER";

/// Whole pattern match in folder mode.
pub const FOLDER_MATCH: &str = "folder";
/// Whole pattern match in file mode.
pub const PATH_MATCH: &str = "path";

/// Parameters fixed for a whole run against one environment.
pub fn run_parameters(profile: &str, environment: &str) -> DeploymentParameters {
    let mut params = DeploymentParameters::new();
    params.insert(ENVIRONMENT, environment);
    params.insert(PROFILE, profile);
    params.insert(PBISHIP_VERSION, env!("CARGO_PKG_VERSION"));
    params
}

/// Add the folder-mode artifact keys.
pub fn add_project_folder(params: &mut DeploymentParameters, folder: &Path) {
    let name = file_name_of(folder);
    params.insert(PBIXPROJ_NAME, name.clone());
    params.insert(PBIXPROJ_FOLDER, name);
}

/// Add the file-mode artifact keys.
pub fn add_source_file(params: &mut DeploymentParameters, file: &Path) {
    params.insert(FILE_NAME, file_name_of(file));
    params.insert(
        FILE_NAME_WITHOUT_EXT,
        file.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );
    params.insert(
        FILE_FOLDER,
        file.parent().map(file_name_of).unwrap_or_default(),
    );
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
