//! Scratch locations for compiled packages.

use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::error::{DeployError, Result};
use crate::params::{DeploymentParameters, system};
use crate::source::PACKAGE_EXTENSION;

/// Root directory under which each artifact gets its own subdirectory.
#[derive(Debug, Clone)]
pub struct ScratchArea {
    root: PathBuf,
}

/// A package path inside its own per-artifact scratch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchPackage {
    pub dir: PathBuf,
    pub package_path: PathBuf,
}

impl ScratchArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default root: the user cache dir, falling back to the system temp dir.
    pub fn default_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("pbiship")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compute a fresh package path `<root>/<uuid>/<name>.pbix`.
    ///
    /// Only the last normal component of `PBIXPROJ_NAME` is used as the file
    /// name. Nothing is created on disk; the compiler creates the directory.
    pub fn allocate(&self, parameters: &DeploymentParameters) -> ScratchPackage {
        let name = parameters
            .get(system::PBIXPROJ_NAME)
            .and_then(last_normal_component)
            .unwrap_or_else(|| "package".to_string());
        let dir = self.root.join(Uuid::new_v4().to_string());
        let package_path = dir.join(format!("{}.{}", name, PACKAGE_EXTENSION));
        ScratchPackage { dir, package_path }
    }

    /// Remove a directory handed out by [`ScratchArea::allocate`].
    ///
    /// Anything that is not a direct child of the root is refused.
    pub async fn remove(&self, dir: &Path) -> Result<()> {
        let is_child = dir.parent() == Some(self.root.as_path())
            && matches!(dir.components().next_back(), Some(Component::Normal(_)));
        if !is_child {
            return Err(DeployError::config(format!(
                "refusing to remove {}: not a scratch directory under {}",
                dir.display(),
                self.root.display()
            )));
        }
        tokio::fs::remove_dir_all(dir).await?;
        Ok(())
    }
}

fn last_normal_component(name: &str) -> Option<String> {
    let normalized = name.replace('\\', "/");
    Path::new(&normalized)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .next_back()
        .filter(|part| !part.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_never_collide() {
        let scratch = ScratchArea::new("/tmp/scratch");
        let params: DeploymentParameters = [(system::PBIXPROJ_NAME, "Sales")].into_iter().collect();

        let first = scratch.allocate(&params);
        let second = scratch.allocate(&params);

        assert_ne!(first.dir, second.dir);
        assert_eq!(first.package_path.file_name().unwrap(), "Sales.pbix");
        assert_eq!(first.package_path.parent(), Some(first.dir.as_path()));
        assert_eq!(first.dir.parent(), Some(Path::new("/tmp/scratch")));
    }

    #[test]
    fn allocate_does_not_touch_disk() {
        let temp = tempfile::TempDir::new().unwrap();
        let scratch = ScratchArea::new(temp.path().join("scratch"));
        let allocated = scratch.allocate(&DeploymentParameters::new());
        assert!(!allocated.package_path.exists());
        assert!(!scratch.root().exists());
        assert_eq!(allocated.package_path.file_name().unwrap(), "package.pbix");
    }

    #[test]
    fn package_name_keeps_only_the_last_segment() {
        let scratch = ScratchArea::new("/tmp/scratch");
        for name in ["../../Sales", "out/Sales", "..\\..\\Sales", "/abs/Sales/"] {
            let params: DeploymentParameters =
                [(system::PBIXPROJ_NAME, name)].into_iter().collect();
            let allocated = scratch.allocate(&params);
            assert_eq!(allocated.package_path, allocated.dir.join("Sales.pbix"), "{name}");
        }

        let params: DeploymentParameters = [(system::PBIXPROJ_NAME, "..")].into_iter().collect();
        let allocated = scratch.allocate(&params);
        assert_eq!(allocated.package_path.file_name().unwrap(), "package.pbix");
    }

    #[tokio::test]
    async fn remove_refuses_paths_outside_the_root() {
        let temp = tempfile::TempDir::new().unwrap();
        let scratch = ScratchArea::new(temp.path().join("scratch"));
        let outside = temp.path().join("project");
        std::fs::create_dir_all(&outside).unwrap();

        for dir in [
            outside.clone(),
            scratch.root().to_path_buf(),
            scratch.root().join(".."),
            scratch.root().join("a").join("b"),
        ] {
            assert!(matches!(
                scratch.remove(&dir).await,
                Err(DeployError::Configuration(_))
            ));
        }
        assert!(outside.exists());

        let allocated = scratch.allocate(&DeploymentParameters::new());
        std::fs::create_dir_all(&allocated.dir).unwrap();
        scratch.remove(&allocated.dir).await.unwrap();
        assert!(!allocated.dir.exists());
    }
}
