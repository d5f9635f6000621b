//! Shared command context passed into command families.

use crate::runtime::error::{XtaskError, XtaskResult};
use knowledge_base::{KbConfig, ProjectValidator};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Shared execution context for xtask commands.
#[derive(Clone, Debug)]
pub struct CommandContext {
    root: PathBuf,
}

impl CommandContext {
    /// Create a context rooted at the current workspace.
    pub fn new() -> XtaskResult<Self> {
        Ok(Self {
            root: workspace_root()?,
        })
    }

    /// Create a context rooted at an explicit directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Project root for a command: `root_override` when given, the workspace root otherwise.
    pub fn project_root(&self, root_override: Option<&Path>) -> PathBuf {
        root_override.map_or_else(|| self.root.clone(), Path::to_path_buf)
    }

    /// Load `kb.toml` for the selected project root and build its validator.
    pub fn project(&self, root_override: Option<&Path>) -> XtaskResult<ProjectValidator> {
        let root = self.project_root(root_override);
        let config = KbConfig::load(&root)?;
        debug!(root = %root.display(), ?config, "loaded project config");
        Ok(ProjectValidator::new(root, config))
    }
}

fn workspace_root() -> XtaskResult<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| XtaskError::environment("xtask lives under workspace root"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_over_workspace_root() {
        let ctx = CommandContext::with_root("/workspace");
        assert_eq!(ctx.project_root(None), PathBuf::from("/workspace"));
        assert_eq!(
            ctx.project_root(Some(Path::new("/elsewhere"))),
            PathBuf::from("/elsewhere")
        );
    }

    #[test]
    fn project_loads_config_from_selected_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("kb.toml"), "index_file = \"README.md\"\n")
            .expect("write config");

        let project = CommandContext::with_root("/unused")
            .project(Some(dir.path()))
            .expect("project");
        assert_eq!(project.config().index_file, "README.md");
        assert_eq!(project.root(), dir.path());
    }
}
