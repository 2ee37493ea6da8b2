use crate::error::{GitError, GitResult};
use crate::git::executor::GitRunner;
use crate::git::parser;
use std::env;
use std::path::{Path, PathBuf};

/// One version-controlled tree: its path, display name and `origin` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingDirectory {
    path: PathBuf,
    name: String,
    remote_url: String,
}

impl WorkingDirectory {
    /// Build from a known path and remote URL (empty when there is no `origin`)
    pub fn new<P: AsRef<Path>>(path: P, remote_url: impl Into<String>) -> Self {
        let path = path.as_ref().to_path_buf();
        let remote_url = remote_url.into();
        let name = parser::repository_name(&remote_url)
            .or_else(|| {
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| path.display().to_string());

        Self {
            path,
            name,
            remote_url,
        }
    }

    /// Ask git for the `origin` URL of the runner's working directory
    pub async fn resolve(runner: &dyn GitRunner) -> GitResult<Self> {
        let output = runner.execute("remote get-url origin").await?;
        let remote_url = if output.success {
            output.stdout.trim().to_string()
        } else {
            String::new()
        };
        Ok(Self::new(runner.work_dir(), remote_url))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    /// Browsable page of the remote, when the URL maps to one
    pub fn web_url(&self) -> Option<String> {
        parser::web_url(&self.remote_url)
    }
}

/// Find the working directory containing the current directory
pub fn discover() -> GitResult<PathBuf> {
    let current_dir = env::current_dir()?;
    discover_from(current_dir)
}

/// Walk up from `start_path` to the first directory with a `.git` entry
pub fn discover_from<P: AsRef<Path>>(start_path: P) -> GitResult<PathBuf> {
    let mut current = start_path.as_ref().to_path_buf();

    loop {
        // `.git` is a file inside submodules and linked worktrees
        if current.join(".git").exists() {
            return Ok(current);
        }

        if !current.pop() {
            return Err(GitError::NotARepository);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testing::ScriptedRunner;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_name_from_remote_url() {
        let dir = WorkingDirectory::new("/work/checkout", "https://github.com/owner/widget.git");

        assert_eq!(dir.name(), "widget");
        assert_eq!(dir.remote_url(), "https://github.com/owner/widget.git");
        assert_eq!(dir.web_url().as_deref(), Some("https://github.com/owner/widget"));
    }

    #[test]
    fn test_name_falls_back_to_directory() {
        let dir = WorkingDirectory::new("/work/checkout", "");

        assert_eq!(dir.name(), "checkout");
        assert_eq!(dir.web_url(), None);
    }

    #[tokio::test]
    async fn test_resolve_reads_origin() {
        let runner = ScriptedRunner::new();
        runner.respond("remote get-url origin", "git@example.com:team/app.git");

        let dir = WorkingDirectory::resolve(&runner).await.unwrap();
        assert_eq!(dir.path(), Path::new("/work/repo"));
        assert_eq!(dir.name(), "app");
    }

    #[tokio::test]
    async fn test_resolve_without_origin() {
        let runner = ScriptedRunner::new();
        runner.fail("remote get-url origin", 2, "error: No such remote 'origin'");

        let dir = WorkingDirectory::resolve(&runner).await.unwrap();
        assert_eq!(dir.remote_url(), "");
        assert_eq!(dir.name(), "repo");
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        fs::create_dir(root.join(".git")).unwrap();
        let sub_dir = root.join("a").join("b");
        fs::create_dir_all(&sub_dir).unwrap();

        assert_eq!(discover_from(&sub_dir).unwrap(), root);
    }

    #[test]
    fn test_discover_not_a_repo() {
        let temp = TempDir::new().unwrap();
        let result = discover_from(temp.path());

        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), GitError::NotARepository));
    }
}
