use crate::error::{GitError, GitResult};
use crate::git::controller::RepositoryController;
use crate::git::executor::{GitExecutor, GitRunner};
use crate::git::parser;
use std::io;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// The primary working directory and its submodules, one controller each.
///
/// Controllers share nothing but the executor settings; they can refresh
/// concurrently.
pub struct RepositoryRegistry {
    controllers: Vec<Arc<RepositoryController>>,
}

impl RepositoryRegistry {
    /// Open the executor's working directory and, optionally, every submodule it lists
    pub async fn discover(executor: GitExecutor, include_submodules: bool) -> GitResult<Self> {
        let root = executor.work_dir().to_path_buf();
        let submodule_paths = if include_submodules {
            let output = executor.execute("submodule status").await?;
            parser::parse_submodule_paths(&output.stdout)
        } else {
            Vec::new()
        };

        let sub_executors: Vec<GitExecutor> = submodule_paths
            .iter()
            .map(|path| executor.for_dir(root.join(path)))
            .collect();

        let mut controllers = vec![Arc::new(
            RepositoryController::open(Arc::new(executor)).await?,
        )];
        for sub_executor in sub_executors {
            let path = sub_executor.work_dir().to_path_buf();
            match RepositoryController::open(Arc::new(sub_executor)).await {
                Ok(controller) => controllers.push(Arc::new(controller)),
                // An uninitialised submodule directory cannot run git; skip it
                Err(e) => warn!(path = %path.display(), "skipping submodule: {}", e),
            }
        }

        info!(
            root = %root.display(),
            repositories = controllers.len(),
            "repositories discovered"
        );
        Ok(Self { controllers })
    }

    pub fn from_controllers(controllers: Vec<Arc<RepositoryController>>) -> Self {
        Self { controllers }
    }

    pub fn primary(&self) -> Option<&Arc<RepositoryController>> {
        self.controllers.first()
    }

    pub fn submodules(&self) -> &[Arc<RepositoryController>] {
        self.controllers.get(1..).unwrap_or_default()
    }

    /// Primary first, then submodules in `submodule status` order
    pub fn controllers(&self) -> &[Arc<RepositoryController>] {
        &self.controllers
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Refresh every controller concurrently; the first error wins once all have finished
    pub async fn refresh_all(&self) -> GitResult<()> {
        let mut tasks = JoinSet::new();
        for controller in &self.controllers {
            let controller = Arc::clone(controller);
            tasks.spawn(async move { controller.refresh_all().await });
        }

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let result = joined.map_err(|e| GitError::Io(io::Error::other(e)));
            if let Err(e) = result.and_then(|r| r) {
                warn!("refresh failed: {}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
