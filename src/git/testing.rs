//! In-memory `GitRunner` for unit tests.

use crate::error::{GitError, GitResult};
use crate::git::executor::{CommandOutput, GitRunner};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Clone)]
enum Reply {
    Output(CommandOutput),
    LaunchFailure,
}

/// Answers commands from a table; unknown commands succeed with empty output
pub(crate) struct ScriptedRunner {
    work_dir: PathBuf,
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
    gate: Mutex<Option<(String, Arc<Notify>)>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self {
            work_dir: PathBuf::from("/work/repo"),
            replies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
        }
    }

    pub(crate) fn respond(&self, command: &str, stdout: &str) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .insert(command.to_string(), Reply::Output(CommandOutput::ok(stdout)));
        self
    }

    pub(crate) fn fail(&self, command: &str, exit_code: i32, stderr: &str) -> &Self {
        self.replies.lock().unwrap().insert(
            command.to_string(),
            Reply::Output(CommandOutput {
                stdout: String::new(),
                stderr: stderr.to_string(),
                exit_code,
                success: false,
            }),
        );
        self
    }

    pub(crate) fn unlaunchable(&self, command: &str) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .insert(command.to_string(), Reply::LaunchFailure);
        self
    }

    /// Hold the next call of `command` until `notify` fires
    pub(crate) fn gate(&self, command: &str, notify: Arc<Notify>) -> &Self {
        *self.gate.lock().unwrap() = Some((command.to_string(), notify));
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Respond to the standard branch/status/history refresh commands
    pub(crate) fn with_repository(
        &self,
        current: &str,
        branch_list: &str,
        status: &str,
        current_hash: &str,
        origin_hash: &str,
        log: &str,
    ) -> &Self {
        self.respond("branch --show-current", current)
            .respond("branch -a", branch_list)
            .respond("status -uall", status)
            .respond(&format!("rev-parse \"{}\"", current), current_hash)
            .respond(&format!("rev-parse origin/\"{}\"", current), origin_hash)
            .respond("log --oneline --first-parent -5", log)
    }
}

#[async_trait]
impl GitRunner for ScriptedRunner {
    async fn execute(&self, command: &str) -> GitResult<CommandOutput> {
        self.calls.lock().unwrap().push(command.to_string());

        // One-shot: only the first matching call is held
        let gate = {
            let mut slot = self.gate.lock().unwrap();
            let held = slot.as_ref().is_some_and(|(gated, _)| gated == command);
            if held {
                slot.take().map(|(_, notify)| notify)
            } else {
                None
            }
        };
        if let Some(notify) = gate {
            notify.notified().await;
        }

        let reply = self.replies.lock().unwrap().get(command).cloned();
        match reply {
            Some(Reply::Output(output)) => Ok(output),
            Some(Reply::LaunchFailure) => Err(GitError::ProcessLaunch {
                command: command.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "git not found"),
            }),
            None => Ok(CommandOutput::ok("")),
        }
    }

    fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}
