//! Text parsers for the git porcelain this crate reads.
//!
//! None of these functions fail: lines that do not have the expected shape are
//! skipped, so a malformed or empty command output yields a smaller (possibly
//! empty) result instead of an error.

/// Prefix of remote-tracking branches of `origin` in `branch -a` output
const ORIGIN_PREFIX: &str = "remotes/origin/";

/// Symbolic ref advertised by the remote, not a real branch
const ORIGIN_HEAD: &str = "remotes/origin/HEAD";

/// Number of hash characters used for matching log lines
pub const SHORT_HASH_LEN: usize = 7;

const STAGED_HEADER: &str = "Changes to be committed:";
const UNSTAGED_HEADER: &str = "Changes not staged for commit:";
const UNTRACKED_HEADER: &str = "Untracked files:";

/// Branches of one working directory, split by where they exist.
///
/// Every name appears in exactly one of `local`, `remote` and
/// `local_and_remote`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchSet {
    /// Checked-out branch, empty on a detached HEAD
    pub current: String,
    pub local: Vec<String>,
    pub remote: Vec<String>,
    pub local_and_remote: Vec<String>,
}

impl BranchSet {
    /// Whether `name` appears in any of the three sequences
    pub fn contains(&self, name: &str) -> bool {
        [&self.local, &self.remote, &self.local_and_remote]
            .iter()
            .any(|set| set.iter().any(|b| b == name))
    }

    /// A new branch name must be non-empty and unknown locally and remotely
    pub fn accepts_new_branch(&self, name: &str) -> bool {
        !name.trim().is_empty() && !self.contains(name)
    }

    pub fn is_detached(&self) -> bool {
        self.current.is_empty()
    }
}

/// Raw status lines of the working tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileStatus {
    /// e.g. `modified:   src/lib.rs`
    pub staged: Vec<String>,
    pub unstaged: Vec<String>,
    /// Bare paths
    pub untracked: Vec<String>,
}

impl FileStatus {
    pub fn change_count(&self) -> usize {
        self.staged.len() + self.unstaged.len() + self.untracked.len()
    }

    pub fn is_clean(&self) -> bool {
        self.change_count() == 0
    }

    /// A commit needs something staged and a message
    pub fn can_commit(&self, message: &str) -> bool {
        !self.staged.is_empty() && !message.trim().is_empty()
    }
}

/// Recent first-parent history split at the remote branch tip
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Local commits not yet on the remote, newest first
    pub new_commits: Vec<String>,
    /// Commits already on the remote
    pub synced_commits: Vec<String>,
}

impl CommitSummary {
    pub fn can_push(&self) -> bool {
        !self.new_commits.is_empty()
    }

    /// Only the newest unpushed commit may be undone
    pub fn can_reset(&self, descriptor: &str) -> bool {
        self.new_commits.first().is_some_and(|newest| newest == descriptor)
    }

    pub fn len(&self) -> usize {
        self.new_commits.len() + self.synced_commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `remotes/origin/HEAD` or its `-> origin/<branch>` symref line
fn is_origin_head(branch: &str) -> bool {
    match branch.strip_prefix(ORIGIN_HEAD) {
        Some(rest) => rest.is_empty() || rest.starts_with(" -> "),
        None => false,
    }
}

/// Parse `git branch -a` output given the current branch name
pub fn parse_branch_list(current: &str, output: &str) -> BranchSet {
    let mut local = Vec::new();
    let mut remote = Vec::new();

    for line in output.lines() {
        // Drop the "* " / "  " marker column
        let Some(branch) = line.get(2..) else {
            continue;
        };
        let branch = branch.trim();

        if branch.is_empty() || is_origin_head(branch) {
            continue;
        }

        if let Some(name) = branch.strip_prefix(ORIGIN_PREFIX) {
            remote.push(name.to_string());
        } else if branch.starts_with("remotes/") || branch.starts_with('(') {
            // Other remotes and "(HEAD detached at ...)"
            continue;
        } else {
            local.push(branch.to_string());
        }
    }

    let mut local_and_remote = Vec::new();
    local.retain(|name| match remote.iter().position(|r| r == name) {
        Some(idx) => {
            remote.remove(idx);
            local_and_remote.push(name.clone());
            false
        }
        None => true,
    });

    BranchSet {
        current: current.trim().to_string(),
        local,
        remote,
        local_and_remote,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Staged,
    Unstaged,
    Untracked,
}

/// Parse human-readable `git status -uall` output
pub fn parse_status(output: &str) -> FileStatus {
    let mut status = FileStatus::default();
    let mut section = None;

    for line in output.lines() {
        if line.contains(STAGED_HEADER) {
            section = Some(Section::Staged);
            continue;
        }
        if line.contains(UNSTAGED_HEADER) {
            section = Some(Section::Unstaged);
            continue;
        }
        if line.contains(UNTRACKED_HEADER) {
            section = Some(Section::Untracked);
            continue;
        }

        if let Some(entry) = line.strip_prefix('\t') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            match section {
                Some(Section::Staged) => status.staged.push(entry.to_string()),
                Some(Section::Unstaged) => status.unstaged.push(entry.to_string()),
                Some(Section::Untracked) => status.untracked.push(entry.to_string()),
                None => {}
            }
        }
    }

    status
}

/// Path of a staged or unstaged status line: the text after the first colon.
///
/// Untracked entries are bare paths and must not go through here, since a
/// file name may itself contain a colon.
pub fn status_entry_path(line: &str) -> &str {
    match line.split_once(':') {
        Some((_, path)) => path.trim(),
        None => line.trim(),
    }
}

/// First seven characters of a full hash, if it looks like one
pub fn short_hash(full_hash: &str) -> Option<&str> {
    let hash = full_hash.trim();
    if hash.len() >= SHORT_HASH_LEN && hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        Some(&hash[..SHORT_HASH_LEN])
    } else {
        None
    }
}

/// Abbreviated hash at the start of a `log --oneline` descriptor
pub fn descriptor_hash(descriptor: &str) -> Option<&str> {
    let token = descriptor.split_whitespace().next()?;
    if token.len() >= 4 && token.bytes().all(|b| b.is_ascii_hexdigit()) {
        Some(token)
    } else {
        None
    }
}

/// Split `log --oneline --first-parent` output into new and synced commits.
///
/// Lines are walked newest first. The line containing `current_hash` starts
/// the "new" run (inclusive) and the line containing `origin_hash` ends it
/// (exclusive). Both checks apply to the same line in that order, so a line
/// matching both counts as synced. A missing hash never matches.
pub fn classify_history(
    output: &str,
    current_hash: Option<&str>,
    origin_hash: Option<&str>,
) -> CommitSummary {
    let mut summary = CommitSummary::default();
    let mut collecting = false;

    for line in output.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        if current_hash.is_some_and(|h| line.contains(h)) {
            collecting = true;
        }
        if origin_hash.is_some_and(|h| line.contains(h)) {
            collecting = false;
        }

        if collecting {
            summary.new_commits.push(line.to_string());
        } else {
            summary.synced_commits.push(line.to_string());
        }
    }

    summary
}

/// Paths listed by `git submodule status`, relative to the superproject
pub fn parse_submodule_paths(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(str::to_string)
        .collect()
}

/// Display name of a repository: last path segment of its URL without `.git`
pub fn repository_name(url: &str) -> Option<String> {
    let url = url.trim().trim_end_matches('/');
    let segment = url.rsplit(['/', ':']).next()?;
    let name = segment.strip_suffix(".git").unwrap_or(segment);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Browsable URL for a remote URL (`git@host:owner/repo.git` becomes `https://host/owner/repo`)
pub fn web_url(url: &str) -> Option<String> {
    let url = url.trim().trim_end_matches('/');
    if url.is_empty() {
        return None;
    }
    let url = url.strip_suffix(".git").unwrap_or(url);

    if url.starts_with("https://") || url.starts_with("http://") {
        return Some(url.to_string());
    }
    if let Some(rest) = url.strip_prefix("ssh://") {
        let rest = rest.split_once('@').map_or(rest, |(_, host)| host);
        return Some(format!("https://{}", rest));
    }
    if let Some((user_host, path)) = url.split_once(':') {
        let host = user_host.split_once('@').map_or(user_host, |(_, host)| host);
        return Some(format!("https://{}/{}", host, path));
    }

    None
}
