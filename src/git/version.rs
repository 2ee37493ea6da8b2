use crate::error::{GitError, GitResult};
use crate::git::executor::GitRunner;
use std::fmt;

/// `restore --staged` and `branch --show-current` need at least this
const MIN_GIT_VERSION: (u32, u32) = (2, 23);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GitVersion {
    /// Ask the runner's git binary for its version
    pub async fn detect(runner: &dyn GitRunner) -> GitResult<Self> {
        let stdout = runner
            .execute("--version")
            .await?
            .into_checked("--version")?;
        Self::parse(&stdout)
    }

    /// Parse `git version X.Y.Z`, tolerating vendor suffixes such as `.windows.1`
    pub fn parse(version_str: &str) -> GitResult<Self> {
        let mut words = version_str.split_whitespace();
        let numbers = match (words.next(), words.next(), words.next()) {
            (Some("git"), Some("version"), Some(numbers)) => numbers,
            _ => {
                return Err(GitError::ParseError(format!(
                    "Unexpected git version format: {}",
                    version_str.trim()
                )));
            }
        };

        let mut parts = numbers.split('.');
        let mut component = |name: &str| -> GitResult<u32> {
            let raw = parts.next().unwrap_or_default();
            raw.parse::<u32>()
                .map_err(|_| GitError::ParseError(format!("Invalid {} version: '{}'", name, raw)))
        };
        let major = component("major")?;
        let minor = component("minor")?;
        // Patch may be missing or carry a suffix ("2.39.rc0")
        let patch = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);

        Ok(GitVersion {
            major,
            minor,
            patch,
        })
    }

    pub fn is_supported(&self) -> bool {
        (self.major, self.minor) >= MIN_GIT_VERSION
    }

    /// Detect, then reject versions older than the minimum
    pub async fn validate(runner: &dyn GitRunner) -> GitResult<Self> {
        let version = Self::detect(runner).await?;

        if !version.is_supported() {
            return Err(GitError::GitVersionTooOld(version.to_string()));
        }

        Ok(version)
    }
}

impl fmt::Display for GitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testing::ScriptedRunner;

    fn version(major: u32, minor: u32, patch: u32) -> GitVersion {
        GitVersion {
            major,
            minor,
            patch,
        }
    }

    #[test]
    fn test_parse_standard_version() {
        assert_eq!(GitVersion::parse("git version 2.39.2\n").unwrap(), version(2, 39, 2));
    }

    #[test]
    fn test_parse_vendor_suffixes() {
        assert_eq!(
            GitVersion::parse("git version 2.39.2.windows.1").unwrap(),
            version(2, 39, 2)
        );
        assert_eq!(
            GitVersion::parse("git version 2.37.1 (Apple Git-137.1)").unwrap(),
            version(2, 37, 1)
        );
        assert_eq!(GitVersion::parse("git version 2.45").unwrap(), version(2, 45, 0));
    }

    #[test]
    fn test_parse_invalid_format() {
        assert!(GitVersion::parse("version 2.39.2").is_err());
        assert!(GitVersion::parse("git version").is_err());
        assert!(GitVersion::parse("git version two.39").is_err());
        assert!(GitVersion::parse("git version 2").is_err());
    }

    #[test]
    fn test_is_supported() {
        assert!(version(2, 23, 0).is_supported());
        assert!(version(2, 40, 1).is_supported());
        assert!(version(3, 0, 0).is_supported());

        assert!(!version(2, 22, 9).is_supported());
        assert!(!version(1, 99, 0).is_supported());
    }

    #[tokio::test]
    async fn test_validate_through_runner() {
        let runner = ScriptedRunner::new();
        runner.respond("--version", "git version 2.43.0");
        assert_eq!(GitVersion::validate(&runner).await.unwrap(), version(2, 43, 0));

        runner.respond("--version", "git version 2.20.1");
        let err = GitVersion::validate(&runner).await.unwrap_err();
        assert!(matches!(err, GitError::GitVersionTooOld(ref v) if v == "2.20.1"));
    }
}
