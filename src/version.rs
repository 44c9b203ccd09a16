//! Build identification from vergen-emitted environment variables.

use serde::Serialize;

pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

const UNKNOWN: &str = "unknown";

/// Where and from what this binary was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub branch: &'static str,
    pub sha: &'static str,
    pub dirty: bool,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: PKG_VERSION,
            branch: match option_env!("VERGEN_GIT_BRANCH") {
                Some(branch) => branch,
                None => UNKNOWN,
            },
            sha: match option_env!("VERGEN_GIT_SHA") {
                Some(sha) => sha,
                None => UNKNOWN,
            },
            dirty: option_env!("VERGEN_GIT_DIRTY") == Some("true"),
        }
    }

    /// `{version}+{branch}.{short sha}`, with `.dirty` appended for builds
    /// from a modified tree.
    pub fn version_string(&self) -> String {
        format!(
            "{}+{}.{}{}",
            self.version,
            self.branch,
            &self.sha[..7.min(self.sha.len())],
            if self.dirty { ".dirty" } else { "" }
        )
    }
}

/// Version string of the running build.
pub fn version_string() -> String {
    BuildInfo::current().version_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_package_version() {
        assert!(version_string().starts_with(PKG_VERSION));
    }

    #[test]
    fn short_sha_and_dirty_suffix() {
        let info = BuildInfo {
            version: "1.2.3",
            branch: "main",
            sha: "abcdef0123456789",
            dirty: true,
        };
        assert_eq!(info.version_string(), "1.2.3+main.abcdef0.dirty");
    }

    #[test]
    fn unknown_metadata_is_kept_whole() {
        let info = BuildInfo {
            version: "0.1.0",
            branch: UNKNOWN,
            sha: UNKNOWN,
            dirty: false,
        };
        assert_eq!(info.version_string(), "0.1.0+unknown.unknown");
    }
}
