//! Build metadata reported by `--version` and `GET /version`.

use std::fmt;

use serde::Serialize;

const UNKNOWN: &str = "unknown";

/// Immutable description of the running binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub version: String,
    pub git_commit: String,
    pub build_date: String,
    pub target: String,
}

impl BuildInfo {
    /// Metadata compiled into this binary.
    ///
    /// `TRAEFIK_FED_GIT_COMMIT` and `TRAEFIK_FED_BUILD_DATE` are read at
    /// compile time when set.
    pub fn current() -> Self {
        Self::new(
            env!("CARGO_PKG_VERSION"),
            option_env!("TRAEFIK_FED_GIT_COMMIT"),
            option_env!("TRAEFIK_FED_BUILD_DATE"),
        )
    }

    pub fn new(version: &str, git_commit: Option<&str>, build_date: Option<&str>) -> Self {
        let known = |value: Option<&str>| {
            value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(UNKNOWN)
                .to_string()
        };

        Self {
            version: version.to_string(),
            git_commit: known(git_commit),
            build_date: known(build_date),
            target: format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "traefik-fed {} ({}) built on {} for {}",
            self.version, self.git_commit, self.build_date, self.target
        )
    }
}
