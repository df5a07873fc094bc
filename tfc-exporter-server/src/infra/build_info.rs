//! Version and build context reported at startup.
//!
//! Revision, branch, user and date are read from `GIT_COMMIT`,
//! `GIT_BRANCH`, `BUILD_USER` and `BUILD_DATE` at compile time.

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub revision: &'static str,
    pub branch: &'static str,
    pub build_user: &'static str,
    pub build_date: &'static str,
    pub profile: &'static str,
    pub os: &'static str,
    pub arch: &'static str,
}

impl BuildInfo {
    pub const fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            revision: or_unknown(option_env!("GIT_COMMIT")),
            branch: or_unknown(option_env!("GIT_BRANCH")),
            build_user: or_unknown(option_env!("BUILD_USER")),
            build_date: or_unknown(option_env!("BUILD_DATE")),
            profile: if cfg!(debug_assertions) {
                "debug"
            } else {
                "release"
            },
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        }
    }
}

const fn or_unknown(value: Option<&'static str>) -> &'static str {
    match value {
        Some(value) if !value.is_empty() => value,
        _ => UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_values_read_unknown() {
        assert_eq!(or_unknown(None), "unknown");
        assert_eq!(or_unknown(Some("")), "unknown");
        assert_eq!(or_unknown(Some("3f2a9c1")), "3f2a9c1");
    }

    #[test]
    fn current_build_is_fully_described() {
        let info = BuildInfo::current();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert!(!info.revision.is_empty());
        assert_eq!(info.os, std::env::consts::OS);
        assert!(matches!(info.profile, "debug" | "release"));
    }
}
