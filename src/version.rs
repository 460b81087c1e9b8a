//! Version and build information
//!
//! Provides access to build-time embedded information.

use std::fmt;

/// `--version` text: package version plus the stamped commit and build time
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("NIGHTLY_SIM_GIT_HASH"),
    ", built ",
    env!("NIGHTLY_SIM_BUILD_TIMESTAMP"),
    ", ",
    env!("NIGHTLY_SIM_PROFILE"),
    ")"
);

/// Build information embedded at compile time
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Package version from Cargo.toml
    pub version: &'static str,
    /// Package name
    pub name: &'static str,
    /// Git commit hash (short)
    pub git_hash: &'static str,
    /// Raw git dirty string ("true" or "false")
    git_dirty_str: &'static str,
    /// Build timestamp
    pub build_timestamp: &'static str,
    /// Target triple (e.g., x86_64-unknown-linux-gnu)
    pub target: &'static str,
    /// Build profile (debug/release)
    pub profile: &'static str,
}

impl BuildInfo {
    /// Get the current build information
    pub const fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            name: env!("CARGO_PKG_NAME"),
            git_hash: env!("NIGHTLY_SIM_GIT_HASH"),
            git_dirty_str: env!("NIGHTLY_SIM_GIT_DIRTY"),
            build_timestamp: env!("NIGHTLY_SIM_BUILD_TIMESTAMP"),
            target: env!("NIGHTLY_SIM_TARGET"),
            profile: env!("NIGHTLY_SIM_PROFILE"),
        }
    }

    /// Whether the working directory was dirty at build time
    pub fn git_dirty(&self) -> bool {
        self.git_dirty_str == "true"
    }

    /// Get the full version string (e.g., "0.1.0-abc1234")
    pub fn full_version(&self) -> String {
        if self.git_dirty() {
            format!("{}-{}-dirty", self.version, self.git_hash)
        } else {
            format!("{}-{}", self.version, self.git_hash)
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.name, self.full_version())?;
        writeln!(f, "  Built:   {}", self.build_timestamp)?;
        writeln!(f, "  Profile: {}", self.profile)?;
        writeln!(f, "  Target:  {}", self.target)?;
        Ok(())
    }
}

/// Get the current build info
pub fn build_info() -> BuildInfo {
    BuildInfo::current()
}
