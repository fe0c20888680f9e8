//! Config file version stamps.
//!
//! The first line of the config file records which release wrote it. A missing or
//! older stamp means setup should run again.

use anyhow::anyhow;
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

/// Current application version from Cargo.toml
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Version(u32, u32, u32);

impl FromStr for Version {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let parts = s
            .trim()
            .split('.')
            .map(|p| p.parse::<u32>().map_err(|_| anyhow!("Invalid version component '{p}'")))
            .collect::<anyhow::Result<Vec<_>>>()?;

        match parts.as_slice() {
            [major, minor, patch] => Ok(Self(*major, *minor, *patch)),
            _ => Err(anyhow!("Invalid version format: '{s}'. Expected 'major.minor.patch'")),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0, self.1, self.2)
    }
}

fn stamp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*config_version\s*=\s*"([^"]+)""#).expect("valid version pattern")
    })
}

/// What setup has to do for an existing or missing config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupStatus {
    Missing,
    /// Written by an older release; holds the stamp found, if any
    Outdated(Option<String>),
    Current,
}

/// Reads the version stamp from the first line of `content`.
pub fn version_stamp(content: &str) -> Option<String> {
    let first_line = content.lines().next()?;
    stamp_regex()
        .captures(first_line)
        .map(|caps| caps[1].to_string())
}

/// Decides whether setup needs to run for `config_path`.
///
/// # Errors
/// If the file exists but cannot be read, or its stamp is malformed.
pub fn check_setup_needed(config_path: &Path) -> anyhow::Result<SetupStatus> {
    if !config_path.exists() {
        return Ok(SetupStatus::Missing);
    }

    let content = std::fs::read_to_string(config_path)?;
    let Some(stamp) = version_stamp(&content) else {
        return Ok(SetupStatus::Outdated(None));
    };

    let found: Version = stamp.parse()?;
    let current: Version = CURRENT_VERSION.parse()?;
    if found < current {
        return Ok(SetupStatus::Outdated(Some(stamp)));
    }
    if found > current {
        tracing::warn!(
            "Config version {} is newer than app version {}",
            found,
            current
        );
    }
    Ok(SetupStatus::Current)
}

/// Rewrites the stamp on the first line, keeping every other line.
pub fn stamp_current_version(config_path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(config_path)?;
    let body: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim_start().starts_with("config_version"))
        .collect();

    let mut stamped = format!(r#"config_version = "{CURRENT_VERSION}""#);
    for line in body {
        stamped.push('\n');
        stamped.push_str(line);
    }
    stamped.push('\n');

    std::fs::write(config_path, stamped)?;
    Ok(())
}
