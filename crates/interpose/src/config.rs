//! Factory configuration
//!
//! Per-call `trace!` events are not configured here; they are always
//! emitted and left to the installed subscriber's level filter.

use std::path::PathBuf;

/// Environment variable naming the diagnostic dump directory
pub const DUMP_DIR_ENV: &str = "INTERPOSE_DUMP_DIR";

/// Configuration for a proxy factory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactoryOptions {
    /// Write a JSON description of every newly synthesized proxy type here
    /// (default: none). Purely diagnostic.
    pub dump_dir: Option<PathBuf>,
}

impl FactoryOptions {
    /// Default options: no dumps
    pub fn new() -> Self {
        Self::default()
    }

    /// Read options from `INTERPOSE_DUMP_DIR`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let dump_dir = lookup(DUMP_DIR_ENV)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);
        Self { dump_dir }
    }

    /// Set the dump directory
    pub fn with_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = Some(dir.into());
        self
    }
}
