//! Engine configuration.
//!
//! Plain values with defaults; `from_env()` applies `SPARK_DOM_*` overrides.

use std::env;

/// Default number of microtasks one `run_microtasks()` call may execute.
pub const DEFAULT_MICROTASK_BUDGET: usize = 10_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on tasks drained by a single `run_microtasks()` call.
    ///
    /// Remaining tasks stay queued for the next call.
    pub microtask_budget: usize,
    /// Run pending effect cleanups when a component is cleared.
    pub run_cleanups_on_unmount: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            microtask_budget: DEFAULT_MICROTASK_BUDGET,
            run_cleanups_on_unmount: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `SPARK_DOM_MICROTASK_BUDGET` and
    /// `SPARK_DOM_UNMOUNT_CLEANUPS`. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(budget) = env::var("SPARK_DOM_MICROTASK_BUDGET")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            config.microtask_budget = budget.max(1);
        }
        if let Some(flag) = env::var("SPARK_DOM_UNMOUNT_CLEANUPS")
            .ok()
            .and_then(|v| parse_flag(&v))
        {
            config.run_cleanups_on_unmount = flag;
        }
        config
    }

    pub fn microtask_budget(mut self, budget: usize) -> Self {
        self.microtask_budget = budget.max(1);
        self
    }

    pub fn run_cleanups_on_unmount(mut self, enabled: bool) -> Self {
        self.run_cleanups_on_unmount = enabled;
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.microtask_budget, DEFAULT_MICROTASK_BUDGET);
        assert!(config.run_cleanups_on_unmount);
    }

    #[test]
    fn test_builder_clamps_budget() {
        let config = EngineConfig::new().microtask_budget(0).run_cleanups_on_unmount(false);
        assert_eq!(config.microtask_budget, 1);
        assert!(!config.run_cleanups_on_unmount);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
