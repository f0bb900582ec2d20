//! Configuration for background watchers and timers.
//!
//! Settings are read from the environment:
//!
//! | Variable                      | Values             | Default          |
//! |-------------------------------|--------------------|------------------|
//! | `CTXJOIN_WATCHER_SPAWN`       | `shared`, `thread` | `shared`         |
//! | `CTXJOIN_WATCHER_THREAD_NAME` | any non-empty name | `ctxjoin-watcher`|

use std::sync::OnceLock;

/// Environment variable selecting the [`SpawnMode`].
pub const SPAWN_ENV: &str = "CTXJOIN_WATCHER_SPAWN";

/// Environment variable naming watcher threads.
pub const THREAD_NAME_ENV: &str = "CTXJOIN_WATCHER_THREAD_NAME";

const DEFAULT_THREAD_NAME: &str = "ctxjoin-watcher";

/// Errors from loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable held a value that could not be parsed.
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

/// Where background watchers run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpawnMode {
    /// Run on a Tokio runtime owned by this crate, independent of the caller's.
    #[default]
    Shared,
    /// Always use a dedicated OS thread.
    Thread,
}

impl std::str::FromStr for SpawnMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shared" | "auto" | "runtime" => Ok(SpawnMode::Shared),
            "thread" | "threads" | "os" => Ok(SpawnMode::Thread),
            _ => Err(format!(
                "invalid spawn mode '{}', expected 'shared' or 'thread'",
                s
            )),
        }
    }
}

/// Configuration for watcher tasks spawned by contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    /// Where watchers run.
    pub spawn: SpawnMode,
    /// Name given to watcher threads.
    pub thread_name: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            spawn: SpawnMode::Shared,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl WatcherConfig {
    /// Set the spawn mode.
    pub fn with_spawn(mut self, spawn: SpawnMode) -> Self {
        self.spawn = spawn;
        self
    }

    /// Set the thread name used for watcher threads. NUL bytes are removed.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into().replace('\0', "");
        self
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(SPAWN_ENV) {
            config.spawn = raw
                .parse()
                .map_err(|reason| ConfigError::InvalidValue {
                    var: SPAWN_ENV,
                    reason,
                })?;
        }

        if let Some(name) = lookup(THREAD_NAME_ENV) {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    var: THREAD_NAME_ENV,
                    reason: "thread name must not be empty".to_string(),
                });
            }
            if name.contains('\0') {
                return Err(ConfigError::InvalidValue {
                    var: THREAD_NAME_ENV,
                    reason: "thread name must not contain NUL bytes".to_string(),
                });
            }
            config.thread_name = name;
        }

        Ok(config)
    }

    /// Process-wide configuration, loaded from the environment on first use.
    pub fn global() -> &'static WatcherConfig {
        static GLOBAL: OnceLock<WatcherConfig> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            WatcherConfig::from_env().unwrap_or_else(|e| {
                tracing::warn!("Ignoring watcher configuration: {}", e);
                WatcherConfig::default()
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn test_spawn_mode_parsing() {
        assert_eq!("shared".parse::<SpawnMode>().unwrap(), SpawnMode::Shared);
        assert_eq!("auto".parse::<SpawnMode>().unwrap(), SpawnMode::Shared);
        assert_eq!("Thread".parse::<SpawnMode>().unwrap(), SpawnMode::Thread);
        assert_eq!(" runtime ".parse::<SpawnMode>().unwrap(), SpawnMode::Shared);
        assert!("fibers".parse::<SpawnMode>().is_err());
    }

    #[test]
    fn test_defaults_without_env() {
        let config = WatcherConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, WatcherConfig::default());
        assert_eq!(config.thread_name, "ctxjoin-watcher");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = WatcherConfig::from_lookup(lookup_from(&[
            (SPAWN_ENV, "thread"),
            (THREAD_NAME_ENV, "ctx-watch"),
        ]))
        .unwrap();
        assert_eq!(config.spawn, SpawnMode::Thread);
        assert_eq!(config.thread_name, "ctx-watch");
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = WatcherConfig::from_lookup(lookup_from(&[(SPAWN_ENV, "green")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var, .. } if var == SPAWN_ENV));

        let err = WatcherConfig::from_lookup(lookup_from(&[(THREAD_NAME_ENV, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var, .. } if var == THREAD_NAME_ENV));

        let err =
            WatcherConfig::from_lookup(lookup_from(&[(THREAD_NAME_ENV, "watch\0er")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var, .. } if var == THREAD_NAME_ENV));
    }

    #[test]
    fn test_builder() {
        let config = WatcherConfig::default()
            .with_spawn(SpawnMode::Thread)
            .with_thread_name("custom");
        assert_eq!(config.spawn, SpawnMode::Thread);
        assert_eq!(config.thread_name, "custom");
    }
}
