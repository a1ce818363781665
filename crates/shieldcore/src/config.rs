//! Service configuration.
//!
//! Loaded from a TOML file, then overridden from the environment:
//!
//! | Key | Environment | Default |
//! | --- | ----------- | ------- |
//! | `backend_kind` | `ZK_PROOF_BACKEND` | `pedersen_sigma` |
//! | `setup_params_path` | `ZK_PROOF_SETUP_PARAMS` | none (derive generators) |
//! | `freshness_window_millis` | `ZK_PROOF_FRESHNESS_WINDOW_MS` | 86 400 000 |
//! | `max_batch_concurrency` | `ZK_PROOF_MAX_BATCH_CONCURRENCY` | available cores |

use core::{num::NonZeroUsize, str::FromStr};
use std::{env, fs, path::{Path, PathBuf}, thread};

use serde::{Deserialize, Serialize};

use crate::{
    constants::DEFAULT_FRESHNESS_WINDOW_MS, envelope::FreshnessPolicy, error::ConfigError,
    proof::BackendKind,
};

const ENV_BACKEND: &str = "ZK_PROOF_BACKEND";
const ENV_SETUP_PARAMS: &str = "ZK_PROOF_SETUP_PARAMS";
const ENV_FRESHNESS_WINDOW: &str = "ZK_PROOF_FRESHNESS_WINDOW_MS";
const ENV_MAX_BATCH_CONCURRENCY: &str = "ZK_PROOF_MAX_BATCH_CONCURRENCY";

/// Recognized options.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Which proof system to load.
    #[serde(default)]
    pub backend_kind: BackendKind,

    /// Setup parameters file. Without one the generators are derived.
    #[serde(default)]
    pub setup_params_path: Option<PathBuf>,

    /// Maximum envelope age in milliseconds.
    #[serde(default = "default_freshness_window")]
    pub freshness_window_millis: u64,

    /// Batch verification workers. Defaults to the available cores.
    #[serde(default)]
    pub max_batch_concurrency: Option<NonZeroUsize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_kind: BackendKind::default(),
            setup_params_path: None,
            freshness_window_millis: DEFAULT_FRESHNESS_WINDOW_MS,
            max_batch_concurrency: None,
        }
    }
}

const fn default_freshness_window() -> u64 {
    DEFAULT_FRESHNESS_WINDOW_MS
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(text)?)
    }
}

impl Config {
    /// Read `path`, apply environment overrides, and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = text.parse()?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env_with(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup(ENV_BACKEND) {
            self.backend_kind = parse_env(ENV_BACKEND, value)?;
        }
        if let Some(value) = lookup(ENV_SETUP_PARAMS) {
            self.setup_params_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup(ENV_FRESHNESS_WINDOW) {
            self.freshness_window_millis = parse_env(ENV_FRESHNESS_WINDOW, value)?;
        }
        if let Some(value) = lookup(ENV_MAX_BATCH_CONCURRENCY) {
            self.max_batch_concurrency = Some(parse_env(ENV_MAX_BATCH_CONCURRENCY, value)?);
        }
        Ok(())
    }

    /// Reject settings no service can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.freshness_window_millis == 0 {
            return Err(ConfigError::Invalid("freshness_window_millis must be positive"));
        }
        Ok(())
    }

    /// The freshness policy these settings describe.
    #[must_use]
    pub const fn freshness_policy(&self) -> FreshnessPolicy {
        FreshnessPolicy::new(self.freshness_window_millis)
    }

    /// Effective batch concurrency.
    #[must_use]
    pub fn batch_concurrency(&self) -> NonZeroUsize {
        self.max_batch_concurrency
            .or_else(|| thread::available_parallelism().ok())
            .unwrap_or(NonZeroUsize::MIN)
    }
}

fn parse_env<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_err| ConfigError::Env { key, value })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|&(key, value)| (key.to_owned(), value.to_owned()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = "".parse().unwrap();
        assert_eq!(config, Config::default(), "every field has a default");
        assert_eq!(config.freshness_window_millis, 86_400_000, "24 hours");
        assert!(config.batch_concurrency().get() >= 1, "at least one worker");
    }

    #[test]
    fn toml_fields_parse() {
        let config: Config = r#"
            backend_kind = "pedersen_sigma"
            setup_params_path = "/etc/shield/params.bin"
            freshness_window_millis = 60000
            max_batch_concurrency = 4
        "#
        .parse()
        .unwrap();
        assert_eq!(config.setup_params_path, Some(PathBuf::from("/etc/shield/params.bin")), "path");
        assert_eq!(config.freshness_policy().window_ms(), 60_000, "window");
        assert_eq!(config.batch_concurrency().get(), 4, "workers");
    }

    #[test]
    fn unknown_keys_and_backends_are_rejected() {
        assert!(matches!("colour = 1".parse::<Config>(), Err(ConfigError::Parse(_))), "unknown key");
        assert!(
            matches!(r#"backend_kind = "groth16""#.parse::<Config>(), Err(ConfigError::Parse(_))),
            "unknown backend"
        );
        assert!(
            matches!("max_batch_concurrency = 0".parse::<Config>(), Err(ConfigError::Parse(_))),
            "zero workers"
        );
    }

    #[test]
    fn environment_overrides_file() {
        let mut config = Config::default();
        config
            .apply_env_with(env_of(&[
                ("ZK_PROOF_SETUP_PARAMS", "/tmp/params.bin"),
                ("ZK_PROOF_FRESHNESS_WINDOW_MS", " 1000 "),
                ("ZK_PROOF_MAX_BATCH_CONCURRENCY", "2"),
                ("ZK_PROOF_BACKEND", "pedersen_sigma"),
            ]))
            .unwrap();
        assert_eq!(config.setup_params_path, Some(PathBuf::from("/tmp/params.bin")), "path");
        assert_eq!(config.freshness_window_millis, 1_000, "window");
        assert_eq!(config.max_batch_concurrency, NonZeroUsize::new(2), "workers");
    }

    #[test]
    fn bad_environment_values_name_the_variable() {
        let mut config = Config::default();
        let err = config
            .apply_env_with(env_of(&[("ZK_PROOF_MAX_BATCH_CONCURRENCY", "0")]))
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::Env { key: "ZK_PROOF_MAX_BATCH_CONCURRENCY", .. }),
            "got {err}"
        );
        let err = config
            .apply_env_with(env_of(&[("ZK_PROOF_BACKEND", "plonk")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { key: "ZK_PROOF_BACKEND", .. }), "got {err}");
    }

    #[test]
    fn zero_window_is_invalid() {
        let config = Config {
            freshness_window_millis: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))), "zero window");
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shield.toml");
        fs::write(&path, "freshness_window_millis = 5000\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.freshness_window_millis, 5_000, "from file");

        let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }), "got {err}");
    }
}
