//! Runtime configuration read from the environment.

use pokeapi::PokeApi;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::export::Exporter;
use crate::sampler::{
    FetchFailurePolicy, SampleError, Sampler, SamplerConfig, DEFAULT_ATTEMPT_BUDGET,
};
use crate::tier::{LadderKind, TierLadder};

pub const ENV_BASE_URL: &str = "POKEAPI_BASE_URL";
pub const ENV_LADDER: &str = "TIERBOARD_LADDER";
pub const ENV_ATTEMPTS: &str = "TIERBOARD_ATTEMPTS";
pub const ENV_TIMEOUT_SECS: &str = "TIERBOARD_TIMEOUT_SECS";
pub const ENV_ON_FETCH_ERROR: &str = "TIERBOARD_ON_FETCH_ERROR";
pub const ENV_OUTPUT_DIR: &str = "TIERBOARD_OUTPUT_DIR";
pub const ENV_SEED: &str = "TIERBOARD_SEED";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] pokeapi::Error),

    #[error(transparent)]
    Sampler(#[from] SampleError),
}

/// Configuration for a tier board session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// PokeAPI root; the client default when unset.
    pub base_url: Option<String>,
    pub ladder: TierLadder,
    pub attempt_budget: u32,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    pub on_fetch_error: FetchFailurePolicy,
    /// Where downloads and the log file go.
    pub output_dir: PathBuf,
    /// Fixed RNG seed for reproducible boards.
    pub seed: Option<u64>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            ladder: TierLadder::CLASSIC,
            attempt_budget: DEFAULT_ATTEMPT_BUDGET,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            on_fetch_error: FetchFailurePolicy::Skip,
            output_dir: PathBuf::from("."),
            seed: None,
        }
    }
}

impl BoardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every `TIERBOARD_*` variable plus `POKEAPI_BASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`BoardConfig::from_env`] but reading through `lookup`. Unset
    /// and blank values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get(ENV_BASE_URL) {
            config.base_url = Some(url.trim().to_string());
        }
        if let Some(value) = get(ENV_LADDER) {
            config.ladder = parse_ladder(&value).map_err(invalid(ENV_LADDER))?;
        }
        if let Some(value) = get(ENV_ATTEMPTS) {
            config.attempt_budget = parse_attempts(&value).map_err(invalid(ENV_ATTEMPTS))?;
        }
        if let Some(value) = get(ENV_TIMEOUT_SECS) {
            let secs: u64 = value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: ENV_TIMEOUT_SECS,
                message: format!("'{value}' is not a number of seconds"),
            })?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    var: ENV_TIMEOUT_SECS,
                    message: "timeout must be at least one second".to_string(),
                });
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(value) = get(ENV_ON_FETCH_ERROR) {
            config.on_fetch_error = value.parse().map_err(invalid(ENV_ON_FETCH_ERROR))?;
        }
        if let Some(dir) = get(ENV_OUTPUT_DIR) {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(value) = get(ENV_SEED) {
            config.seed = Some(value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: ENV_SEED,
                message: format!("'{value}' is not an unsigned integer"),
            })?);
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_ladder(mut self, ladder: TierLadder) -> Self {
        self.ladder = ladder;
        self
    }

    pub fn with_attempt_budget(mut self, budget: u32) -> Self {
        self.attempt_budget = budget;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_fetch_failure_policy(mut self, policy: FetchFailurePolicy) -> Self {
        self.on_fetch_error = policy;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig::default()
            .with_attempt_budget(self.attempt_budget)
            .with_ladder(self.ladder)
            .with_fetch_failure_policy(self.on_fetch_error)
    }

    pub fn sampler(&self) -> Result<Sampler, ConfigError> {
        Ok(Sampler::new(self.sampler_config())?)
    }

    /// Seeded when a seed is configured, from OS entropy otherwise.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn client(&self) -> Result<PokeApi, ConfigError> {
        let client = PokeApi::with_timeout(self.timeout)?;
        Ok(match &self.base_url {
            Some(url) => client.with_base_url(url.clone()),
            None => client,
        })
    }

    pub fn exporter(&self) -> Exporter {
        Exporter::system(&self.output_dir)
    }

    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join("tierboard.log")
    }
}

/// Parse a ladder name.
fn invalid(var: &'static str) -> impl Fn(String) -> ConfigError {
    move |message| ConfigError::Invalid { var, message }
}

pub fn parse_ladder(value: &str) -> Result<TierLadder, String> {
    let kind: LadderKind = value.parse()?;
    kind.ladder()
        .ok_or_else(|| format!("ladder '{kind}' has no predefined floors"))
}

/// Parse an attempt budget; zero is rejected.
pub fn parse_attempts(value: &str) -> Result<u32, String> {
    match value.trim().parse::<u32>() {
        Ok(0) => Err("attempt budget must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{value}' is not a whole number of attempts")),
    }
}
