use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Placement engine knobs
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// How many attempts one placement may spend on commit conflicts before
    /// it is abandoned
    #[serde(default = "default_max_commit_attempts")]
    pub max_commit_attempts: u32,
}

fn default_max_commit_attempts() -> u32 {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_commit_attempts: default_max_commit_attempts(),
        }
    }
}

/// Fixture and load parameters for the `simulate` command
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Number of seeded bettors
    #[serde(default = "default_sim_users")]
    pub users: usize,
    /// Number of concurrent placements to fire
    #[serde(default = "default_sim_bets")]
    pub bets: usize,
    /// Opening balance per seeded bettor
    #[serde(default = "default_opening_balance")]
    pub opening_balance: Decimal,
    /// Opening line for the seeded market ($/hr)
    #[serde(default = "default_opening_line")]
    pub opening_line: Decimal,
    /// Vig for the seeded market (e.g., 0.1 = 10%)
    #[serde(default = "default_vig_rate")]
    pub vig_rate: Decimal,
    /// Smallest random stake
    #[serde(default = "default_min_stake")]
    pub min_stake: Decimal,
    /// Largest random stake
    #[serde(default = "default_max_stake")]
    pub max_stake: Decimal,
    /// Seed for reproducible runs; entropy when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_sim_users() -> usize {
    8
}

fn default_sim_bets() -> usize {
    64
}

fn default_opening_balance() -> Decimal {
    Decimal::new(1000, 0)
}

fn default_opening_line() -> Decimal {
    Decimal::new(2500, 2) // $25.00/hr
}

fn default_vig_rate() -> Decimal {
    Decimal::new(1, 1) // 0.1 = 10%
}

fn default_min_stake() -> Decimal {
    Decimal::new(10, 0)
}

fn default_max_stake() -> Decimal {
    Decimal::new(250, 0)
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            users: default_sim_users(),
            bets: default_sim_bets(),
            opening_balance: default_opening_balance(),
            opening_line: default_opening_line(),
            vig_rate: default_vig_rate(),
            min_stake: default_min_stake(),
            max_stake: default_max_stake(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("engine.max_commit_attempts", 3)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("WAGELINE_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (WAGELINE_ENGINE__MAX_COMMIT_ATTEMPTS, etc.)
            .add_source(
                Environment::with_prefix("WAGELINE")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.engine.max_commit_attempts == 0 {
            errors.push("engine.max_commit_attempts must be at least 1".to_string());
        }

        if self.simulation.vig_rate < Decimal::ZERO || self.simulation.vig_rate >= Decimal::ONE {
            errors.push("simulation.vig_rate must be in [0, 1)".to_string());
        }

        if self.simulation.opening_line <= Decimal::ZERO {
            errors.push("simulation.opening_line must be positive".to_string());
        }

        if self.simulation.opening_balance <= Decimal::ZERO {
            errors.push("simulation.opening_balance must be positive".to_string());
        }

        if self.simulation.min_stake <= Decimal::ZERO {
            errors.push("simulation.min_stake must be positive".to_string());
        }

        if self.simulation.max_stake < self.simulation.min_stake {
            errors.push("simulation.max_stake must be >= min_stake".to_string());
        }

        if self.simulation.users == 0 {
            errors.push("simulation.users must be at least 1".to_string());
        }

        if self.simulation.bets == 0 {
            errors.push("simulation.bets must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
