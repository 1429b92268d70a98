use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wageline::cli::{self, Cli, Commands};
use wageline::config::AppConfig;
use wageline::error::{Result, WagelineError};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Quote {
            over,
            under,
            vig,
            stake,
            table,
            json,
        } => {
            init_logging_simple();
            cli::show_quote(over, under, vig, stake, table, json)?;
        }
        Commands::Settle {
            over,
            under,
            winner,
            vig,
            json,
        } => {
            init_logging_simple();
            cli::show_settlement(over, under, &winner, vig, json)?;
        }
        Commands::Simulate {
            users,
            bets,
            balance,
            line,
            vig,
            min_stake,
            max_stake,
            seed,
        } => {
            let mut config = AppConfig::load_from(&cli.config)?;
            init_logging(&config.logging.level, config.logging.json);

            // CLI flags override whatever the config files said
            let sim = &mut config.simulation;
            if let Some(users) = users {
                sim.users = users;
            }
            if let Some(bets) = bets {
                sim.bets = bets;
            }
            if let Some(balance) = balance {
                sim.opening_balance = balance;
            }
            if let Some(line) = line {
                sim.opening_line = line;
            }
            if let Some(vig) = vig {
                sim.vig_rate = vig;
            }
            if let Some(min_stake) = min_stake {
                sim.min_stake = min_stake;
            }
            if let Some(max_stake) = max_stake {
                sim.max_stake = max_stake;
            }
            if let Some(seed) = seed {
                sim.seed = Some(seed);
            }

            if let Err(violations) = config.validate() {
                return Err(WagelineError::Validation(violations.join("; ")));
            }

            info!(
                users = config.simulation.users,
                bets = config.simulation.bets,
                "Starting placement simulation"
            );
            cli::run_simulation(&config.simulation).await?;
        }
    }

    Ok(())
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},wageline=debug")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn init_logging_simple() {
    // Minimal logging for pure-calculator commands
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}
