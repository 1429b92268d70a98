use clap::{Parser, Subcommand};
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::SimulationConfig;
use crate::domain::{parse_side, Market, Side, User};
use crate::error::{BetError, Result, WagelineError};
use crate::ledger::{BetRequest, MarketLedger};
use crate::pricing;
use crate::store::MemoryStore;

#[derive(Parser)]
#[command(name = "wageline")]
#[command(version = "0.1.0")]
#[command(about = "Pari-mutuel over/under market pricing and settlement engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory path
    #[arg(short, long, default_value = "config")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Price both sides of a pool snapshot
    Quote {
        /// Money staked on the over side
        #[arg(long, default_value = "0")]
        over: Decimal,
        /// Money staked on the under side
        #[arg(long, default_value = "0")]
        under: Decimal,
        /// Vig rate as a fraction (e.g., 0.1 = 10%)
        #[arg(long, default_value = "0.1")]
        vig: Decimal,
        /// Stake to show profit/total return for
        #[arg(long, default_value = "100")]
        stake: Decimal,
        /// Print an odds ladder across pool splits
        #[arg(long)]
        table: bool,
        /// Emit the quote as JSON
        #[arg(long)]
        json: bool,
    },
    /// Settlement math for a finished pool
    Settle {
        /// Money staked on the over side
        #[arg(long)]
        over: Decimal,
        /// Money staked on the under side
        #[arg(long)]
        under: Decimal,
        /// Winning side (over|under)
        #[arg(long)]
        winner: String,
        /// Vig rate as a fraction (e.g., 0.1 = 10%)
        #[arg(long, default_value = "0.1")]
        vig: Decimal,
        /// Emit the settlement as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fire concurrent placements at an in-memory market and report
    Simulate {
        /// Number of seeded bettors
        #[arg(long)]
        users: Option<usize>,
        /// Number of concurrent placements
        #[arg(long)]
        bets: Option<usize>,
        /// Opening balance per bettor
        #[arg(long)]
        balance: Option<Decimal>,
        /// Opening line ($/hr)
        #[arg(long)]
        line: Option<Decimal>,
        /// Vig rate as a fraction
        #[arg(long)]
        vig: Option<Decimal>,
        /// Smallest random stake
        #[arg(long)]
        min_stake: Option<Decimal>,
        /// Largest random stake
        #[arg(long)]
        max_stake: Option<Decimal>,
        /// RNG seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Price a pool snapshot from the command line
pub fn show_quote(
    over: Decimal,
    under: Decimal,
    vig: Decimal,
    stake: Decimal,
    table: bool,
    json: bool,
) -> Result<()> {
    let over_odds = pricing::american_odds(over, under, vig);
    let under_odds = pricing::american_odds(under, over, vig);

    if json {
        let quote = json!({
            "over_money": over,
            "under_money": under,
            "vig_rate": vig,
            "stake": stake,
            "over": {
                "odds": over_odds,
                "profit": pricing::profit(stake, over_odds).round_dp(2),
                "total_return": pricing::total_return(stake, over_odds).round_dp(2),
            },
            "under": {
                "odds": under_odds,
                "profit": pricing::profit(stake, under_odds).round_dp(2),
                "total_return": pricing::total_return(stake, under_odds).round_dp(2),
            },
        });
        println!("{}", serde_json::to_string_pretty(&quote)?);
        return Ok(());
    }

    println!("\x1b[36m╔══════════════════════════════════════════════╗\x1b[0m");
    println!("\x1b[36m║           Pool Quote (American odds)         ║\x1b[0m");
    println!("\x1b[36m╚══════════════════════════════════════════════╝\x1b[0m\n");

    println!("\x1b[33mPools:\x1b[0m");
    println!("   Over:   {:>12}", over);
    println!("   Under:  {:>12}", under);
    println!("   Vig:    {:>11}%\n", (vig * dec!(100)).round_dp(1));

    println!("\x1b[33mQuotes for a {} stake:\x1b[0m", stake);
    for (side, odds) in [("Over", over_odds), ("Under", under_odds)] {
        println!(
            "   {:<6} {:>+5}   profit {:>10}   returns {:>10}",
            side,
            odds,
            pricing::profit(stake, odds).round_dp(2),
            pricing::total_return(stake, odds).round_dp(2)
        );
    }

    if table {
        println!("\n\x1b[33mOdds ladder (over share of a 1000 pool):\x1b[0m\n");
        println!("   Share    Over   Under");
        println!("   {}", "─".repeat(22));
        for pct in (0..=100).step_by(10) {
            let over_money = Decimal::from(pct * 10);
            let under_money = Decimal::from((100 - pct) * 10);
            println!(
                "   {:>4}%  {:>+6}  {:>+6}",
                pct,
                pricing::american_odds(over_money, under_money, vig),
                pricing::american_odds(under_money, over_money, vig)
            );
        }
    }

    Ok(())
}

/// Settlement math for a finished pool
pub fn show_settlement(
    over: Decimal,
    under: Decimal,
    winner: &str,
    vig: Decimal,
    json: bool,
) -> Result<()> {
    let winning_side = parse_side(winner).map_err(WagelineError::Bet)?;
    let (winning_money, losing_money) = match winning_side {
        Side::Over => (over, under),
        Side::Under => (under, over),
    };
    let owed = pricing::payout_owed(winning_money, vig);
    let house = pricing::house_profit(over, under, winning_side, vig);

    if json {
        let settlement = json!({
            "over_money": over,
            "under_money": under,
            "winning_side": winning_side,
            "vig_rate": vig,
            "payout_owed": owed,
            "house_profit": house,
        });
        println!("{}", serde_json::to_string_pretty(&settlement)?);
        return Ok(());
    }

    println!("\x1b[36m╔══════════════════════════════════════════════╗\x1b[0m");
    println!("\x1b[36m║              Market Settlement               ║\x1b[0m");
    println!("\x1b[36m╚══════════════════════════════════════════════╝\x1b[0m\n");

    println!("   Winning side:  {} (pool {})", winning_side, winning_money);
    println!("   Losing pool:   {}", losing_money);
    println!(
        "   Payout owed:   {}  (winning pool × {})",
        owed,
        Decimal::ONE - vig
    );
    if house >= Decimal::ZERO {
        println!("   House profit:  \x1b[32m+{}\x1b[0m", house);
    } else {
        println!("   House profit:  \x1b[31m{}\x1b[0m", house);
    }

    Ok(())
}

/// Seed an in-memory market, fire concurrent placements through one ledger,
/// and report what landed
pub async fn run_simulation(cfg: &SimulationConfig) -> Result<()> {
    let store = MemoryStore::new();
    store
        .seed_market(Market::new(
            "sim-market",
            "Hourly wage over/under",
            cfg.opening_line,
            cfg.vig_rate,
        ))
        .await;
    for i in 0..cfg.users {
        let id = format!("bettor-{i}");
        store.seed_user(User::new(&id, &id, cfg.opening_balance)).await;
    }

    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let min_cents = (cfg.min_stake * dec!(100)).to_i64().unwrap_or(100);
    let max_cents = (cfg.max_stake * dec!(100)).to_i64().unwrap_or(10_000);

    let requests: Vec<BetRequest> = (0..cfg.bets)
        .map(|_| BetRequest {
            user_id: format!("bettor-{}", rng.gen_range(0..cfg.users)),
            market_id: "sim-market".to_string(),
            side: if rng.gen_bool(0.5) { Side::Over } else { Side::Under },
            amount: Decimal::new(rng.gen_range(min_cents..=max_cents), 2),
        })
        .collect();

    let ledger = Arc::new(MarketLedger::new(Arc::new(store.clone())));
    let placements = requests.iter().map(|req| {
        let ledger = Arc::clone(&ledger);
        let req = req.clone();
        tokio::spawn(async move { ledger.place_bet(&req).await })
    });
    let outcomes = join_all(placements).await;

    let mut accepted = 0usize;
    let mut committed_stake = Decimal::ZERO;
    let mut line_moves = 0usize;
    let mut rejections: BTreeMap<&'static str, usize> = BTreeMap::new();
    for (req, outcome) in requests.iter().zip(outcomes) {
        match outcome.map_err(|e| WagelineError::Internal(e.to_string()))? {
            Ok(receipt) => {
                accepted += 1;
                committed_stake += req.amount;
                if receipt.line_moved {
                    line_moves += 1;
                }
            }
            Err(WagelineError::Bet(kind)) => {
                let bucket = match kind {
                    BetError::InvalidInput(_) => "invalid input",
                    BetError::MarketNotFound { .. } => "market not found",
                    BetError::MarketNotActive { .. } => "market not active",
                    BetError::UserNotFound { .. } => "user not found",
                    BetError::InsufficientBalance { .. } => "insufficient balance",
                    BetError::ConcurrencyConflict { .. } => "conflict (retries exhausted)",
                };
                *rejections.entry(bucket).or_default() += 1;
            }
            Err(err) => return Err(err),
        }
    }

    let market = ledger.market("sim-market").await?;
    let bets = ledger.market_bets("sim-market").await?;
    let mut balances_spent = Decimal::ZERO;
    for i in 0..cfg.users {
        let user = ledger.user(&format!("bettor-{i}")).await?;
        balances_spent += cfg.opening_balance - user.balance;
    }

    println!("\x1b[36m╔══════════════════════════════════════════════╗\x1b[0m");
    println!("\x1b[36m║              Simulation Report               ║\x1b[0m");
    println!("\x1b[36m╚══════════════════════════════════════════════╝\x1b[0m\n");

    println!("\x1b[33mLoad:\x1b[0m");
    println!("   Bettors:        {}", cfg.users);
    println!("   Placements:     {}", cfg.bets);
    match cfg.seed {
        Some(seed) => println!("   Seed:           {seed}"),
        None => println!("   Seed:           (entropy)"),
    }

    println!("\n\x1b[33mOutcomes:\x1b[0m");
    println!("   Accepted:       {accepted}");
    for (kind, count) in &rejections {
        println!("   Rejected:       {count} ({kind})");
    }
    println!("   Line moves:     {line_moves}");

    println!("\n\x1b[33mLedger:\x1b[0m");
    println!("   Over pool:      {}", market.over_money);
    println!("   Under pool:     {}", market.under_money);
    println!(
        "   Line:           {} -> {}",
        market.initial_line, market.current_line
    );
    println!("   Bets recorded:  {}", bets.len());

    // Pools, committed stakes, and balance debits must all agree.
    let total_pool = market.total_pool();
    let consistent = total_pool == committed_stake && balances_spent == committed_stake;
    println!(
        "   Sum invariant:  pools {} == stakes {} == debits {}  {}",
        total_pool,
        committed_stake,
        balances_spent,
        if consistent {
            "\x1b[32mOK\x1b[0m"
        } else {
            "\x1b[31mVIOLATED\x1b[0m"
        }
    );
    if !consistent {
        return Err(WagelineError::Internal(
            "sum invariant violated after simulation".to_string(),
        ));
    }

    println!("\n\x1b[33mSettlement preview:\x1b[0m");
    for winner in [Side::Over, Side::Under] {
        let summary = ledger.settlement("sim-market", winner).await?;
        println!(
            "   {} wins: payout owed {}, house profit {}",
            winner,
            summary.payout_owed.round_dp(2),
            summary.house_profit.round_dp(2)
        );
    }

    Ok(())
}
