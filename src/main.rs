//! Quant Desk
//!
//! Simulated two-wallet trading desk: gates mock probability signals on
//! expected value and risk guards, sizes them under a per-trade risk budget,
//! and books simulated PnL into a trading wallet and a profit vault.

mod db;
mod desk;
mod error;
mod metrics;
mod models;
mod trading;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::db::{Database, Journal};
use crate::desk::TradingDesk;
use crate::error::DeskError;
use crate::trading::Settings;

/// Simulated trading desk CLI.
#[derive(Parser)]
#[command(name = "quantdesk")]
#[command(about = "Evaluate mock signals against a two-wallet trading desk", long_about = None)]
struct Cli {
    /// Journal database URL (overrides TRADING_DATABASE_URL)
    #[arg(short, long, global = true)]
    database: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a signal and execute it if the guards allow
    Trade {
        /// Asset price
        #[arg(long)]
        price: Decimal,

        /// Signal probability in [0, 1]
        #[arg(long)]
        probability: Decimal,

        /// Evaluate the same signal this many times
        #[arg(short, long, default_value = "1")]
        repeat: u32,
    },

    /// Show wallets, metrics and recent trades
    Status,

    /// Reset the day to the configured opening balances
    Reset,

    /// Show current configuration
    Config,

    /// Interactive session on one desk (reads commands from stdin)
    Session,

    /// Show trades recorded in the journal
    History {
        /// Maximum number of trades to show
        #[arg(short = 'n', long, default_value = "25", value_parser = clap::value_parser!(u32).range(1..))]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut settings = Settings::from_env()?;
    if let Some(url) = cli.database.clone() {
        settings.database_url = Some(url);
    }

    match cli.command {
        Commands::Config => print_config(&settings, cli.json)?,

        Commands::History { limit } => {
            let url = settings
                .database_url
                .as_deref()
                .context("No journal configured. Pass --database or set TRADING_DATABASE_URL.")?;
            let db = Database::new(url).await?;
            let trades = db.recent_trades(limit).await?;

            println!("\n=== Trade Journal ===");
            println!("Fills Recorded:   {}", db.trade_count().await?);
            println!("Day Resets:       {}", db.reset_count().await?);
            match db.last_position().await? {
                Some(pos) => println!(
                    "Last Position:    #{} {} {:.4} @ {:.2} ({})",
                    pos.id, pos.decision, pos.quantity, pos.entry_price, pos.created_at
                ),
                None => println!("Last Position:    none"),
            }

            if trades.is_empty() {
                println!("\nNo trades recorded yet.");
                return Ok(());
            }

            println!(
                "\n{:>5} {:<18} {:<26} {:<8} {:>12} {:>10} {:>12} {:>6}",
                "#", "ID", "TIME", "SIDE", "SIZE", "PRICE", "P&L", "PROB"
            );
            println!("{}", "-".repeat(104));
            for t in trades {
                println!(
                    "{:>5} {:<18} {:<26} {:<8} {:>12.4} {:>10.2} {:>+12.4} {:>6}",
                    t.id,
                    t.trade_ref,
                    truncate(&t.created_at, 25),
                    t.decision,
                    t.quantity,
                    t.price,
                    t.pnl,
                    t.signal_probability
                        .map(|p| format!("{:.2}", p))
                        .unwrap_or_else(|| "-".to_string())
                );
            }
        }

        command => {
            let (desk, writer) = open_desk(settings).await?;
            let result = run_desk_command(&desk, command, cli.json).await;

            // Let the journal drain before exiting
            drop(desk);
            if let Some(writer) = writer {
                writer.await?;
            }
            result?;
        }
    }

    Ok(())
}

async fn open_desk(settings: Settings) -> Result<(TradingDesk, Option<JoinHandle<()>>)> {
    let Some(url) = settings.database_url.clone() else {
        return Ok((TradingDesk::new(settings), None));
    };

    let db = Database::new(&url).await?;
    let (journal, writer) = Journal::spawn(Arc::new(db));
    info!(database = %url, "Trade journal enabled");

    Ok((TradingDesk::new(settings).with_journal(journal), Some(writer)))
}

async fn run_desk_command(desk: &TradingDesk, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Trade {
            price,
            probability,
            repeat,
        } => {
            let mut executed = 0u32;
            for _ in 0..repeat.max(1) {
                match desk.evaluate(price, probability).await {
                    Ok(outcome) => {
                        if outcome.executed() {
                            executed += 1;
                        }
                        emit(&outcome, json)?;
                    }
                    Err(e) => {
                        error!(error = %e, "Trade rejected");
                        println!("Trade rejected: {}", e);
                        return Err(e.into());
                    }
                }
            }
            if repeat > 1 {
                info!(evaluated = repeat, executed = executed, "Repeated signal finished");
            }
        }

        Commands::Status => emit(&desk.status().await, json)?,

        Commands::Reset => emit(&desk.reset_day().await, json)?,

        Commands::Session => run_session(desk, json).await?,

        Commands::Config | Commands::History { .. } => {}
    }
    Ok(())
}

/// Line-oriented command loop over stdin against a single desk.
async fn run_session(desk: &TradingDesk, json: bool) -> Result<()> {
    println!("\n=== {} session ===", desk.settings().app_name);
    println!("Commands: trade <price> <probability>, status, reset, config, quit\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match SessionCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            SessionCommand::Trade { price, probability } => {
                match desk.evaluate(price, probability).await {
                    Ok(outcome) => emit(&outcome, json)?,
                    Err(e) if e.is_floor_breach() => println!("Trade rejected: {}", e),
                    Err(e) => println!("{}", e),
                }
            }
            SessionCommand::Status => emit(&desk.status().await, json)?,
            SessionCommand::Reset => emit(&desk.reset_day().await, json)?,
            SessionCommand::Config => print_config(desk.settings(), json)?,
            SessionCommand::Quit => break,
        }
    }

    Ok(())
}

#[derive(Debug, PartialEq)]
enum SessionCommand {
    Trade { price: Decimal, probability: Decimal },
    Status,
    Reset,
    Config,
    Quit,
}

impl SessionCommand {
    /// Parse one input line. Blank lines yield `None`.
    fn parse(line: &str) -> Result<Option<Self>, DeskError> {
        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            return Ok(None);
        };

        let command = match head.to_lowercase().as_str() {
            "trade" => {
                let price = parse_number(parts.next(), "price")?;
                let probability = parse_number(parts.next(), "probability")?;
                SessionCommand::Trade { price, probability }
            }
            "status" => SessionCommand::Status,
            "reset" => SessionCommand::Reset,
            "config" => SessionCommand::Config,
            "quit" | "exit" => SessionCommand::Quit,
            other => {
                return Err(DeskError::InvalidInput(format!("unknown command '{}'", other)));
            }
        };
        Ok(Some(command))
    }
}

fn parse_number(raw: Option<&str>, field: &str) -> Result<Decimal, DeskError> {
    let raw = raw.ok_or_else(|| DeskError::InvalidInput(format!("missing {}", field)))?;
    raw.parse()
        .map_err(|_| DeskError::InvalidInput(format!("{} is not a number: {}", field, raw)))
}

fn emit<T: Serialize + std::fmt::Display>(report: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report);
    }
    Ok(())
}

fn print_config(settings: &Settings, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(settings)?);
        return Ok(());
    }

    let hundred = Decimal::from(100);

    println!("\n=== {} Configuration ===\n", settings.app_name);
    println!("Risk:");
    println!("  Max Risk Per Trade:   {}%", settings.max_risk_per_trade * hundred);
    println!("  Exposure Limit:       {:.0}%", settings.exposure_limit * 100.0);
    println!("  Min Win Coverage:     {:.2}", settings.min_wcr);

    println!("\nSignal Model:");
    println!("  Expected Gain:        {}%", settings.expected_gain_pct * hundred);
    println!("  Expected Loss:        {}%", settings.expected_loss_pct * hundred);
    println!("  Expected Move:        {}%", settings.expected_move_pct * hundred);

    println!("\nWallets:");
    println!("  Wallet A Opening:     {} {}", settings.start_balance_a, settings.currency);
    println!("  Wallet B Opening:     {} {}", settings.start_balance_b, settings.currency);

    println!("\nReporting:");
    println!("  Recent Trades Shown:  {}", settings.recent_trades_limit);
    println!(
        "  Journal:              {}",
        settings.database_url.as_deref().unwrap_or("disabled")
    );
    Ok(())
}

/// Truncate string to max length with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
