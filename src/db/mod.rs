//! SQLite trade journal.
//!
//! Stores a ledger of simulated fills, the position each fill left behind, and
//! day resets. The trading core never reads it back; it is fed write-behind
//! through [`Journal`].

mod journal;

pub use journal::{Journal, JournalEvent};

use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::models::{Position, Trade};

/// Database connection pool for the journal.
pub struct Database {
    pool: SqlitePool,
}

/// Stored trade record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredTrade {
    pub id: i64,
    pub trade_ref: String,
    pub decision: String,
    pub quantity: f64,
    pub price: f64,
    pub pnl: f64,
    pub signal_probability: Option<f64>,
    pub created_at: String,
}

/// Stored position snapshot.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredPosition {
    pub id: i64,
    pub decision: String,
    pub quantity: f64,
    pub entry_price: f64,
    pub created_at: String,
}

impl Database {
    /// Connect and create the schema if needed.
    pub async fn new(database_url: &str) -> Result<Self> {
        // Every connection to an in-memory database is a separate database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                trade_ref TEXT NOT NULL,
                decision TEXT NOT NULL,
                quantity REAL NOT NULL,
                price REAL NOT NULL,
                pnl REAL NOT NULL,
                signal_probability REAL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS positions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                decision TEXT NOT NULL,
                quantity REAL NOT NULL,
                entry_price REAL NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS day_resets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                start_balance_a REAL NOT NULL,
                start_balance_b REAL NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_trades_created ON trades(created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ==================== Trades ====================

    /// Append a simulated fill.
    pub async fn record_trade(&self, trade: &Trade) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO trades (trade_ref, decision, quantity, price, pnl, signal_probability, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(trade.id())
        .bind(trade.decision.as_str())
        .bind(to_real(trade.quantity))
        .bind(to_real(trade.price))
        .bind(to_real(trade.pnl))
        .bind(trade.signal_probability.map(to_real))
        .bind(trade.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to record trade")?;

        Ok(result.last_insert_rowid())
    }

    /// Most recent trades, newest first.
    pub async fn recent_trades(&self, limit: u32) -> Result<Vec<StoredTrade>> {
        sqlx::query_as::<_, StoredTrade>("SELECT * FROM trades ORDER BY id DESC LIMIT ?")
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch trades")
    }

    pub async fn trade_count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trades")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // ==================== Positions ====================

    /// Snapshot the position left by the latest fill.
    pub async fn save_position(&self, position: &Position) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO positions (decision, quantity, entry_price) VALUES (?, ?, ?)",
        )
        .bind(position.decision.as_str())
        .bind(to_real(position.quantity))
        .bind(to_real(position.entry_price))
        .execute(&self.pool)
        .await
        .context("Failed to save position")?;

        Ok(result.last_insert_rowid())
    }

    /// Latest position snapshot, if any was ever written.
    pub async fn last_position(&self) -> Result<Option<StoredPosition>> {
        sqlx::query_as::<_, StoredPosition>("SELECT * FROM positions ORDER BY id DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch position")
    }

    // ==================== Day resets ====================

    pub async fn record_reset(&self, start_balance_a: Decimal, start_balance_b: Decimal) -> Result<()> {
        sqlx::query("INSERT INTO day_resets (start_balance_a, start_balance_b) VALUES (?, ?)")
            .bind(to_real(start_balance_a))
            .bind(to_real(start_balance_b))
            .execute(&self.pool)
            .await
            .context("Failed to record reset")?;
        Ok(())
    }

    pub async fn reset_count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM day_resets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn to_real(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
