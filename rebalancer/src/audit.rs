//! JSONL audit trail logging.
//!
//! Each CLI action appends events to an audit.jsonl file, one JSON object per
//! line. Tokens and session ids are never written.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use weightbook::{RebalanceError, RebalanceResult};
use weightbook_broker::Portfolio;

use crate::error::Result;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Log a simple event with no additional data.
    pub fn log_simple(&mut self, event: &'static str) -> Result<()> {
        self.log(event, serde_json::json!({}))
    }
}

pub fn log_login(audit: &mut AuditLog, username: &str, accounts: usize) -> Result<()> {
    audit.log(
        "login",
        serde_json::json!({ "username": username, "accounts": accounts }),
    )
}

pub fn log_portfolio(audit: &mut AuditLog, portfolio: &Portfolio) -> Result<()> {
    audit.log(
        "portfolio_fetched",
        serde_json::json!({
            "account": portfolio.account_id,
            "holdings": portfolio.holdings.len(),
            "total_value": portfolio.total_value,
            "currency": portfolio.currency,
        }),
    )
}

pub fn log_rebalance(audit: &mut AuditLog, source: &str, result: &RebalanceResult) -> Result<()> {
    let ops: Vec<_> = result
        .operations
        .iter()
        .map(|op| {
            serde_json::json!({
                "id": op.id,
                "ticker": op.ticker,
                "action": op.action,
                "quantity": op.quantity,
                "value": op.value,
            })
        })
        .collect();

    audit.log(
        "rebalance_computed",
        serde_json::json!({
            "source": source,
            "mode": result.mode,
            "current_total": result.current_total,
            "new_total": result.new_total,
            "additional_investment": result.additional_investment,
            "operations": ops,
        }),
    )
}

pub fn log_rebalance_failed(audit: &mut AuditLog, source: &str, err: &RebalanceError) -> Result<()> {
    audit.log(
        "rebalance_failed",
        serde_json::json!({
            "source": source,
            "kind": err.kind(),
            "message": err.to_string(),
        }),
    )
}
