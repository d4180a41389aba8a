//! Plain-text rendering of accounts, portfolios, and rebalance plans.

use std::fmt;

use weightbook::{Action, Mode, RebalanceResult};
use weightbook_broker::{Account, Portfolio};

use crate::doctor::Check;

/// Table of accounts.
pub struct AccountsTable<'a>(pub &'a [Account]);

impl fmt::Display for AccountsTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No accounts.");
        }
        writeln!(f, "ACCOUNTS:")?;
        writeln!(f, "  {:12} {:28} {:26} {}", "ID", "Name", "Type", "Status")?;
        for a in self.0 {
            writeln!(
                f,
                "  {:12} {:28} {:26} {}",
                a.id, a.name, a.account_type, a.status
            )?;
        }
        Ok(())
    }
}

/// Holdings of one account with their share of the holdings' total.
pub struct PortfolioTable<'a>(pub &'a Portfolio);

impl fmt::Display for PortfolioTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.0;
        writeln!(
            f,
            "Account {}: {:.2} {} total",
            p.account_id, p.total_value, p.currency
        )?;
        if p.holdings.is_empty() {
            return writeln!(f, "No positions.");
        }

        let holdings_total: f64 = p.holdings.iter().map(|h| h.current_value).sum();
        writeln!(f, "\nPOSITIONS:")?;
        writeln!(
            f,
            "  {:14} {:8} {:24} {:>12} {:>12} {:>14} {:>7}",
            "FIGI", "Ticker", "Name", "Quantity", "Price", "Value", "Weight"
        )?;
        for h in &p.holdings {
            let weight = if holdings_total > 0.0 {
                h.current_value / holdings_total * 100.0
            } else {
                0.0
            };
            writeln!(
                f,
                "  {:14} {:8} {:24} {:>12.4} {:>12.4} {:>10.2} {:3} {:>6.2}%",
                h.figi,
                h.ticker,
                truncate(&h.name, 24),
                h.quantity,
                h.current_price,
                h.current_value,
                h.currency,
                weight,
            )?;
        }
        Ok(())
    }
}

/// A computed rebalance plan.
pub struct PlanReport<'a>(pub &'a RebalanceResult);

impl fmt::Display for PlanReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        writeln!(f, "REBALANCE PLAN ({}):", r.mode)?;

        if r.operations.is_empty() {
            writeln!(f, "  No rebalancing needed: selected positions match target.")?;
        } else {
            writeln!(
                f,
                "  {:>3}  {:6} {:8} {:14} {:>12} {:>12} {:>8} {:>8}",
                "#", "Action", "Ticker", "FIGI", "Quantity", "Value", "Now%", "Target%"
            )?;
            for (i, op) in r.operations.iter().enumerate() {
                let ticker = if op.ticker.is_empty() { "-" } else { op.ticker.as_str() };
                writeln!(
                    f,
                    "  {:>3}  {:6} {:8} {:14} {:>12.4} {:>12.2} {:>7.2}% {:>7.2}%",
                    i + 1,
                    format!("{}", op.action),
                    ticker,
                    op.id,
                    op.quantity,
                    op.value,
                    op.current_weight,
                    op.target_weight,
                )?;
            }
        }

        writeln!(f)?;
        writeln!(f, "  Current total:  {:>14.2}", r.current_total)?;
        writeln!(f, "  New total:      {:>14.2}", r.new_total)?;
        writeln!(f, "  Buys:           {:>14.2}", r.total_buy_value())?;
        if r.mode == Mode::BuyAndSell {
            writeln!(f, "  Sells:          {:>14.2}", r.total_sell_value())?;
        } else {
            let skipped = r.operations_of(Action::Skip).count();
            if skipped > 0 {
                writeln!(f, "  Skipped:        {skipped:>14} (above target, selling disabled)")?;
            }
            writeln!(f, "  Add. investment:{:>14.2}", r.additional_investment)?;
        }
        Ok(())
    }
}

/// Results of the setup checks.
pub struct DoctorReport<'a>(pub &'a [Check]);

impl fmt::Display for DoctorReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0 {
            writeln!(f, "  [{:4}] {:16} {}", c.status, c.name, c.detail)?;
        }
        Ok(())
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max - 1).collect();
        out.push('…');
        out
    }
}
