//! Rebalancing policy: whether the calculator may suggest reducing a holding.

use std::fmt;
use std::str::FromStr;

/// Rebalancing policy.
///
/// `BuyOnly` only ever adds capital; `BuyAndSell` reallocates the existing
/// capital among the selected positions, selling where a holding is above its
/// target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Mode {
    #[default]
    BuyOnly,
    BuyAndSell,
}

impl Mode {
    /// The wire token for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::BuyOnly => "buy_only",
            Mode::BuyAndSell => "buy_and_sell",
        }
    }

    /// True if this mode may emit `sell` operations.
    pub fn allows_sell(&self) -> bool {
        matches!(self, Mode::BuyAndSell)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mode token other than `buy_only` / `buy_and_sell`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown rebalance mode '{0}' (expected 'buy_only' or 'buy_and_sell')")]
pub struct ParseModeError(pub String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy_only" => Ok(Mode::BuyOnly),
            "buy_and_sell" => Ok(Mode::BuyAndSell),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_tokens() {
        assert_eq!("buy_only".parse::<Mode>(), Ok(Mode::BuyOnly));
        assert_eq!("buy_and_sell".parse::<Mode>(), Ok(Mode::BuyAndSell));
    }

    #[test]
    fn unknown_token_is_rejected() {
        let err = "sell_everything".parse::<Mode>().unwrap_err();
        assert_eq!(err, ParseModeError("sell_everything".into()));
        assert!(err.to_string().contains("sell_everything"));
        // Tokens are case-sensitive
        assert!("BUY_ONLY".parse::<Mode>().is_err());
        assert!("".parse::<Mode>().is_err());
    }

    #[test]
    fn display_matches_token() {
        for mode in [Mode::BuyOnly, Mode::BuyAndSell] {
            assert_eq!(mode.to_string().parse::<Mode>(), Ok(mode));
        }
    }

    #[test]
    fn only_buy_and_sell_allows_sell() {
        assert!(!Mode::BuyOnly.allows_sell());
        assert!(Mode::BuyAndSell.allows_sell());
        assert_eq!(Mode::default(), Mode::BuyOnly);
    }
}
