use crate::chain::types::OptionRecord;
use serde::{Deserialize, Serialize};

/// Moneyness filter mode for the windowed rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Moneyness {
    #[default]
    All,
    In,
    Out,
}

impl Moneyness {
    /// Parse a mode string from the HTTP boundary. Anything unrecognized
    /// falls back to `All`, matching the filter's identity default.
    pub fn parse(s: &str) -> Self {
        match s {
            "In" => Self::In,
            "Out" => Self::Out,
            _ => Self::All,
        }
    }
}

impl std::fmt::Display for Moneyness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::In => write!(f, "In"),
            Self::Out => write!(f, "Out"),
        }
    }
}

/// Keep rows matching the moneyness mode. Order-preserving: the windowed
/// order coming in is the order going out.
pub fn filter_by_moneyness(records: &[OptionRecord], mode: Moneyness) -> Vec<OptionRecord> {
    match mode {
        Moneyness::All => records.to_vec(),
        Moneyness::In => records
            .iter()
            .filter(|r| r.percent_in_out_money >= 0.0)
            .cloned()
            .collect(),
        Moneyness::Out => records
            .iter()
            .filter(|r| r.percent_in_out_money < 0.0)
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(strike: f64, pct: f64) -> OptionRecord {
        OptionRecord {
            strike,
            percent_in_out_money: pct,
            ..OptionRecord::default()
        }
    }

    fn sample() -> Vec<OptionRecord> {
        vec![
            rec(210.0, 2.0),
            rec(214.29, 0.0),
            rec(220.0, -2.6),
            rec(225.0, -4.8),
        ]
    }

    #[test]
    fn test_all_is_identity() {
        let rows = sample();
        assert_eq!(filter_by_moneyness(&rows, Moneyness::All), rows);
    }

    #[test]
    fn test_in_keeps_nonnegative() {
        let rows = filter_by_moneyness(&sample(), Moneyness::In);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.percent_in_out_money >= 0.0));
        // zero moneyness counts as in-the-money
        assert_eq!(rows[1].strike, 214.29);
    }

    #[test]
    fn test_out_keeps_negative() {
        let rows = filter_by_moneyness(&sample(), Moneyness::Out);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.percent_in_out_money < 0.0));
    }

    #[test]
    fn test_order_preserved() {
        let rows = filter_by_moneyness(&sample(), Moneyness::Out);
        assert_eq!(rows[0].strike, 220.0);
        assert_eq!(rows[1].strike, 225.0);
    }

    #[test]
    fn test_idempotent() {
        for mode in [Moneyness::All, Moneyness::In, Moneyness::Out] {
            let once = filter_by_moneyness(&sample(), mode);
            let twice = filter_by_moneyness(&once, mode);
            assert_eq!(once, twice, "mode {mode} not idempotent");
        }
    }

    #[test]
    fn test_parse_unknown_defaults_to_all() {
        assert_eq!(Moneyness::parse("In"), Moneyness::In);
        assert_eq!(Moneyness::parse("Out"), Moneyness::Out);
        assert_eq!(Moneyness::parse("All"), Moneyness::All);
        assert_eq!(Moneyness::parse(""), Moneyness::All);
        assert_eq!(Moneyness::parse("atm"), Moneyness::All);
    }
}
