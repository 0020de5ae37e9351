use serde::{Deserialize, Serialize};

/// One row of the option chain for the configured underlying and expiry.
///
/// Field names match the upstream snapshot payload. Only `strike` and
/// `percent_in_out_money` drive selection and filtering;
/// `percent_return_1_sigma_max_risk` is read once per snapshot to scale the
/// display bars. Everything else is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionRecord {
    pub strike: f64,
    /// Signed moneyness: >= 0 in-the-money, < 0 out-of-the-money.
    pub percent_in_out_money: f64,
    pub percent_max_risk: f64,
    pub percent_cost_to_insure: f64,
    pub sigma_break_even: f64,
    pub percent_to_dbl: f64,
    pub prob_above: f64,
    pub opt_mid_price: f64,
    pub percent_ask_time_value: f64,
    pub delta: f64,
    pub opt_open_int: f64,
    pub black_scholes_ratio_siv: f64,
    pub black_scholes_ratio_50_day: f64,
    pub iv_hv: f64,
    pub percent_bid_ask_spread: f64,
    pub percent_return_1_sigma_max_risk: f64,
}

impl OptionRecord {
    /// Rows with a non-numeric sort or filter key would make selection
    /// behavior undefined; they are rejected at the fetch boundary.
    #[inline]
    pub fn has_valid_keys(&self) -> bool {
        self.strike.is_finite() && self.percent_in_out_money.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_snapshot_row() {
        let json = r#"{
            "strike": 210.0,
            "percent_in_out_money": 2.04,
            "percent_max_risk": 4.69,
            "percent_cost_to_insure": 2.72,
            "sigma_break_even": 0.13,
            "percent_to_dbl": 2.4,
            "prob_above": 0.63,
            "opt_mid_price": 9.85,
            "percent_ask_time_value": 2.71,
            "delta": 0.64,
            "opt_open_int": 12865,
            "black_scholes_ratio_siv": 1.02,
            "black_scholes_ratio_50_day": 1.05,
            "iv_hv": 1.12,
            "percent_bid_ask_spread": 1.0,
            "percent_return_1_sigma_max_risk": 92.4
        }"#;
        let row: OptionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(row.strike, 210.0);
        assert_eq!(row.opt_open_int, 12865.0);
        assert!(row.has_valid_keys());
    }

    #[test]
    fn test_nan_strike_rejected() {
        let row = OptionRecord {
            strike: f64::NAN,
            ..OptionRecord::default()
        };
        assert!(!row.has_valid_keys());
    }
}
