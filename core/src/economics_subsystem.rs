//! Economics subsystem: the cash ledger.
//!
//! RULE: Operations move cash only through record_revenue /
//! record_expense, so for every operation
//!   Δcash == revenue recorded − expense recorded.
//! Loan proceeds are the one exception and are tracked separately.
//!
//! Year-end processing charges interest and overhead, then hands the
//! year's totals to the year-end pause. The accumulators are cleared
//! when the player dismisses that summary.

use crate::config::EconomyConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EconomyState {
    /// May dip below zero transiently; triggers the loan offer.
    pub cash:                f64,
    pub debt:                f64,
    pub loans_received:      u32,
    pub yearly_revenue:      f64,
    pub yearly_expenses:     f64,
    pub total_loan_proceeds: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct YearSummary {
    pub year:     u32,
    pub revenue:  f64,
    pub expenses: f64,
    pub net:      f64,
    pub cash:     f64,
    pub debt:     f64,
}

impl EconomyState {
    pub fn new(starting_cash: f64) -> Self {
        Self {
            cash: starting_cash,
            debt: 0.0,
            loans_received: 0,
            yearly_revenue: 0.0,
            yearly_expenses: 0.0,
            total_loan_proceeds: 0.0,
        }
    }

    pub fn can_afford(&self, amount: f64) -> bool {
        self.cash >= amount
    }

    pub fn record_revenue(&mut self, amount: f64) {
        self.cash += amount;
        self.yearly_revenue += amount;
    }

    pub fn record_expense(&mut self, amount: f64) {
        self.cash -= amount;
        self.yearly_expenses += amount;
    }

    /// Signed cash delta: positive is revenue, negative is expense.
    pub fn record_delta(&mut self, amount: f64) {
        if amount >= 0.0 {
            self.record_revenue(amount);
        } else {
            self.record_expense(-amount);
        }
    }

    pub fn receive_loan(&mut self, amount: f64) {
        self.cash += amount;
        self.debt += amount;
        self.loans_received += 1;
        self.total_loan_proceeds += amount;
    }

    pub fn is_insolvent(&self) -> bool {
        self.cash < 0.0
    }

    /// Charge interest and overhead for the closing year and return its
    /// totals. The caller resets the accumulators once the summary is
    /// stored.
    pub fn close_year(&mut self, year: u32, config: &EconomyConfig) -> YearSummary {
        let interest = self.debt * config.loan_interest_rate;
        if interest > 0.0 {
            self.record_expense(interest);
        }
        self.record_expense(config.annual_overhead);

        YearSummary {
            year,
            revenue: self.yearly_revenue,
            expenses: self.yearly_expenses,
            net: self.yearly_revenue - self.yearly_expenses,
            cash: self.cash,
            debt: self.debt,
        }
    }

    pub fn reset_yearly(&mut self) {
        self.yearly_revenue = 0.0;
        self.yearly_expenses = 0.0;
    }

    /// Panics on NaN or infinity. A non-finite ledger would poison every
    /// later tick of a deterministic replay.
    pub fn assert_finite(&self) {
        for (name, value) in [
            ("cash", self.cash),
            ("debt", self.debt),
            ("yearly_revenue", self.yearly_revenue),
            ("yearly_expenses", self.yearly_expenses),
        ] {
            assert!(value.is_finite(), "economy invariant broken: {name} = {value}");
        }
    }
}

/// Engine-computed loan size: cover the deficit plus a buffer, never
/// less than the configured minimum, rounded up to the next $1,000.
pub fn loan_amount(cash: f64, config: &EconomyConfig) -> f64 {
    let needed = (-cash + config.loan_buffer).max(config.min_loan);
    (needed / 1_000.0).ceil() * 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_delta_matches_recorded_flows() {
        let mut econ = EconomyState::new(1_000.0);
        let before = econ.cash;
        econ.record_expense(250.0);
        econ.record_revenue(400.0);
        econ.record_delta(-50.0);
        assert_eq!(econ.cash - before, econ.yearly_revenue - econ.yearly_expenses);
    }

    #[test]
    fn close_year_charges_interest_and_overhead() {
        let config = EconomyConfig::default();
        let mut econ = EconomyState::new(20_000.0);
        econ.receive_loan(10_000.0);
        let summary = econ.close_year(1, &config);
        assert_eq!(summary.expenses, 700.0 + 2_000.0);
        assert_eq!(econ.cash, 30_000.0 - 2_700.0);
        assert_eq!(econ.total_loan_proceeds, 10_000.0);
    }

    #[test]
    fn loan_amount_rounds_up() {
        let config = EconomyConfig::default();
        assert_eq!(loan_amount(-12_345.0, &config), 18_000.0);
        assert_eq!(loan_amount(-1.0, &config), 10_000.0);
    }

    #[test]
    #[should_panic(expected = "economy invariant broken")]
    fn nan_cash_is_fatal() {
        let mut econ = EconomyState::new(0.0);
        econ.cash = f64::NAN;
        econ.assert_finite();
    }
}
