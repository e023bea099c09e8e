// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mortgage instalment

use crate::config::FinanceConfig;

/// Constant monthly instalment of a fully amortizing loan, in cents precision
///
/// Non-positive principal, zero term or a non-finite outcome give 0.
pub fn monthly_payment(principal: f64, finance: &FinanceConfig) -> f64 {
    if principal.is_nan() || principal <= 0.0 || finance.years == 0 {
        return 0.0;
    }

    let months = f64::from(finance.years * 12);
    let rate = finance.annual_rate_pct / 100.0 / 12.0;

    let payment = if rate == 0.0 {
        principal / months
    } else {
        let factor = (1.0 + rate).powf(months);
        principal * rate * factor / (factor - 1.0)
    };

    if payment.is_finite() {
        round_cents(payment)
    } else {
        0.0
    }
}

#[inline]
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
