use rust_decimal::Decimal;

use crate::consts;

pub mod attendance;
pub mod calculator;
pub mod run;
pub mod salary;

/// Tenant-independent payroll policy, built once at startup from the
/// environment and passed by reference into the aggregator and calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollPolicy {
    /// Provident fund rate, applied to prorated basic (employee and employer side).
    pub pf_rate: Decimal,
    /// Gross at or above this amount incurs the fixed professional tax.
    pub prof_tax_threshold: Decimal,
    pub prof_tax_amount: Decimal,
    /// A day counts as present once aggregated work hours reach this.
    pub min_active_hours: f64,
    /// Mon-Fri working days when set, full calendar month otherwise.
    pub business_days_only: bool,
}

impl Default for PayrollPolicy {
    fn default() -> Self {
        Self {
            pf_rate: consts::DEFAULT_PF_RATE,
            prof_tax_threshold: consts::DEFAULT_PROF_TAX_THRESHOLD,
            prof_tax_amount: consts::DEFAULT_PROF_TAX_AMOUNT,
            min_active_hours: consts::DEFAULT_MIN_ACTIVE_HOURS,
            business_days_only: consts::DEFAULT_BUSINESS_DAYS_ONLY,
        }
    }
}
