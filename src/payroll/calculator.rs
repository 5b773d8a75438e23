use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::payroll::{attendance::MonthPayableSummary, salary::ResolvedSalary, PayrollPolicy};

/// Full computation record stored on the payslip `components` column and
/// returned by the API. Strongly typed, serialized only at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayslipBreakdown {
    pub basic: Decimal,
    pub allowances: Vec<AllowanceLine>,
    pub monthly_wage: Decimal,
    pub total_working_days: u32,
    pub present_days: u32,
    pub paid_leave_days: u32,
    pub payable_days: u32,
    pub daily_rate: Decimal,
    pub attendance_days_amount: Decimal,
    pub paid_leave_days_amount: Decimal,
    pub gross: Decimal,
    pub deductions: Deductions,
    pub net: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowanceLine {
    pub name: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deductions {
    pub pf_employee: Decimal,
    pub pf_employer: Decimal,
    pub professional_tax: Decimal,
}

fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Combines resolved salary and the month summary into one payslip.
///
/// Wages and deductions are both prorated through the daily rate, so partial
/// months (new joiners, unpaid leave) scale linearly. Unpaid-leave days are
/// in neither `present_days` nor `paid_leave_days` and therefore earn
/// nothing. Intermediate values keep full precision; only the stored fields
/// are rounded to cents.
pub fn compute_one(
    employee_id: Uuid,
    salary: &ResolvedSalary,
    summary: &MonthPayableSummary,
    policy: &PayrollPolicy,
) -> PayslipBreakdown {
    let working_days = Decimal::from(summary.total_working_days);

    let daily_rate = if summary.total_working_days > 0 {
        salary.monthly_wage / working_days
    } else {
        Decimal::ZERO
    };

    let attendance_days_amount = daily_rate * Decimal::from(summary.present_days);
    let paid_leave_days_amount = daily_rate * Decimal::from(summary.paid_leave_days);
    let gross = attendance_days_amount + paid_leave_days_amount;

    let prorated_basic = if summary.total_working_days > 0 {
        salary.basic / working_days * Decimal::from(summary.payable_days)
    } else {
        Decimal::ZERO
    };

    let pf_employee = prorated_basic * policy.pf_rate;
    let pf_employer = prorated_basic * policy.pf_rate;

    let professional_tax = if gross >= policy.prof_tax_threshold {
        policy.prof_tax_amount
    } else {
        Decimal::ZERO
    };

    let mut net = gross - pf_employee - professional_tax;
    if net < Decimal::ZERO {
        // Deductions exceeding gross are clamped, the payrun still completes
        warn!(%employee_id, %gross, %net, "negative net pay clamped to zero");
        net = Decimal::ZERO;
    }

    PayslipBreakdown {
        basic: round2(salary.basic),
        allowances: salary
            .allowances
            .iter()
            .map(|(name, amount)| AllowanceLine { name: name.clone(), amount: round2(*amount) })
            .collect(),
        monthly_wage: round2(salary.monthly_wage),
        total_working_days: summary.total_working_days,
        present_days: summary.present_days,
        paid_leave_days: summary.paid_leave_days,
        payable_days: summary.payable_days,
        daily_rate: round2(daily_rate),
        attendance_days_amount: round2(attendance_days_amount),
        paid_leave_days_amount: round2(paid_leave_days_amount),
        gross: round2(gross),
        deductions: Deductions {
            pf_employee: round2(pf_employee),
            pf_employer: round2(pf_employer),
            professional_tax,
        },
        net: round2(net),
    }
}
