use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveValue::Set,
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    TransactionTrait,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    entity::{
        employee, payrun, payslip, prelude::*, salary_configuration,
        sea_orm_active_enums::{PayrunStatus, PayslipStatus},
    },
    error::ApiError,
    payroll::{
        attendance, calculator,
        calculator::PayslipBreakdown,
        salary::{self, SalaryConfig},
        PayrollPolicy,
    },
};

#[derive(Debug, Serialize)]
pub struct ComputeOutcome {
    pub processed_count: usize,
    pub warnings: Vec<String>,
}

fn status_name(status: PayrunStatus) -> &'static str {
    match status {
        PayrunStatus::Draft => "draft",
        PayrunStatus::Computed => "computed",
        PayrunStatus::Done => "done",
        PayrunStatus::Cancelled => "cancelled",
    }
}

/// Creates a draft payrun for (company, month), or returns the existing
/// non-cancelled one unchanged.
pub async fn create_payrun(
    db: &DatabaseConnection,
    company_id: Uuid,
    period_month: NaiveDate,
    actor: Uuid,
) -> Result<payrun::Model, ApiError> {
    let existing = Payrun::find()
        .filter(payrun::Column::CompanyId.eq(company_id))
        .filter(payrun::Column::PeriodMonth.eq(period_month))
        .filter(payrun::Column::Status.ne(PayrunStatus::Cancelled))
        .one(db)
        .await?;

    if let Some(run) = existing {
        return Ok(run);
    }

    let now = Local::now().fixed_offset();
    let model = payrun::ActiveModel {
        created_at: Set(now),
        updated_at: Set(now),
        company_id: Set(company_id),
        period_month: Set(period_month),
        status: Set(PayrunStatus::Draft),
        employees_count: Set(0),
        gross_total: Set(Decimal::ZERO),
        net_total: Set(Decimal::ZERO),
        created_by: Set(Some(actor)),
        ..Default::default()
    };

    let run = Payrun::insert(model).exec_with_returning(db).await?;
    info!(payrun_id = %run.id, month = %period_month, "payrun created");

    Ok(run)
}

async fn find_payrun<C: ConnectionTrait>(
    db: &C,
    company_id: Uuid,
    payrun_id: Uuid,
) -> Result<payrun::Model, ApiError> {
    Payrun::find_by_id(payrun_id)
        .filter(payrun::Column::CompanyId.eq(company_id))
        .one(db)
        .await?
        .ok_or(ApiError::NotFound("payrun"))
}

/// Insert-or-replace keyed on (payrun_id, employee_id) — the idempotency
/// primitive of compute and recompute.
async fn upsert_payslip<C: ConnectionTrait>(
    db: &C,
    payrun_id: Uuid,
    employee_id: Uuid,
    breakdown: &PayslipBreakdown,
) -> Result<(), ApiError> {
    let now = Local::now().fixed_offset();

    let components = serde_json::to_value(breakdown)
        .map_err(|err| DbErr::Custom(err.to_string()))?;

    let model = payslip::ActiveModel {
        created_at: Set(now),
        updated_at: Set(now),
        payrun_id: Set(payrun_id),
        employee_id: Set(employee_id),
        components: Set(components),
        gross: Set(breakdown.gross),
        pf_employee: Set(breakdown.deductions.pf_employee),
        pf_employer: Set(breakdown.deductions.pf_employer),
        professional_tax: Set(breakdown.deductions.professional_tax),
        net: Set(breakdown.net),
        status: Set(PayslipStatus::Computed),
        ..Default::default()
    };

    Payslip::insert(model)
        .on_conflict(
            OnConflict::columns([payslip::Column::PayrunId, payslip::Column::EmployeeId])
                .update_columns([
                    payslip::Column::UpdatedAt,
                    payslip::Column::Components,
                    payslip::Column::Gross,
                    payslip::Column::PfEmployee,
                    payslip::Column::PfEmployer,
                    payslip::Column::ProfessionalTax,
                    payslip::Column::Net,
                    payslip::Column::Status,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(())
}

/// Computes (or recomputes) every payslip of the payrun inside one
/// transaction.
///
/// Fail-fast on any invalid basic salary: the transaction rolls back and no
/// payslip of the batch survives. Missing attendance only produces a warning
/// and skips that employee. The final status transition is guarded by
/// `WHERE status = <observed>`, so a concurrent transition aborts the commit.
pub async fn compute_payslips(
    db: &DatabaseConnection,
    policy: &PayrollPolicy,
    company_id: Uuid,
    payrun_id: Uuid,
) -> Result<(payrun::Model, ComputeOutcome), ApiError> {
    let txn = db.begin().await?;

    let run = find_payrun(&txn, company_id, payrun_id).await?;

    if !matches!(run.status, PayrunStatus::Draft | PayrunStatus::Computed) {
        return Err(ApiError::InvalidStatus {
            expected: "draft or computed",
            actual: status_name(run.status),
        });
    }

    let employee_ids: Vec<Uuid> = Employee::find()
        .filter(employee::Column::CompanyId.eq(company_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|e| e.id)
        .collect();

    let configs = SalaryConfiguration::find()
        .filter(salary_configuration::Column::EmployeeId.is_in(employee_ids))
        .all(&txn)
        .await?;

    if configs.is_empty() {
        return Err(ApiError::NoEmployees);
    }

    let summaries = attendance::summaries_for_employees(
        &txn,
        configs.iter().map(|c| c.employee_id).collect(),
        run.period_month,
        policy,
    )
    .await?;

    let mut warnings = Vec::new();
    let mut processed_count = 0usize;
    let mut gross_total = Decimal::ZERO;
    let mut net_total = Decimal::ZERO;

    for config in &configs {
        let employee_id = config.employee_id;

        let resolved = SalaryConfig::from_model(config)
            .and_then(|config| salary::resolve(&config))
            .map_err(|_| ApiError::InvalidSalary { employee_id })?;

        let Some(summary) = summaries.get(&employee_id) else {
            warnings.push(format!(
                "no attendance data for employee {employee_id} in {}",
                run.period_month.format("%Y-%m"),
            ));
            continue;
        };

        let breakdown = calculator::compute_one(employee_id, &resolved, summary, policy);

        gross_total += breakdown.gross;
        net_total += breakdown.net;

        upsert_payslip(&txn, run.id, employee_id, &breakdown).await?;
        processed_count += 1;
    }

    let now = Local::now().fixed_offset();

    let res = Payrun::update_many()
        .col_expr(payrun::Column::Status, Expr::value(PayrunStatus::Computed))
        .col_expr(payrun::Column::EmployeesCount, Expr::value(processed_count as i32))
        .col_expr(payrun::Column::GrossTotal, Expr::value(gross_total))
        .col_expr(payrun::Column::NetTotal, Expr::value(net_total))
        .col_expr(payrun::Column::UpdatedAt, Expr::value(now))
        .filter(payrun::Column::Id.eq(run.id))
        .filter(payrun::Column::Status.eq(run.status))
        .exec(&txn)
        .await?;

    if res.rows_affected == 0 {
        return Err(ApiError::InvalidStatus {
            expected: status_name(run.status),
            actual: "changed concurrently",
        });
    }

    txn.commit().await?;

    info!(payrun_id = %run.id, processed_count, %gross_total, %net_total, "payrun computed");

    Ok((
        payrun::Model {
            status: PayrunStatus::Computed,
            employees_count: processed_count as i32,
            gross_total,
            net_total,
            updated_at: now,
            ..run
        },
        ComputeOutcome { processed_count, warnings },
    ))
}

/// computed -> done. Terminal: a validated payrun can never be recomputed
/// or cancelled. Cascades every child payslip to done.
pub async fn validate_payrun(
    db: &DatabaseConnection,
    company_id: Uuid,
    payrun_id: Uuid,
    validator: Uuid,
) -> Result<payrun::Model, ApiError> {
    let txn = db.begin().await?;

    let run = find_payrun(&txn, company_id, payrun_id).await?;

    if run.status != PayrunStatus::Computed {
        return Err(ApiError::InvalidStatus {
            expected: "computed",
            actual: status_name(run.status),
        });
    }

    let now = Local::now().fixed_offset();

    let res = Payrun::update_many()
        .col_expr(payrun::Column::Status, Expr::value(PayrunStatus::Done))
        .col_expr(payrun::Column::ValidatedBy, Expr::value(validator))
        .col_expr(payrun::Column::ValidatedAt, Expr::value(now))
        .col_expr(payrun::Column::UpdatedAt, Expr::value(now))
        .filter(payrun::Column::Id.eq(run.id))
        .filter(payrun::Column::Status.eq(PayrunStatus::Computed))
        .exec(&txn)
        .await?;

    if res.rows_affected == 0 {
        return Err(ApiError::InvalidStatus {
            expected: "computed",
            actual: "changed concurrently",
        });
    }

    Payslip::update_many()
        .col_expr(payslip::Column::Status, Expr::value(PayslipStatus::Done))
        .col_expr(payslip::Column::UpdatedAt, Expr::value(now))
        .filter(payslip::Column::PayrunId.eq(run.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    info!(payrun_id = %run.id, %validator, "payrun validated");

    Ok(payrun::Model {
        status: PayrunStatus::Done,
        validated_by: Some(validator),
        validated_at: Some(now),
        updated_at: now,
        ..run
    })
}

/// draft|computed -> cancelled. Terminal. Cascades every child payslip.
pub async fn cancel_payrun(
    db: &DatabaseConnection,
    company_id: Uuid,
    payrun_id: Uuid,
) -> Result<payrun::Model, ApiError> {
    let txn = db.begin().await?;

    let run = find_payrun(&txn, company_id, payrun_id).await?;

    if !matches!(run.status, PayrunStatus::Draft | PayrunStatus::Computed) {
        return Err(ApiError::InvalidStatus {
            expected: "draft or computed",
            actual: status_name(run.status),
        });
    }

    let now = Local::now().fixed_offset();

    let res = Payrun::update_many()
        .col_expr(payrun::Column::Status, Expr::value(PayrunStatus::Cancelled))
        .col_expr(payrun::Column::UpdatedAt, Expr::value(now))
        .filter(payrun::Column::Id.eq(run.id))
        .filter(payrun::Column::Status.is_in([PayrunStatus::Draft, PayrunStatus::Computed]))
        .exec(&txn)
        .await?;

    if res.rows_affected == 0 {
        return Err(ApiError::InvalidStatus {
            expected: "draft or computed",
            actual: "changed concurrently",
        });
    }

    Payslip::update_many()
        .col_expr(payslip::Column::Status, Expr::value(PayslipStatus::Cancelled))
        .col_expr(payslip::Column::UpdatedAt, Expr::value(now))
        .filter(payslip::Column::PayrunId.eq(run.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    info!(payrun_id = %run.id, "payrun cancelled");

    Ok(payrun::Model {
        status: PayrunStatus::Cancelled,
        updated_at: now,
        ..run
    })
}

/// Re-runs the calculator for one payslip against current salary and
/// attendance, then re-aggregates the payrun totals from its payslip rows in
/// the same transaction so totals never drift from their sum.
pub async fn recompute_payslip(
    db: &DatabaseConnection,
    policy: &PayrollPolicy,
    company_id: Uuid,
    payslip_id: Uuid,
) -> Result<payslip::Model, ApiError> {
    let txn = db.begin().await?;

    let slip = Payslip::find_by_id(payslip_id)
        .one(&txn)
        .await?
        .ok_or(ApiError::NotFound("payslip"))?;

    let run = find_payrun(&txn, company_id, slip.payrun_id).await?;

    if !matches!(run.status, PayrunStatus::Draft | PayrunStatus::Computed) {
        return Err(ApiError::InvalidStatus {
            expected: "draft or computed",
            actual: status_name(run.status),
        });
    }

    let employee_id = slip.employee_id;

    let config = SalaryConfiguration::find()
        .filter(salary_configuration::Column::EmployeeId.eq(employee_id))
        .one(&txn)
        .await?
        .ok_or(ApiError::InvalidSalary { employee_id })?;

    let resolved = SalaryConfig::from_model(&config)
        .and_then(|config| salary::resolve(&config))
        .map_err(|_| ApiError::InvalidSalary { employee_id })?;

    let summaries =
        attendance::summaries_for_employees(&txn, vec![employee_id], run.period_month, policy).await?;
    let summary = summaries
        .get(&employee_id)
        .ok_or(ApiError::NotFound("attendance data"))?;

    let breakdown = calculator::compute_one(employee_id, &resolved, summary, policy);

    upsert_payslip(&txn, run.id, employee_id, &breakdown).await?;

    let slips = Payslip::find()
        .filter(payslip::Column::PayrunId.eq(run.id))
        .all(&txn)
        .await?;

    let gross_total: Decimal = slips.iter().map(|s| s.gross).sum();
    let net_total: Decimal = slips.iter().map(|s| s.net).sum();
    let now = Local::now().fixed_offset();

    let res = Payrun::update_many()
        .col_expr(payrun::Column::EmployeesCount, Expr::value(slips.len() as i32))
        .col_expr(payrun::Column::GrossTotal, Expr::value(gross_total))
        .col_expr(payrun::Column::NetTotal, Expr::value(net_total))
        .col_expr(payrun::Column::UpdatedAt, Expr::value(now))
        .filter(payrun::Column::Id.eq(run.id))
        .filter(payrun::Column::Status.eq(run.status))
        .exec(&txn)
        .await?;

    if res.rows_affected == 0 {
        return Err(ApiError::InvalidStatus {
            expected: status_name(run.status),
            actual: "changed concurrently",
        });
    }

    let refreshed = slips
        .into_iter()
        .find(|s| s.employee_id == employee_id)
        .ok_or(ApiError::NotFound("payslip"))?;

    txn.commit().await?;

    info!(payslip_id = %refreshed.id, payrun_id = %run.id, "payslip recomputed");

    Ok(refreshed)
}
