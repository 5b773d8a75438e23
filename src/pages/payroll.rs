use actix_web::{get, post, web, Responder};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::PayrollOfficer,
    entity::{payrun, payslip, prelude::*},
    error::ApiError,
    payroll::{run, PayrollPolicy},
    utils,
};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(create_run)
        .service(get_run)
        .service(compute_run)
        .service(validate_run)
        .service(cancel_run)
        .service(list_payslips)
        .service(recompute_payslip);
}

#[derive(Debug, Deserialize)]
struct CreatePayrun {
    /// `YYYY-MM`
    month: String,
}

#[derive(Debug, Serialize)]
struct ComputeResponse {
    payrun: payrun::Model,
    processed_count: usize,
    warnings: Vec<String>,
}

#[post("/runs")]
async fn create_run(
    db: web::Data<DatabaseConnection>,
    officer: PayrollOfficer,
    payload: web::Json<CreatePayrun>,
) -> Result<impl Responder, ApiError> {
    let month = utils::parse_month(&payload.month)
        .ok_or_else(|| ApiError::BadRequest("`month` must be formatted as YYYY-MM".to_string()))?;

    let payrun = run::create_payrun(db.as_ref(), officer.company_id, month, officer.id).await?;

    Ok(web::Json(payrun))
}

#[get("/runs/{payrun_id}")]
async fn get_run(
    db: web::Data<DatabaseConnection>,
    officer: PayrollOfficer,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let payrun = Payrun::find_by_id(path.into_inner())
        .filter(payrun::Column::CompanyId.eq(officer.company_id))
        .one(db.as_ref()).await?
        .ok_or(ApiError::NotFound("payrun"))?;

    Ok(web::Json(payrun))
}

#[post("/runs/{payrun_id}/compute")]
async fn compute_run(
    db: web::Data<DatabaseConnection>,
    policy: web::Data<PayrollPolicy>,
    officer: PayrollOfficer,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let (payrun, outcome) =
        run::compute_payslips(db.as_ref(), &policy, officer.company_id, path.into_inner()).await?;

    Ok(web::Json(ComputeResponse {
        payrun,
        processed_count: outcome.processed_count,
        warnings: outcome.warnings,
    }))
}

#[post("/runs/{payrun_id}/validate")]
async fn validate_run(
    db: web::Data<DatabaseConnection>,
    officer: PayrollOfficer,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let payrun = run::validate_payrun(db.as_ref(), officer.company_id, path.into_inner(), officer.id).await?;

    Ok(web::Json(payrun))
}

#[post("/runs/{payrun_id}/cancel")]
async fn cancel_run(
    db: web::Data<DatabaseConnection>,
    officer: PayrollOfficer,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let payrun = run::cancel_payrun(db.as_ref(), officer.company_id, path.into_inner()).await?;

    Ok(web::Json(payrun))
}

#[get("/runs/{payrun_id}/payslips")]
async fn list_payslips(
    db: web::Data<DatabaseConnection>,
    officer: PayrollOfficer,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let payrun = Payrun::find_by_id(path.into_inner())
        .filter(payrun::Column::CompanyId.eq(officer.company_id))
        .one(db.as_ref()).await?
        .ok_or(ApiError::NotFound("payrun"))?;

    let payslips = Payslip::find()
        .filter(payslip::Column::PayrunId.eq(payrun.id))
        .order_by_asc(payslip::Column::EmployeeId)
        .all(db.as_ref()).await?;

    Ok(web::Json(payslips))
}

#[post("/payslips/{payslip_id}/recompute")]
async fn recompute_payslip(
    db: web::Data<DatabaseConnection>,
    policy: web::Data<PayrollPolicy>,
    officer: PayrollOfficer,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let payslip = run::recompute_payslip(db.as_ref(), &policy, officer.company_id, path.into_inner()).await?;

    Ok(web::Json(payslip))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::{Method, StatusCode}, test, App};
    use chrono::Local;
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use crate::{auth::Authority, entity::{employee, sea_orm_active_enums::{PayrunStatus, RoleType}}};

    use super::*;

    fn officer_model(company_id: Uuid) -> employee::Model {
        employee::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            company_id,
            username: "payroll".to_string(),
            password: Vec::new(),
            role: RoleType::Payroll,
        }
    }

    #[actix_web::test]
    async fn test_create_run_is_idempotent() {
        let secret = b"secret";
        let company_id = Uuid::new_v4();
        let officer = officer_model(company_id);

        let existing = payrun::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            company_id,
            period_month: chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            status: PayrunStatus::Draft,
            employees_count: 0,
            gross_total: Decimal::ZERO,
            net_total: Decimal::ZERO,
            created_by: Some(officer.id),
            validated_by: None,
            validated_at: None,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(create_run)
        ).await;

        let token = Authority::new(secret).issue_for(&officer);

        let req = test::TestRequest::default()
            .uri("/runs")
            .method(Method::POST)
            .insert_header(("Authorization", format!("JWT {token}")))
            .set_json(serde_json::json!({ "month": "2024-06" }))
            .to_request();

        let returned: payrun::Model = test::call_and_read_body_json(&app, req).await;
        assert_eq!(returned, existing);
    }

    #[actix_web::test]
    async fn test_create_run_rejects_malformed_month() {
        let secret = b"secret";
        let officer = officer_model(Uuid::new_v4());

        let db = MockDatabase::new(DatabaseBackend::Postgres);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(create_run)
        ).await;

        let token = Authority::new(secret).issue_for(&officer);

        let req = test::TestRequest::default()
            .uri("/runs")
            .method(Method::POST)
            .insert_header(("Authorization", format!("JWT {token}")))
            .set_json(serde_json::json!({ "month": "June 2024" }))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_plain_employee_cannot_drive_payruns() {
        let secret = b"secret";
        let mut worker = officer_model(Uuid::new_v4());
        worker.role = RoleType::Employee;

        let db = MockDatabase::new(DatabaseBackend::Postgres);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(create_run)
        ).await;

        let token = Authority::new(secret).issue_for(&worker);

        let req = test::TestRequest::default()
            .uri("/runs")
            .method(Method::POST)
            .insert_header(("Authorization", format!("JWT {token}")))
            .set_json(serde_json::json!({ "month": "2024-06" }))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
