use actix_web::{delete, put, web, HttpResponse, Responder};
use chrono::Local;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::OnConflict, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::PayrollOfficer,
    entity::{employee, prelude::*, salary_configuration},
    error::ApiError,
    payroll::salary::{self, NamedComponent, SalaryConfig},
};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(save_salary_config)
        .service(delete_salary_config);
}

/// Either shape: static (`basic` + `allowances`) or formula-driven
/// (`wage` + `components`).
#[derive(Debug, Deserialize)]
struct SaveSalaryConfig {
    basic: Option<Decimal>,
    allowances: Option<serde_json::Value>,
    wage: Option<Decimal>,
    components: Option<Vec<NamedComponent>>,
}

#[put("/{employee_id}/salary")]
async fn save_salary_config(
    db: web::Data<DatabaseConnection>,
    officer: PayrollOfficer,
    path: web::Path<Uuid>,
    payload: web::Json<SaveSalaryConfig>,
) -> Result<impl Responder, ApiError> {
    let target = Employee::find_by_id(path.into_inner())
        .filter(employee::Column::CompanyId.eq(officer.company_id))
        .one(db.as_ref()).await?
        .ok_or(ApiError::NotFound("employee"))?;

    let payload = payload.into_inner();

    match (&payload.wage, &payload.components) {
        (Some(wage), Some(components)) => {
            // A configuration that cannot resolve now would poison every
            // subsequent compute for the company, so resolve it up front
            let candidate = SalaryConfig::Formula {
                wage: *wage,
                components: components.clone(),
            };

            salary::resolve(&candidate)
                .map_err(|err| ApiError::BadRequest(err.to_string()))?;
        }
        (None, None) => {
            let basic = payload.basic
                .ok_or_else(|| ApiError::BadRequest("`basic` is required".to_string()))?;

            if basic <= Decimal::ZERO {
                return Err(ApiError::BadRequest("`basic` must be positive".to_string()));
            }

            if let Some(allowances) = &payload.allowances {
                if !allowances.is_object() {
                    return Err(ApiError::BadRequest("`allowances` must be an object".to_string()));
                }
            }
        }
        _ => {
            return Err(ApiError::BadRequest(
                "`wage` and `components` must be provided together".to_string(),
            ));
        }
    }

    let components = payload.components
        .map(|components| serde_json::to_value(components).map_err(|err| DbErr::Custom(err.to_string())))
        .transpose()?;

    let now = Local::now().fixed_offset();
    let model = salary_configuration::ActiveModel {
        created_at: Set(now),
        updated_at: Set(now),
        employee_id: Set(target.id),
        basic: Set(payload.basic),
        allowances: Set(payload.allowances),
        wage: Set(payload.wage),
        components: Set(components),
        created_by: Set(Some(officer.id)),
        updated_by: Set(Some(officer.id)),
        ..Default::default()
    };

    // Latest version replaces the previous one
    let config = SalaryConfiguration::insert(model)
        .on_conflict(
            OnConflict::column(salary_configuration::Column::EmployeeId)
                .update_columns([
                    salary_configuration::Column::UpdatedAt,
                    salary_configuration::Column::Basic,
                    salary_configuration::Column::Allowances,
                    salary_configuration::Column::Wage,
                    salary_configuration::Column::Components,
                    salary_configuration::Column::UpdatedBy,
                ])
                .to_owned(),
        )
        .exec_with_returning(db.as_ref()).await?;

    Ok(web::Json(config))
}

#[delete("/{employee_id}/salary")]
async fn delete_salary_config(
    db: web::Data<DatabaseConnection>,
    officer: PayrollOfficer,
    path: web::Path<Uuid>,
) -> Result<impl Responder, ApiError> {
    let target = Employee::find_by_id(path.into_inner())
        .filter(employee::Column::CompanyId.eq(officer.company_id))
        .one(db.as_ref()).await?
        .ok_or(ApiError::NotFound("employee"))?;

    let res = SalaryConfiguration::delete_many()
        .filter(salary_configuration::Column::EmployeeId.eq(target.id))
        .exec(db.as_ref()).await?;

    if res.rows_affected == 0 {
        return Err(ApiError::NotFound("salary configuration"));
    }

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::{http::{Method, StatusCode}, test, App};
    use chrono::Local;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use crate::{auth::Authority, entity::sea_orm_active_enums::RoleType};

    use super::*;

    fn employee_model(company_id: Uuid, role: RoleType) -> employee::Model {
        employee::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            updated_at: Local::now().into(),
            company_id,
            username: Uuid::new_v4().to_string(),
            password: Vec::new(),
            role,
        }
    }

    #[actix_web::test]
    async fn test_save_rejects_formula_that_cannot_resolve() {
        let secret = b"secret";
        let company_id = Uuid::new_v4();
        let officer = employee_model(company_id, RoleType::Payroll);
        let target = employee_model(company_id, RoleType::Employee);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![target.clone()], vec![target.clone()]]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(save_salary_config)
        ).await;

        let token = Authority::new(secret).issue_for(&officer);

        // Zero basic resolves to InvalidBasic and must never reach storage
        let zero_basic_req = test::TestRequest::default()
            .uri(&format!("/{}/salary", target.id))
            .method(Method::PUT)
            .insert_header(("Authorization", format!("JWT {token}")))
            .set_json(serde_json::json!({
                "wage": 10000,
                "components": [{ "name": "basic", "kind": "fixed_amount", "value": 0 }],
            }))
            .to_request();

        let response = test::call_service(&app, zero_basic_req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Percent-of-wage basic against a zero wage is just as unresolvable
        let zero_wage_req = test::TestRequest::default()
            .uri(&format!("/{}/salary", target.id))
            .method(Method::PUT)
            .insert_header(("Authorization", format!("JWT {token}")))
            .set_json(serde_json::json!({
                "wage": 0,
                "components": [{ "name": "basic", "kind": "percent_of_wage", "value": 40 }],
            }))
            .to_request();

        let response = test::call_service(&app, zero_wage_req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
