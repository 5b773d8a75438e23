use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::{Datelike, Local, Weekday};
use sea_orm::{ActiveValue::{Set, Unchanged}, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;

use crate::{
    auth::PayrollOfficer,
    entity::{employee, prelude::*, time_log},
    error::ApiError,
    payroll::{attendance, PayrollPolicy},
    utils,
};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(clock_in)
        .service(clock_out)
        .service(attendance_me)
        .service(payable_summary);
}

#[derive(Debug, Deserialize)]
struct MonthQuery {
    year: i32,
    month: u32,
}

impl MonthQuery {
    fn first_of_month(&self) -> Result<chrono::NaiveDate, ApiError> {
        utils::first_of_month(self.year, self.month)
            .ok_or_else(|| ApiError::BadRequest("invalid `year`/`month`".to_string()))
    }
}

#[post("/clock-in")]
async fn clock_in(db: web::Data<DatabaseConnection>, employee: employee::Model) -> Result<HttpResponse, ApiError> {
    let now = Local::now().fixed_offset();

    if let Weekday::Sat | Weekday::Sun = now.weekday() {
        return Err(ApiError::BadRequest("cannot clock in on weekend".to_string()));
    }

    let (start_of_day, end_of_day) = utils::get_today_range(&now);

    let open_log = TimeLog::find()
        .filter(time_log::Column::EmployeeId.eq(employee.id))
        .filter(time_log::Column::StartedAt.between(start_of_day, end_of_day))
        .filter(time_log::Column::EndedAt.is_null())
        .one(db.as_ref()).await?;

    if let Some(open_log) = open_log {
        return Ok(HttpResponse::Ok().json(web::Json(open_log)));
    }

    let model = time_log::ActiveModel {
        created_at: Set(now),
        updated_at: Set(now),
        employee_id: Set(employee.id),
        started_at: Set(now),
        ..Default::default()
    };

    let log = TimeLog::insert(model)
        .exec_with_returning(db.as_ref()).await?;

    Ok(HttpResponse::Created().json(web::Json(log)))
}

#[post("/clock-out")]
async fn clock_out(db: web::Data<DatabaseConnection>, employee: employee::Model) -> Result<impl Responder, ApiError> {
    let now = Local::now().fixed_offset();

    let (start_of_day, end_of_day) = utils::get_today_range(&now);

    let Some(open_log) = TimeLog::find()
        .filter(time_log::Column::EmployeeId.eq(employee.id))
        .filter(time_log::Column::StartedAt.between(start_of_day, end_of_day))
        .filter(time_log::Column::EndedAt.is_null())
        .one(db.as_ref()).await?
    else {
        return Err(ApiError::BadRequest("you have not clocked in today".to_string()));
    };

    let log = TimeLog::update(time_log::ActiveModel {
        id: Unchanged(open_log.id),
        updated_at: Set(now),
        ended_at: Set(Some(now)),
        ..Default::default()
    }).exec(db.as_ref()).await?;

    Ok(web::Json(log))
}

#[get("/me")]
async fn attendance_me(
    db: web::Data<DatabaseConnection>,
    policy: web::Data<PayrollPolicy>,
    employee: employee::Model,
    query: web::Query<MonthQuery>,
) -> Result<impl Responder, ApiError> {
    let first = query.first_of_month()?;

    let me = attendance::attendance_me(db.as_ref(), employee.id, first, &policy).await?;

    Ok(web::Json(me))
}

#[get("/summary")]
async fn payable_summary(
    db: web::Data<DatabaseConnection>,
    policy: web::Data<PayrollPolicy>,
    officer: PayrollOfficer,
    query: web::Query<MonthQuery>,
) -> Result<impl Responder, ApiError> {
    let first = query.first_of_month()?;

    let summaries = attendance::payable_summaries(db.as_ref(), officer.company_id, first, &policy).await?;

    Ok(web::Json(summaries))
}
