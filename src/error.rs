use actix_web::{body, http::StatusCode, HttpResponse};
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Application error surfaced to callers with a stable code.
///
/// Precondition violations roll back the whole operation; per-employee
/// data-quality issues are returned as warnings instead (see `payroll::run`).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("operation requires payrun status `{expected}`, current status is `{actual}`")]
    InvalidStatus { expected: &'static str, actual: &'static str },
    #[error("employee {employee_id} has a missing or non-positive basic salary")]
    InvalidSalary { employee_id: Uuid },
    #[error("no employee has a salary configuration")]
    NoEmployees,
    #[error("{0}")]
    BadRequest(String),
    #[error("database error")]
    Db(#[from] DbErr),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InvalidStatus { .. } => "INVALID_STATUS",
            ApiError::InvalidSalary { .. } => "INVALID_SALARY",
            ApiError::NoEmployees => "NO_EMPLOYEES",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Db(_) => "INTERNAL",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
}

impl actix_web::error::ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse<body::BoxBody> {
        if let ApiError::Db(err) = self {
            tracing::error!(%err, "database error");
        }

        HttpResponse::build(self.status_code())
            .json(ErrorBody {
                code: self.code(),
                message: self.to_string(),
            })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidStatus { .. } => StatusCode::CONFLICT,
            ApiError::InvalidSalary { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NoEmployees => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::error::ResponseError as _;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::NotFound("payrun").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InvalidStatus { expected: "computed", actual: "draft" }.status_code(),
            StatusCode::CONFLICT,
        );
        assert_eq!(
            ApiError::InvalidSalary { employee_id: Uuid::new_v4() }.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY,
        );
        assert_eq!(ApiError::NoEmployees.code(), "NO_EMPLOYEES");
    }
}
