pub mod prelude;

pub mod company;
pub mod employee;
pub mod leave_request;
pub mod payrun;
pub mod payslip;
pub mod salary_configuration;
pub mod sea_orm_active_enums;
pub mod time_log;
