pub use super::company::Entity as Company;
pub use super::employee::Entity as Employee;
pub use super::leave_request::Entity as LeaveRequest;
pub use super::payrun::Entity as Payrun;
pub use super::payslip::Entity as Payslip;
pub use super::salary_configuration::Entity as SalaryConfiguration;
pub use super::time_log::Entity as TimeLog;
