use sea_orm_migration::{prelude::{extension::postgres::TypeDropStatement, *}, sea_orm::{ActiveEnum, DbBackend, DeriveActiveEnum, EnumIter, Schema}};

use crate::{setup_audit_fk, util::{default_audited_table_statement, default_table_statement, DefaultColumn}};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(DbBackend::Postgres);

        manager
            .create_type(
                schema.create_enum_from_active_enum::<RoleType>()
            ).await.unwrap();

        manager
            .create_type(
                schema.create_enum_from_active_enum::<PayrunStatus>()
            ).await.unwrap();

        manager
            .create_type(
                schema.create_enum_from_active_enum::<PayslipStatus>()
            ).await.unwrap();

        manager
            .create_type(
                schema.create_enum_from_active_enum::<LeaveType>()
            ).await.unwrap();

        manager
            .create_type(
                schema.create_enum_from_active_enum::<LeaveStatus>()
            ).await.unwrap();

        manager
            .create_table(default_table_statement()
                .table(Company::Table)
                .col(ColumnDef::new(Company::Name)
                    .text()
                    .unique_key()
                    .not_null())
                .take()
            ).await.unwrap();

        manager
            .create_table(default_table_statement()
                .table(Employee::Table)
                .col(ColumnDef::new(Employee::CompanyId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(Employee::Username)
                    .text()
                    .unique_key()
                    .not_null())
                .col(ColumnDef::new(Employee::Password)
                    .binary()
                    .not_null()) // Password should be in a hashed format
                .col(ColumnDef::new(Employee::Role)
                    .custom(RoleType::name())
                    .not_null())
                .take()
            ).await.unwrap();

        manager.create_foreign_key(ForeignKeyCreateStatement::new()
            .from(Employee::Table, Employee::CompanyId)
            .to(Company::Table, DefaultColumn::Id)
            .take()
        ).await.unwrap();

        manager
            .create_table(default_audited_table_statement()
                .table(SalaryConfiguration::Table)
                .col(ColumnDef::new(SalaryConfiguration::EmployeeId)
                    .uuid()
                    .unique_key()
                    .not_null())
                .col(ColumnDef::new(SalaryConfiguration::Basic)
                    .decimal_len(14, 2))
                .col(ColumnDef::new(SalaryConfiguration::Allowances)
                    .json_binary())
                .col(ColumnDef::new(SalaryConfiguration::Wage)
                    .decimal_len(14, 2))
                .col(ColumnDef::new(SalaryConfiguration::Components)
                    .json_binary())
                .take()
            ).await.unwrap();
        setup_audit_fk!(manager, SalaryConfiguration::Table);

        manager.create_foreign_key(ForeignKeyCreateStatement::new()
            .from(SalaryConfiguration::Table, SalaryConfiguration::EmployeeId)
            .to(Employee::Table, DefaultColumn::Id)
            .take()
        ).await.unwrap();

        manager
            .create_table(default_table_statement()
                .table(TimeLog::Table)
                .col(ColumnDef::new(TimeLog::EmployeeId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(TimeLog::StartedAt)
                    .timestamp_with_time_zone()
                    .not_null())
                .col(ColumnDef::new(TimeLog::EndedAt)
                    .timestamp_with_time_zone())
                .take()
            ).await.unwrap();

        manager.create_foreign_key(ForeignKeyCreateStatement::new()
            .from(TimeLog::Table, TimeLog::EmployeeId)
            .to(Employee::Table, DefaultColumn::Id)
            .take()
        ).await.unwrap();

        manager
            .create_table(default_table_statement()
                .table(LeaveRequest::Table)
                .col(ColumnDef::new(LeaveRequest::EmployeeId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(LeaveRequest::LeaveType)
                    .custom(LeaveType::name())
                    .not_null())
                .col(ColumnDef::new(LeaveRequest::Status)
                    .custom(LeaveStatus::name())
                    .not_null()
                    .default("pending"))
                .col(ColumnDef::new(LeaveRequest::StartDate)
                    .date()
                    .not_null())
                .col(ColumnDef::new(LeaveRequest::EndDate)
                    .date()
                    .not_null())
                .col(ColumnDef::new(LeaveRequest::ApprovedBy)
                    .uuid())
                .take()
            ).await.unwrap();

        manager.create_foreign_key(ForeignKeyCreateStatement::new()
            .from(LeaveRequest::Table, LeaveRequest::EmployeeId)
            .to(Employee::Table, DefaultColumn::Id)
            .take()
        ).await.unwrap();

        manager.create_foreign_key(ForeignKeyCreateStatement::new()
            .from(LeaveRequest::Table, LeaveRequest::ApprovedBy)
            .to(Employee::Table, DefaultColumn::Id)
            .on_delete(ForeignKeyAction::SetNull)
            .take()
        ).await.unwrap();

        // At most one non-cancelled payrun per (company, month) is enforced
        // by lookup-before-create, not by a constraint here
        manager
            .create_table(default_table_statement()
                .table(Payrun::Table)
                .col(ColumnDef::new(Payrun::CompanyId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(Payrun::PeriodMonth)
                    .date()
                    .not_null())
                .col(ColumnDef::new(Payrun::Status)
                    .custom(PayrunStatus::name())
                    .not_null()
                    .default("draft"))
                .col(ColumnDef::new(Payrun::EmployeesCount)
                    .integer()
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(Payrun::GrossTotal)
                    .decimal_len(14, 2)
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(Payrun::NetTotal)
                    .decimal_len(14, 2)
                    .not_null()
                    .default(0))
                .col(ColumnDef::new(Payrun::CreatedBy)
                    .uuid())
                .col(ColumnDef::new(Payrun::ValidatedBy)
                    .uuid())
                .col(ColumnDef::new(Payrun::ValidatedAt)
                    .timestamp_with_time_zone())
                .take()
            ).await.unwrap();

        manager.create_foreign_key(ForeignKeyCreateStatement::new()
            .from(Payrun::Table, Payrun::CompanyId)
            .to(Company::Table, DefaultColumn::Id)
            .take()
        ).await.unwrap();

        manager.create_foreign_key(ForeignKeyCreateStatement::new()
            .from(Payrun::Table, Payrun::CreatedBy)
            .to(Employee::Table, DefaultColumn::Id)
            .on_delete(ForeignKeyAction::SetNull)
            .take()
        ).await.unwrap();

        manager.create_foreign_key(ForeignKeyCreateStatement::new()
            .from(Payrun::Table, Payrun::ValidatedBy)
            .to(Employee::Table, DefaultColumn::Id)
            .on_delete(ForeignKeyAction::SetNull)
            .take()
        ).await.unwrap();

        manager
            .create_table(default_table_statement()
                .table(Payslip::Table)
                .col(ColumnDef::new(Payslip::PayrunId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(Payslip::EmployeeId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(Payslip::Components)
                    .json_binary()
                    .not_null())
                .col(ColumnDef::new(Payslip::Gross)
                    .decimal_len(14, 2)
                    .not_null())
                .col(ColumnDef::new(Payslip::PfEmployee)
                    .decimal_len(14, 2)
                    .not_null())
                .col(ColumnDef::new(Payslip::PfEmployer)
                    .decimal_len(14, 2)
                    .not_null())
                .col(ColumnDef::new(Payslip::ProfessionalTax)
                    .decimal_len(14, 2)
                    .not_null())
                .col(ColumnDef::new(Payslip::Net)
                    .decimal_len(14, 2)
                    .not_null())
                .col(ColumnDef::new(Payslip::Status)
                    .custom(PayslipStatus::name())
                    .not_null()
                    .default("computed"))
                .take()
            ).await.unwrap();

        manager.create_foreign_key(ForeignKeyCreateStatement::new()
            .from(Payslip::Table, Payslip::PayrunId)
            .to(Payrun::Table, DefaultColumn::Id)
            .take()
        ).await.unwrap();

        manager.create_foreign_key(ForeignKeyCreateStatement::new()
            .from(Payslip::Table, Payslip::EmployeeId)
            .to(Employee::Table, DefaultColumn::Id)
            .take()
        ).await.unwrap();

        // Upsert target for idempotent compute/recompute
        manager.create_index(IndexCreateStatement::new()
            .name("idx_payslip_payrun_employee")
            .table(Payslip::Table)
            .col(Payslip::PayrunId)
            .col(Payslip::EmployeeId)
            .unique()
            .take()
        ).await.unwrap();

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(
            TableDropStatement::new()
                .table(Payslip::Table)
                .take()
        ).await.unwrap();

        manager.drop_table(
            TableDropStatement::new()
                .table(Payrun::Table)
                .take()
        ).await.unwrap();

        manager.drop_table(
            TableDropStatement::new()
                .table(LeaveRequest::Table)
                .take()
        ).await.unwrap();

        manager.drop_table(
            TableDropStatement::new()
                .table(TimeLog::Table)
                .take()
        ).await.unwrap();

        manager.drop_table(
            TableDropStatement::new()
                .table(SalaryConfiguration::Table)
                .take()
        ).await.unwrap();

        manager.drop_table(
            TableDropStatement::new()
                .table(Employee::Table)
                .take()
        ).await.unwrap();

        manager.drop_table(
            TableDropStatement::new()
                .table(Company::Table)
                .take()
        ).await.unwrap();

        manager
            .drop_type(
                TypeDropStatement::new()
                    .name(PayslipStatus::name())
                    .to_owned()
            ).await.unwrap();

        manager
            .drop_type(
                TypeDropStatement::new()
                    .name(PayrunStatus::name())
                    .to_owned()
            ).await.unwrap();

        manager
            .drop_type(
                TypeDropStatement::new()
                    .name(LeaveStatus::name())
                    .to_owned()
            ).await.unwrap();

        manager
            .drop_type(
                TypeDropStatement::new()
                    .name(LeaveType::name())
                    .to_owned()
            ).await.unwrap();

        manager
            .drop_type(
                TypeDropStatement::new()
                    .name(RoleType::name())
                    .to_owned()
            ).await.unwrap();

        Ok(())
    }
}

#[derive(Iden)]
pub(crate) enum Company {
    Table,
    Name,
}

#[derive(Iden)]
pub(crate) enum Employee {
    Table,
    CompanyId,
    Username,
    Password,
    Role,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "role_type")]
enum RoleType {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "payroll")]
    Payroll,
    #[sea_orm(string_value = "employee")]
    Employee,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payrun_status")]
enum PayrunStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "computed")]
    Computed,
    #[sea_orm(string_value = "done")]
    Done,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payslip_status")]
enum PayslipStatus {
    #[sea_orm(string_value = "computed")]
    Computed,
    #[sea_orm(string_value = "done")]
    Done,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "leave_type")]
enum LeaveType {
    #[sea_orm(string_value = "casual")]
    Casual,
    #[sea_orm(string_value = "sick")]
    Sick,
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "leave_status")]
enum LeaveStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Iden)]
pub(crate) enum SalaryConfiguration {
    Table,
    EmployeeId,
    Basic,
    Allowances,
    Wage,
    Components,
}

#[derive(Iden)]
enum TimeLog {
    Table,
    EmployeeId,
    StartedAt,
    EndedAt,
}

#[derive(Iden)]
enum LeaveRequest {
    Table,
    EmployeeId,
    LeaveType,
    Status,
    StartDate,
    EndDate,
    ApprovedBy,
}

#[derive(Iden)]
pub(crate) enum Payrun {
    Table,
    CompanyId,
    PeriodMonth,
    Status,
    EmployeesCount,
    GrossTotal,
    NetTotal,
    CreatedBy,
    ValidatedBy,
    ValidatedAt,
}

#[derive(Iden)]
enum Payslip {
    Table,
    PayrunId,
    EmployeeId,
    Components,
    Gross,
    PfEmployee,
    PfEmployer,
    ProfessionalTax,
    Net,
    Status,
}
