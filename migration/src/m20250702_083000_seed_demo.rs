use sea_orm_migration::prelude::*;
use sha2::Digest as _;

use crate::m20250701_120000_init::{Company, Employee, SalaryConfiguration};

#[derive(DeriveMigrationName)]
pub struct Migration;

const COMPANY_UUID: u128 = 1;
const ADMIN_UUID: u128 = 12345;
const PAYROLL_UUID: u128 = 12346;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let time = Expr::val("2025-07-02T08:30:00.000Z").cast_as("timestamptz");

        let company_id = format!("{:032x}", COMPANY_UUID);

        manager
            .exec_stmt(Query::insert()
                .into_table(Company::Table)
                .columns(["id", "created_at", "updated_at", "name"])
                .values_panic([Expr::val(company_id.clone()).cast_as("uuid"), time.clone(), time.clone(), "Demo Payroll Co".into()])
                .to_owned()
        ).await.unwrap();

        // Creates 20 employees with a static salary configuration each
        for i in 1..=20 {
            let uuid = format!("{:032x}", 1000 + i as u128);
            let config_uuid = format!("{:032x}", 2000 + i as u128);
            let username = format!("employee{i}");
            let basic = rand::random_range(8_000..=40_000);

            let hashed_password = &sha2::Sha256::digest(&format!("{}:{}", username, username))[..];

            manager
                .exec_stmt(Query::insert()
                    .into_table(Employee::Table)
                    .columns(["id", "created_at", "updated_at", "company_id", "username", "password", "role"])
                    .values_panic([Expr::val(uuid.clone()).cast_as("uuid"), time.clone(), time.clone(), Expr::val(company_id.clone()).cast_as("uuid"), username.into(), hashed_password.into(), Expr::val("employee").cast_as("role_type")])
                    .to_owned()
            ).await.unwrap();

            manager
                .exec_stmt(Query::insert()
                    .into_table(SalaryConfiguration::Table)
                    .columns(["id", "created_at", "updated_at", "employee_id", "basic", "allowances"])
                    .values_panic([Expr::val(config_uuid).cast_as("uuid"), time.clone(), time.clone(), Expr::val(uuid).cast_as("uuid"), basic.into(), Expr::val(r#"{"hra": 4000, "transport": 1500}"#).cast_as("jsonb")])
                    .to_owned()
            ).await.unwrap();
        }

        // Create an admin and a payroll officer

        for (uuid, username, role) in [(ADMIN_UUID, "admin", "admin"), (PAYROLL_UUID, "payroll", "payroll")] {
            let hashed_password = &sha2::Sha256::digest(&format!("{}:{}", username, username))[..];

            manager
                .exec_stmt(Query::insert()
                    .into_table(Employee::Table)
                    .columns(["id", "created_at", "updated_at", "company_id", "username", "password", "role"])
                    .values_panic([Expr::val(format!("{:032x}", uuid)).cast_as("uuid"), time.clone(), time.clone(), Expr::val(company_id.clone()).cast_as("uuid"), username.into(), hashed_password.into(), Expr::val(role).cast_as("role_type")])
                    .to_owned()
            ).await.unwrap();
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for i in 1..=20 {
            manager
                .exec_stmt(Query::delete()
                    .from_table(SalaryConfiguration::Table)
                    .and_where(Expr::col("id").eq(Expr::val(format!("{:032x}", 2000 + i as u128)).cast_as("uuid")))
                    .to_owned()
            ).await.unwrap();

            manager
                .exec_stmt(Query::delete()
                    .from_table(Employee::Table)
                    .and_where(Expr::col("id").eq(Expr::val(format!("{:032x}", 1000 + i as u128)).cast_as("uuid")))
                    .to_owned()
            ).await.unwrap();
        }

        for uuid in [ADMIN_UUID, PAYROLL_UUID] {
            manager
                .exec_stmt(Query::delete()
                    .from_table(Employee::Table)
                    .and_where(Expr::col("id").eq(Expr::val(format!("{:032x}", uuid)).cast_as("uuid")))
                    .to_owned()
            ).await.unwrap();
        }

        manager
            .exec_stmt(Query::delete()
                .from_table(Company::Table)
                .and_where(Expr::col("id").eq(Expr::val(format!("{:032x}", COMPANY_UUID)).cast_as("uuid")))
                .to_owned()
        ).await.unwrap();

        Ok(())
    }
}
