use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::PayslipStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payslip")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub payrun_id: Uuid,
    pub employee_id: Uuid,
    /// Full `PayslipBreakdown`, see `payroll::calculator`.
    pub components: Json,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub gross: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub pf_employee: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub pf_employer: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub professional_tax: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub net: Decimal,
    pub status: PayslipStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payrun::Entity",
        from = "Column::PayrunId",
        to = "super::payrun::Column::Id"
    )]
    Payrun,
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
}

impl Related<super::payrun::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payrun.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
