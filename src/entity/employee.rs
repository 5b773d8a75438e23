use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::RoleType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employee")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub company_id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    pub password: Vec<u8>,
    pub role: RoleType,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id"
    )]
    Company,
    #[sea_orm(has_one = "super::salary_configuration::Entity")]
    SalaryConfiguration,
    #[sea_orm(has_many = "super::time_log::Entity")]
    TimeLog,
    #[sea_orm(has_many = "super::leave_request::Entity")]
    LeaveRequest,
    #[sea_orm(has_many = "super::payslip::Entity")]
    Payslip,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::salary_configuration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalaryConfiguration.def()
    }
}

impl Related<super::time_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TimeLog.def()
    }
}

impl Related<super::leave_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveRequest.def()
    }
}

impl Related<super::payslip::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payslip.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
