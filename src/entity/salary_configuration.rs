use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "salary_configuration")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    #[sea_orm(unique)]
    pub employee_id: Uuid,
    /// Static shape: resolved monthly basic. Absent for the formula shape.
    #[sea_orm(column_type = "Decimal(Some((14, 2)))", nullable)]
    pub basic: Option<Decimal>,
    /// Static shape: component name -> resolved monthly amount.
    pub allowances: Option<Json>,
    /// Formula shape: target monthly wage the components are derived from.
    #[sea_orm(column_type = "Decimal(Some((14, 2)))", nullable)]
    pub wage: Option<Decimal>,
    /// Formula shape: ordered component list, see `payroll::salary`.
    pub components: Option<Json>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
