//! Book entity

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "String(StringLen::N(100))")]
    pub name: String,

    #[sea_orm(column_type = "String(StringLen::N(100))")]
    pub author: String,

    #[sea_orm(column_type = "String(StringLen::N(100))")]
    pub publication: String,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,

    /// Soft-delete marker; rows with a value are invisible to every query
    #[sea_orm(nullable)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
