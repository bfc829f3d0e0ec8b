use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::schema::items;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = items)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Partial update. `None` columns are left out of the `SET` clause;
/// `description: Some(None)` writes `NULL`.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = items)]
pub struct ItemChangeset {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub updated_at: NaiveDateTime,
}

impl From<Item> for items_shared::Item {
    fn from(item: Item) -> Self {
        items_shared::Item {
            id: item.id,
            name: item.name,
            description: item.description,
            created_at: item.created_at.and_utc(),
            updated_at: item.updated_at.and_utc(),
        }
    }
}
