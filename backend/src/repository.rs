//! Data access for the `items` table.
//!
//! Each function is one unit of work on the connection it is given: writes
//! are committed before the function returns.

use chrono::{Duration, NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use items_shared::{CreateItemRequest, UpdateItemRequest};

use crate::models::{Item, ItemChangeset, NewItem};
use crate::schema::items;

pub fn create_item(conn: &mut SqliteConnection, input: CreateItemRequest) -> QueryResult<Item> {
    let now = Utc::now().naive_utc();
    let new_item = NewItem {
        name: input.name,
        description: input.description,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(items::table)
        .values(&new_item)
        .returning(Item::as_returning())
        .get_result(conn)
}

pub fn get_item(conn: &mut SqliteConnection, id: i32) -> QueryResult<Option<Item>> {
    items::table
        .find(id)
        .select(Item::as_select())
        .first(conn)
        .optional()
}

/// Items in id order, skipping the first `skip` and returning at most `limit`.
pub fn list_items(conn: &mut SqliteConnection, skip: i64, limit: i64) -> QueryResult<Vec<Item>> {
    items::table
        .order(items::id.asc())
        .offset(skip)
        .limit(limit)
        .select(Item::as_select())
        .load(conn)
}

/// Applies the fields present in `patch`. Returns `None`, without writing,
/// when no item has this id.
pub fn update_item(
    conn: &mut SqliteConnection,
    id: i32,
    patch: UpdateItemRequest,
) -> QueryResult<Option<Item>> {
    conn.immediate_transaction(|conn| {
        let Some(existing) = get_item(conn, id)? else {
            return Ok(None);
        };

        let changeset = ItemChangeset {
            name: patch.name.flatten(),
            description: patch.description,
            updated_at: next_updated_at(existing.updated_at),
        };

        diesel::update(items::table.find(id))
            .set(&changeset)
            .returning(Item::as_returning())
            .get_result(conn)
            .map(Some)
    })
}

/// Returns `false` when there was nothing to delete.
pub fn delete_item(conn: &mut SqliteConnection, id: i32) -> QueryResult<bool> {
    let deleted = diesel::delete(items::table.find(id)).execute(conn)?;
    Ok(deleted > 0)
}

pub fn count_items(conn: &mut SqliteConnection) -> QueryResult<i64> {
    items::table.count().get_result(conn)
}

// Strictly after `previous`, even if the clock has not moved since.
fn next_updated_at(previous: NaiveDateTime) -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}
