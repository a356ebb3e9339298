// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw payload access for named collections in the `kv` table.

use rusqlite::params;
use unidesk_core::UnideskError;

use crate::database::{map_tr_err, Database};

/// Read a collection's serialized payload, `None` if never written.
pub async fn get(db: &Database, collection: &str) -> Result<Option<String>, UnideskError> {
    let collection = collection.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT payload FROM kv WHERE collection = ?1",
                params![collection],
                |row| row.get::<_, String>(0),
            );
            match result {
                Ok(payload) => Ok(Some(payload)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Replace a collection's payload wholesale.
pub async fn put(db: &Database, collection: &str, payload: &str) -> Result<(), UnideskError> {
    let collection = collection.to_string();
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO kv (collection, payload, updated_at)
                 VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
                params![collection, payload],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Remove a collection entirely, so the next read sees its seeded state.
pub async fn delete(db: &Database, collection: &str) -> Result<(), UnideskError> {
    let collection = collection.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM kv WHERE collection = ?1", params![collection])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
