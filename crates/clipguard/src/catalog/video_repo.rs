//! Video repository, CRUD operations for the `videos` table.

use rusqlite::{params, Row};
use serde::Serialize;

use super::{CatalogError, Database};

/// A catalog entry for one persisted video/metadata pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: i64,
    pub account_id: i64,
    pub video_name: String,
    pub meta_name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl VideoRecord {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            account_id: row.get("account_id")?,
            video_name: row.get("video_name")?,
            meta_name: row.get("meta_name")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Inserts a video, or refreshes the existing row for the same
/// account/video pair. Returns the row id.
pub fn upsert(
    db: &Database,
    account_id: i64,
    video_name: &str,
    meta_name: &str,
    now: &str,
) -> Result<i64, CatalogError> {
    db.with_conn(|conn| {
        let id = conn.query_row(
            "INSERT INTO videos (account_id, video_name, meta_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT (account_id, video_name)
             DO UPDATE SET meta_name = excluded.meta_name, updated_at = excluded.updated_at
             RETURNING id",
            params![account_id, video_name, meta_name, now],
            |r| r.get(0),
        )?;
        Ok(id)
    })
}

/// Finds a video by its id.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<VideoRecord>, CatalogError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM videos WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], VideoRecord::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(CatalogError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Lists all videos of an account, oldest first.
pub fn list_by_account(db: &Database, account_id: i64) -> Result<Vec<VideoRecord>, CatalogError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM videos WHERE account_id = ?1 ORDER BY created_at, id")?;
        let rows = stmt
            .query_map(params![account_id], VideoRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Deletes a video row. Returns whether a row was removed.
pub fn delete(db: &Database, id: i64) -> Result<bool, CatalogError> {
    db.with_conn(|conn| {
        let changed = conn.execute("DELETE FROM videos WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    })
}
