//! Official repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and filtered listing over `provincial_officials`.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `created_at`/`updated_at` are owned by SQL, never by callers.
//! - Listing order is ascending `id` (insertion order).

use crate::db::DbError;
use crate::model::official::{NewOfficial, Official, OfficialId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const OFFICIAL_SELECT_SQL: &str = "SELECT
    id,
    name,
    position,
    profile_image,
    created_at,
    updated_at
FROM provincial_officials";

const LIKE_ESCAPE: char = '\\';

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for official persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(OfficialId),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "provincial official not found: {id}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Listing filters. Both are optional and combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfficialListQuery {
    /// Exact match against `position`.
    pub position: Option<String>,
    /// Substring match against `name` (ASCII case-insensitive).
    pub search: Option<String>,
}

/// Repository interface for official CRUD operations.
pub trait OfficialRepository {
    fn create_official(&self, official: &NewOfficial) -> RepoResult<OfficialId>;
    fn update_official(&self, official: &Official) -> RepoResult<()>;
    fn get_official(&self, id: OfficialId) -> RepoResult<Option<Official>>;
    fn list_officials(&self, query: &OfficialListQuery) -> RepoResult<Vec<Official>>;
    fn delete_official(&self, id: OfficialId) -> RepoResult<()>;
}

/// SQLite-backed official repository.
pub struct SqliteOfficialRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOfficialRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl OfficialRepository for SqliteOfficialRepository<'_> {
    fn create_official(&self, official: &NewOfficial) -> RepoResult<OfficialId> {
        self.conn.execute(
            "INSERT INTO provincial_officials (name, position, profile_image)
             VALUES (?1, ?2, ?3);",
            params![
                official.name.as_str(),
                official.position.label(),
                official.profile_image.as_deref(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_official(&self, official: &Official) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE provincial_officials
             SET
                name = ?1,
                position = ?2,
                profile_image = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?4;",
            params![
                official.name.as_str(),
                official.position.as_str(),
                official.profile_image.as_deref(),
                official.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(official.id));
        }

        Ok(())
    }

    fn get_official(&self, id: OfficialId) -> RepoResult<Option<Official>> {
        let official = self
            .conn
            .query_row(
                &format!("{OFFICIAL_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_official_row,
            )
            .optional()?;

        Ok(official)
    }

    fn list_officials(&self, query: &OfficialListQuery) -> RepoResult<Vec<Official>> {
        let mut sql = format!("{OFFICIAL_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(position) = filled(query.position.as_deref()) {
            sql.push_str(" AND position = ?");
            bind_values.push(Value::Text(position.to_string()));
        }

        if let Some(search) = filled(query.search.as_deref()) {
            sql.push_str(" AND name LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(format!("%{}%", escape_like(search))));
        }

        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let officials = stmt
            .query_map(params_from_iter(bind_values), parse_official_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(officials)
    }

    fn delete_official(&self, id: OfficialId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM provincial_officials WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_official_row(row: &Row<'_>) -> rusqlite::Result<Official> {
    Ok(Official {
        id: row.get("id")?,
        name: row.get("name")?,
        position: row.get("position")?,
        profile_image: row.get("profile_image")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Trims filter values; blank ones count as absent.
fn filled(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_') || ch == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}
