//! SQLite-backed catalog store.
//!
//! [`CatalogStore`] is a cheap, cloneable handle that knows where the database
//! lives. Work happens through a [`Session`], one connection acquired per unit of
//! work and released when the session is dropped.

use crate::config::DatabaseConfig;
use crate::error::{CatalogError, Result};
use crate::model::{Facility, Institution, NewInstitution, Program};
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params, params_from_iter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS institutions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    acronym TEXT,
    region TEXT,
    location TEXT,
    type TEXT,
    avg_fees INTEGER,
    difficulty TEXT,
    description TEXT,
    admission_requirements TEXT
);
CREATE TABLE IF NOT EXISTS programs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    institution_id INTEGER NOT NULL REFERENCES institutions(id) ON DELETE CASCADE,
    name TEXT,
    duration REAL,
    program_difficulty TEXT,
    prospects TEXT
);
CREATE INDEX IF NOT EXISTS idx_programs_institution ON programs(institution_id);
CREATE TABLE IF NOT EXISTS facilities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    institution_id INTEGER NOT NULL REFERENCES institutions(id) ON DELETE CASCADE,
    name TEXT
);
CREATE INDEX IF NOT EXISTS idx_facilities_institution ON facilities(institution_id);
";

const INSTITUTION_COLUMNS: &str = "id, name, acronym, region, location, type, avg_fees, \
     difficulty, description, admission_requirements";

static MEMORY_DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    /// Shared-cache in-memory database, alive while any handle holds its anchor.
    Memory(String),
}

impl Location {
    /// Parse a database URL. Only SQLite locations are supported.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(CatalogError::Config("database.url is empty".to_string()));
        }
        if url == ":memory:" || url == "sqlite::memory:" || url == "sqlite://:memory:" {
            let n = MEMORY_DB_COUNTER.fetch_add(1, Ordering::Relaxed);
            return Ok(Self::Memory(format!(
                "file:sekela-mem-{}-{n}?mode=memory&cache=shared",
                std::process::id()
            )));
        }
        if let Some(path) = url.strip_prefix("sqlite://") {
            return Ok(Self::File(PathBuf::from(path)));
        }
        if let Some(path) = url.strip_prefix("sqlite:") {
            return Ok(Self::File(PathBuf::from(path)));
        }
        if let Some((scheme, _)) = url.split_once("://") {
            return Err(CatalogError::Config(format!(
                "unsupported database scheme '{scheme}': only sqlite is available"
            )));
        }
        Ok(Self::File(PathBuf::from(url)))
    }
}

/// Handle to the catalog database.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    location: Location,
    /// Keeps an in-memory database alive between sessions.
    anchor: Option<Arc<Mutex<Connection>>>,
}

impl CatalogStore {
    /// Open the store described by `config`, creating the schema if needed.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        Self::open_location(Location::parse(&config.url)?)
    }

    /// Open a file-backed store at `path`.
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open_location(Location::File(path.to_path_buf()))
    }

    /// Open a private in-memory store.
    pub fn in_memory() -> Result<Self> {
        Self::open_location(Location::parse(":memory:")?)
    }

    fn open_location(location: Location) -> Result<Self> {
        if let Location::File(path) = &location
            && let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut store = Self {
            location,
            anchor: None,
        };
        let conn = store.connect()?;
        conn.execute_batch(SCHEMA)?;
        if matches!(store.location, Location::Memory(_)) {
            store.anchor = Some(Arc::new(Mutex::new(conn)));
        }
        Ok(store)
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn is_memory(&self) -> bool {
        self.anchor.is_some()
    }

    fn connect(&self) -> Result<Connection> {
        let conn = match &self.location {
            Location::File(path) => Connection::open(path)?,
            Location::Memory(uri) => Connection::open_with_flags(
                uri,
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI,
            )?,
        };
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    /// Acquire a session. The connection is released when the session drops.
    pub fn session(&self) -> Result<Session> {
        Ok(Session {
            conn: self.connect()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Query predicate
// ---------------------------------------------------------------------------

/// Conjunction of institution predicates. `None` fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstitutionFilter {
    /// Exact match on region.
    pub region: Option<String>,
    /// Exact match on ownership type.
    pub ownership: Option<String>,
    /// Inclusive upper bound on average fees.
    pub max_fees: Option<i64>,
    /// Exact match on institution difficulty.
    pub difficulty: Option<String>,
    /// Case-insensitive substring of at least one owned program's name.
    pub program_name_contains: Option<String>,
}

impl InstitutionFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Render as a SQL `WHERE` body plus its positional parameters.
    fn to_sql(&self) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        if let Some(region) = &self.region {
            values.push(Value::Text(region.clone()));
            clauses.push(format!("region = ?{}", values.len()));
        }
        if let Some(ownership) = &self.ownership {
            values.push(Value::Text(ownership.clone()));
            clauses.push(format!("type = ?{}", values.len()));
        }
        if let Some(max_fees) = self.max_fees {
            values.push(Value::Integer(max_fees));
            clauses.push(format!("avg_fees <= ?{}", values.len()));
        }
        if let Some(difficulty) = &self.difficulty {
            values.push(Value::Text(difficulty.clone()));
            clauses.push(format!("difficulty = ?{}", values.len()));
        }
        if let Some(needle) = &self.program_name_contains {
            values.push(Value::Text(like_pattern(needle)));
            // EXISTS keeps each institution once no matter how many programs match.
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM programs p WHERE p.institution_id = institutions.id \
                 AND lower(p.name) LIKE lower(?{}) ESCAPE '\\')",
                values.len()
            ));
        }

        let body = if clauses.is_empty() {
            "1 = 1".to_string()
        } else {
            clauses.join(" AND ")
        };
        (body, values)
    }
}

/// `%needle%` with LIKE metacharacters escaped.
///
/// Case is left alone: both sides are folded by SQLite's `lower()` in the query.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One connection to the catalog, scoped to a single request or command.
pub struct Session {
    conn: Connection,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session {
    /// Raw connection, for maintenance tasks the typed API does not cover.
    #[doc(hidden)]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert an institution with its programs and facilities in one transaction.
    pub fn insert_institution(&mut self, record: &NewInstitution) -> Result<Institution> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO institutions (name, acronym, region, location, type, avg_fees, \
             difficulty, description, admission_requirements) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.name,
                record.acronym,
                record.region,
                record.location,
                record.ownership,
                record.avg_fees,
                record.difficulty,
                record.description,
                record.admission_requirements,
            ],
        )?;
        let id = tx.last_insert_rowid();

        let mut programs = Vec::with_capacity(record.programs.len());
        for p in &record.programs {
            tx.execute(
                "INSERT INTO programs (institution_id, name, duration, program_difficulty, prospects) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, p.name, p.duration, p.program_difficulty, p.prospects],
            )?;
            programs.push(Program {
                id: tx.last_insert_rowid(),
                institution_id: id,
                name: Some(p.name.clone()),
                duration: Some(p.duration),
                program_difficulty: p.program_difficulty.clone(),
                prospects: p.prospects.clone(),
            });
        }

        let mut facilities = Vec::with_capacity(record.facilities.len());
        for name in &record.facilities {
            tx.execute(
                "INSERT INTO facilities (institution_id, name) VALUES (?1, ?2)",
                params![id, name],
            )?;
            facilities.push(Facility {
                id: tx.last_insert_rowid(),
                institution_id: id,
                name: Some(name.clone()),
            });
        }

        tx.commit()?;

        Ok(Institution {
            id,
            name: record.name.clone(),
            acronym: record.acronym.clone(),
            region: record.region.clone(),
            location: record.location.clone(),
            ownership: record.ownership.clone(),
            avg_fees: record.avg_fees,
            difficulty: record.difficulty.clone(),
            description: record.description.clone(),
            admission_requirements: record.admission_requirements.clone(),
            programs,
            facilities,
        })
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Institution>> {
        let sql = format!("SELECT {INSTITUTION_COLUMNS} FROM institutions WHERE name = ?1");
        let row = self
            .conn
            .query_row(&sql, [name], institution_from_row)
            .optional()?;
        row.map(|inst| self.attach_children(inst)).transpose()
    }

    pub fn get_by_id(&self, id: i64) -> Result<Option<Institution>> {
        let sql = format!("SELECT {INSTITUTION_COLUMNS} FROM institutions WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, [id], institution_from_row)
            .optional()?;
        row.map(|inst| self.attach_children(inst)).transpose()
    }

    /// Like [`Session::get_by_id`], but absence is an error.
    pub fn require(&self, id: i64) -> Result<Institution> {
        self.get_by_id(id)?.ok_or(CatalogError::NotFound { id })
    }

    /// Institutions in id order, skipping `offset` and returning at most `limit`.
    pub fn list_all(&self, offset: usize, limit: usize) -> Result<Vec<Institution>> {
        let sql = format!(
            "SELECT {INSTITUTION_COLUMNS} FROM institutions ORDER BY id LIMIT ?1 OFFSET ?2"
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit, offset], institution_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter()
            .map(|inst| self.attach_children(inst))
            .collect()
    }

    /// Every institution, in id order.
    pub fn all(&self) -> Result<Vec<Institution>> {
        self.query(&InstitutionFilter::default())
    }

    /// Institutions satisfying every clause of `filter`, in id order.
    pub fn query(&self, filter: &InstitutionFilter) -> Result<Vec<Institution>> {
        let (body, values) = filter.to_sql();
        let sql = format!("SELECT {INSTITUTION_COLUMNS} FROM institutions WHERE {body} ORDER BY id");
        tracing::debug!(sql = %sql, "catalog query");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), institution_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter()
            .map(|inst| self.attach_children(inst))
            .collect()
    }

    /// Delete one institution; its programs and facilities go with it.
    pub fn delete_institution(&mut self, id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM institutions WHERE id = ?1", [id])?;
        Ok(n > 0)
    }

    /// Delete every institution and child row in a single transaction.
    /// Returns the number of institutions removed.
    pub fn delete_all_institutions(&mut self) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM facilities", [])?;
        tx.execute("DELETE FROM programs", [])?;
        let removed = tx.execute("DELETE FROM institutions", [])?;
        tx.commit()?;
        Ok(removed)
    }

    pub fn count_institutions(&self) -> Result<usize> {
        self.count("institutions")
    }

    pub fn count_programs(&self) -> Result<usize> {
        self.count("programs")
    }

    pub fn count_facilities(&self) -> Result<usize> {
        self.count("facilities")
    }

    fn count(&self, table: &str) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    fn attach_children(&self, mut inst: Institution) -> Result<Institution> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, institution_id, name, duration, program_difficulty, prospects \
             FROM programs WHERE institution_id = ?1 ORDER BY id",
        )?;
        inst.programs = stmt
            .query_map([inst.id], |r| {
                Ok(Program {
                    id: r.get(0)?,
                    institution_id: r.get(1)?,
                    name: r.get(2)?,
                    duration: r.get(3)?,
                    program_difficulty: r.get(4)?,
                    prospects: r.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = self.conn.prepare_cached(
            "SELECT id, institution_id, name FROM facilities WHERE institution_id = ?1 ORDER BY id",
        )?;
        inst.facilities = stmt
            .query_map([inst.id], |r| {
                Ok(Facility {
                    id: r.get(0)?,
                    institution_id: r.get(1)?,
                    name: r.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(inst)
    }
}

fn institution_from_row(row: &Row<'_>) -> rusqlite::Result<Institution> {
    Ok(Institution {
        id: row.get(0)?,
        name: row.get(1)?,
        acronym: row.get(2)?,
        region: row.get(3)?,
        location: row.get(4)?,
        ownership: row.get(5)?,
        avg_fees: row.get(6)?,
        difficulty: row.get(7)?,
        description: row.get(8)?,
        admission_requirements: row.get(9)?,
        programs: Vec::new(),
        facilities: Vec::new(),
    })
}
