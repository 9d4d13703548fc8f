//! Person repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide upsert/delete/list APIs over the `people` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `upsert` never creates a second row for an existing phone number.
//! - `list_all` returns rows in insertion order; an upsert of an existing
//!   phone number keeps the row's position.
//! - `delete` of an unknown phone number is a no-op.

use crate::db::DbError;
use crate::model::person::{Person, PersonValidationError};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PERSON_SELECT_SQL: &str = "SELECT phone_number, name FROM people";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for person persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(PersonValidationError),
    Db(DbError),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted person data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "database is missing required table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "table `{table}` is missing required column `{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PersonValidationError> for RepoError {
    fn from(value: PersonValidationError) -> Self {
        Self::Validation(value)
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

/// Repository interface for phonebook entries.
pub trait PersonRepository {
    /// Inserts `person`, or replaces the name of the entry with the same
    /// phone number.
    fn upsert(&self, person: &Person) -> RepoResult<()>;
    /// Removes the entry with `phone_number`. Unknown numbers are ignored.
    fn delete(&self, phone_number: &str) -> RepoResult<()>;
    /// Lists every entry in insertion order.
    fn list_all(&self) -> RepoResult<Vec<Person>>;
    /// Looks up one entry by phone number.
    fn get(&self, phone_number: &str) -> RepoResult<Option<Person>>;
    /// Number of stored entries.
    fn count(&self) -> RepoResult<u64>;
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// Rejects connections whose schema lacks the `people` table shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn upsert(&self, person: &Person) -> RepoResult<()> {
        person.validate()?;

        self.conn.execute(
            "INSERT INTO people (phone_number, name)
             VALUES (?1, ?2)
             ON CONFLICT(phone_number) DO UPDATE SET name = excluded.name;",
            params![person.phone_number.as_str(), person.name.as_str()],
        )?;

        Ok(())
    }

    fn delete(&self, phone_number: &str) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM people WHERE phone_number = ?1;", [phone_number])?;
        Ok(())
    }

    fn list_all(&self) -> RepoResult<Vec<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut people = Vec::new();

        while let Some(row) = rows.next()? {
            people.push(parse_person_row(row)?);
        }

        Ok(people)
    }

    fn get(&self, phone_number: &str) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE phone_number = ?1;"))?;
        let mut rows = stmt.query([phone_number])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_person_row(row)?)),
            None => Ok(None),
        }
    }

    fn count(&self) -> RepoResult<u64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM people;", [], |row| row.get::<_, i64>(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let person = Person {
        phone_number: row.get("phone_number")?,
        name: row.get("name")?,
    };
    person
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("{err} in people row")))?;
    Ok(person)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, "people")? {
        return Err(RepoError::MissingRequiredTable("people"));
    }

    for column in ["phone_number", "name"] {
        if !table_has_column(conn, "people", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "people",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
