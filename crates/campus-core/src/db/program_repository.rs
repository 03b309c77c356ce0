//! Program repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use crate::error::{Error, Result};
use crate::models::{Program, ProgramId};
use crate::util::timestamp_from_millis;
use rusqlite::{params, Connection, OptionalExtension};

const PROGRAM_COLUMNS: &str = "id, name, description, bacc, location, inscription_open,
    inscription_closed, fees, bank_account, bank_account_owner, admission, document,
    domain, updated_at";

/// Trait for local program storage operations
pub trait ProgramRepository {
    /// Get a program by ID
    fn get(&self, id: ProgramId) -> Result<Option<Program>>;

    /// Insert a program copied from the remote catalog
    fn create(&self, program: &Program) -> Result<()>;

    /// Replace every field of an existing program in one transaction
    fn overwrite(&self, program: &Program) -> Result<()>;

    /// List programs ordered by name
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Program>>;

    /// List programs of one domain ordered by name
    fn list_by_domain(&self, domain: &str, limit: usize, offset: usize) -> Result<Vec<Program>>;

    /// Number of stored programs
    fn count(&self) -> Result<usize>;
}

/// `SQLite` implementation of `ProgramRepository`
pub struct SqliteProgramRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteProgramRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a program from a database row
    fn parse_program(row: &rusqlite::Row<'_>) -> rusqlite::Result<Program> {
        let updated_at: i64 = row.get(13)?;
        let updated_at = timestamp_from_millis(updated_at).ok_or_else(|| {
            rusqlite::Error::IntegralValueOutOfRange(13, updated_at)
        })?;

        Ok(Program {
            id: ProgramId::new(row.get(0)?),
            name: row.get(1)?,
            description: row.get(2)?,
            bacc: row.get::<_, i32>(3)? != 0,
            location: row.get(4)?,
            inscription_open: row.get(5)?,
            inscription_closed: row.get(6)?,
            fees: row.get(7)?,
            bank_account: row.get(8)?,
            bank_account_owner: row.get(9)?,
            admission: row.get(10)?,
            document: row.get(11)?,
            domain: row.get(12)?,
            updated_at,
        })
    }
}

impl ProgramRepository for SqliteProgramRepository<'_> {
    fn get(&self, id: ProgramId) -> Result<Option<Program>> {
        let program = self
            .conn
            .query_row(
                &format!("SELECT {PROGRAM_COLUMNS} FROM programs WHERE id = ?"),
                params![id.get()],
                Self::parse_program,
            )
            .optional()?;
        Ok(program)
    }

    fn create(&self, program: &Program) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO programs ({PROGRAM_COLUMNS})
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            params![
                program.id.get(),
                program.name,
                program.description,
                i32::from(program.bacc),
                program.location,
                program.inscription_open,
                program.inscription_closed,
                program.fees,
                program.bank_account,
                program.bank_account_owner,
                program.admission,
                program.document,
                program.domain,
                program.updated_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    fn overwrite(&self, program: &Program) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let rows = tx.execute(
            "UPDATE programs SET
                name = ?, description = ?, bacc = ?, location = ?,
                inscription_open = ?, inscription_closed = ?, fees = ?,
                bank_account = ?, bank_account_owner = ?, admission = ?,
                document = ?, domain = ?, updated_at = ?
             WHERE id = ?",
            params![
                program.name,
                program.description,
                i32::from(program.bacc),
                program.location,
                program.inscription_open,
                program.inscription_closed,
                program.fees,
                program.bank_account,
                program.bank_account_owner,
                program.admission,
                program.document,
                program.domain,
                program.updated_at.timestamp_millis(),
                program.id.get(),
            ],
        )?;

        if rows == 0 {
            // Dropping the transaction rolls it back
            return Err(Error::NotFound(program.id.to_string()));
        }

        tx.commit()?;
        Ok(())
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Program>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROGRAM_COLUMNS}
             FROM programs
             ORDER BY name COLLATE NOCASE ASC, id ASC
             LIMIT ? OFFSET ?"
        ))?;

        let programs = stmt
            .query_map(params![limit as i64, offset as i64], Self::parse_program)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(programs)
    }

    fn list_by_domain(&self, domain: &str, limit: usize, offset: usize) -> Result<Vec<Program>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROGRAM_COLUMNS}
             FROM programs
             WHERE domain = ? COLLATE NOCASE
             ORDER BY name COLLATE NOCASE ASC, id ASC
             LIMIT ? OFFSET ?"
        ))?;

        let programs = stmt
            .query_map(
                params![domain, limit as i64, offset as i64],
                Self::parse_program,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(programs)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM programs", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|error| Error::Database(error.to_string()))
    }
}
