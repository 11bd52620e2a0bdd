use crate::error::{OptimizerError, Result};
use crate::spatial::{SpatialCapability, SpatialLoadOptions, ensure_spatial_capability};
use crate::sql::{self, ColumnType};
use rusqlite::{Connection, OpenFlags, Transaction};
use std::path::Path;
use tracing::{info, warn};

/// Read-write connection to a GeoPackage plus the primitive schema
/// operations the optimization pipelines are built from.
///
/// Every operation that issues a statement fails fatally on a database
/// error; callers abort the run and leave the package in whatever schema
/// state the completed statements produced.
#[derive(Debug)]
pub struct Gateway {
    conn: Connection,
    spatial: SpatialCapability,
}

impl Gateway {
    /// Open an existing package for read-write access.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, &SpatialLoadOptions::default())
    }

    /// Open with an explicit spatial capability policy.
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        options: &SpatialLoadOptions,
    ) -> Result<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)?;
        Self::prepare(conn, options)
    }

    /// Open a transient in-memory package with the built-in spatial functions.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::prepare(conn, &SpatialLoadOptions::builtin_only())
    }

    fn prepare(conn: Connection, options: &SpatialLoadOptions) -> Result<Self> {
        if let Err(err) = conn.execute_batch("PRAGMA foreign_keys = ON") {
            warn!("could not enable foreign keys: {err}");
        }
        let spatial = ensure_spatial_capability(&conn, options);
        Ok(Self { conn, spatial })
    }

    /// How spatial SQL functions were made available on this connection.
    pub fn spatial_capability(&self) -> &SpatialCapability {
        &self.spatial
    }

    /// Every table registered in the package's content catalog, in catalog
    /// order. Fails if the catalog is unreadable; such a file is not a valid
    /// package.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(sql::SQL_LIST_TABLES)?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(&sql::sql_table_columns(table)?)?;
        let columns = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(columns)
    }

    /// Fail unless every listed column exists in the table.
    pub fn ensure_columns_exist<'a, I>(&self, table: &str, columns: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let existing = self.table_columns(table)?;
        for column in columns {
            if !existing.iter().any(|name| name == column) {
                return Err(OptimizerError::MissingColumn {
                    table: table.to_string(),
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn add_column(&self, table: &str, column: &str, column_type: ColumnType) -> Result<()> {
        self.run(&sql::sql_add_column(table, column, column_type)?)
    }

    /// Apply a raw SQL expression to every row's `column` in one statement.
    pub fn set_column(&self, table: &str, column: &str, value_expression: &str) -> Result<()> {
        self.run(&sql::sql_set_column(table, column, value_expression)?)
    }

    /// Create an index; a `None` name synthesizes
    /// `<table>_<col1>_<col2>…_index`.
    pub fn create_index(
        &self,
        table: &str,
        columns: &[String],
        name: Option<&str>,
        unique: bool,
    ) -> Result<()> {
        let name = match name {
            Some(name) => name.to_string(),
            None => sql::default_index_name(table, columns),
        };
        self.run(&sql::sql_create_index(&name, table, columns, unique)?)
    }

    /// Run an operator-supplied statement verbatim. No sandboxing; the
    /// configuration is trusted input.
    pub fn execute(&self, statement: &str) -> Result<()> {
        self.run(statement)
    }

    /// Refresh the engine's statistics for the query planner.
    pub fn analyze(&self) -> Result<()> {
        self.run("ANALYZE")
    }

    fn run(&self, statement: &str) -> Result<()> {
        info!("executing: {statement}");
        self.conn.execute_batch(statement)?;
        Ok(())
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }
}
