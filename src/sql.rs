//! Statement text issued by the Gateway.
//!
//! Table, column, and index names are spliced into statement text, so every
//! builder routes them through [`quote_identifier`]. Only configured
//! `sql_statements` bypass this layer; they are executed verbatim as an
//! operator-trusted escape hatch.

use crate::error::{OptimizerError, Result};

// gpkg_contents: the content catalog listing every registered table in the
// package, in catalog order.
// cf. https://www.geopackage.org/spec140/index.html#_contents
pub(crate) const SQL_LIST_TABLES: &str = "SELECT table_name FROM gpkg_contents";

/// Column types the optimizer adds to user tables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColumnType {
    Text,
    Numeric,
}

impl ColumnType {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Numeric => "NUMERIC",
        }
    }
}

/// Accept a name for use in statement text.
///
/// The allow-list is deliberately strict: ASCII letters, digits, and
/// underscores, not starting with a digit. Operator-supplied names that fail
/// it abort the run before any SQL text is built.
pub(crate) fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(OptimizerError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

pub(crate) fn quote_identifier(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!(r#""{name}""#))
}

pub(crate) fn sql_table_columns(table: &str) -> Result<String> {
    validate_identifier(table)?;
    Ok(format!("SELECT name FROM pragma_table_info('{table}')"))
}

pub(crate) fn sql_add_column(table: &str, column: &str, column_type: ColumnType) -> Result<String> {
    Ok(format!(
        "ALTER TABLE {} ADD {} {}",
        quote_identifier(table)?,
        quote_identifier(column)?,
        column_type.as_sql()
    ))
}

pub(crate) fn sql_set_column(table: &str, column: &str, value_expression: &str) -> Result<String> {
    Ok(format!(
        "UPDATE {} SET {} = {value_expression}",
        quote_identifier(table)?,
        quote_identifier(column)?
    ))
}

/// Name used when an index specification leaves the name empty.
pub(crate) fn default_index_name(table: &str, columns: &[String]) -> String {
    format!("{table}_{}_index", columns.join("_"))
}

pub(crate) fn sql_create_index(
    name: &str,
    table: &str,
    columns: &[String],
    unique: bool,
) -> Result<String> {
    let quoted = columns
        .iter()
        .map(|column| quote_identifier(column))
        .collect::<Result<Vec<String>>>()?
        .join(", ");
    let keyword = if unique { "CREATE UNIQUE INDEX" } else { "CREATE INDEX" };
    Ok(format!(
        "{keyword} {} ON {} ({quoted})",
        quote_identifier(name)?,
        quote_identifier(table)?
    ))
}

pub(crate) fn sql_select_rowids(table: &str) -> Result<String> {
    Ok(format!("SELECT rowid FROM {}", quote_identifier(table)?))
}

pub(crate) fn sql_update_by_rowid(table: &str, column: &str) -> Result<String> {
    Ok(format!(
        "UPDATE {} SET {} = ?1 WHERE rowid = ?2",
        quote_identifier(table)?,
        quote_identifier(column)?
    ))
}

/// Select `rowid` plus the seed string for the deterministic identifier.
///
/// Each listed column contributes its engine-rendered text, with NULL
/// contributing the empty string, so the seed is byte-stable across runs.
pub(crate) fn sql_select_rowid_and_seed(table: &str, columns: &[String]) -> Result<String> {
    let seed = columns
        .iter()
        .map(|column| Ok(format!("COALESCE(CAST({} AS TEXT), '')", quote_identifier(column)?)))
        .collect::<Result<Vec<String>>>()?
        .join(" || ");
    Ok(format!("SELECT rowid, {seed} FROM {}", quote_identifier(table)?))
}
