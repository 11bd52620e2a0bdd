use crate::config::{LayerConfig, OafConfig};
use crate::error::Result;
use crate::gateway::Gateway;
use crate::sql::{self, ColumnType};
use rusqlite::params;
use tracing::{info, warn};
use uuid::Uuid;

/// Namespace for deterministic external identifiers
/// (`098c4e26-6e36-5693-bae9-df35db0bee49`). Fixed so identifiers stay
/// stable across re-imports of the same logical entity.
pub const EXTERNAL_FID_NAMESPACE: Uuid =
    Uuid::from_u128(0x098c4e26_6e36_5693_bae9_df35db0bee49);

const EXTENT_COLUMNS: [(&str, &str); 4] = [
    ("minx", "ST_MinX"),
    ("maxx", "ST_MaxX"),
    ("miny", "ST_MinY"),
    ("maxy", "ST_MaxY"),
];

/// Run the OAF pipeline.
///
/// Without a configuration, every catalog table receives the default
/// optimization with the `fid`/`geom` column defaults. With one, only
/// configured tables are processed; the rest are skipped with a warning.
pub fn optimize_oaf(gateway: &mut Gateway, config: Option<&OafConfig>) -> Result<()> {
    let tables = gateway.table_names()?;

    match config {
        Some(config) => {
            for table in &tables {
                let Some(layer) = config.layers.get(table) else {
                    warn!("no config found for gpkg table '{table}'");
                    continue;
                };
                optimize_layer(gateway, table, layer)?;
                gateway.analyze()?;
            }
        }
        None => {
            let defaults = LayerConfig::default();
            for table in &tables {
                gateway.ensure_columns_exist(
                    table,
                    [defaults.fid_column.as_str(), defaults.geom_column.as_str()],
                )?;
                add_default_optimizations(gateway, table, &defaults)?;
                gateway.analyze()?;
            }
        }
    }

    Ok(())
}

fn optimize_layer(gateway: &mut Gateway, table: &str, layer: &LayerConfig) -> Result<()> {
    // Configured statements run first, so they can shape the table the rest
    // of the pipeline sees.
    for statement in &layer.sql_statements {
        gateway.execute(statement)?;
    }

    validate_layer_columns(gateway, table, layer)?;

    if let Some(columns) = layer.external_fid_columns() {
        gateway.add_column(table, "external_fid", ColumnType::Text)?;
        backfill_external_fid(gateway, table, columns)?;
        gateway.create_index(
            table,
            &["external_fid".to_string()],
            Some(&format!("{table}_external_fid_idx")),
            false,
        )?;
    }

    if let Some(columns) = layer.temporal_columns() {
        gateway.create_index(table, columns, Some(&format!("{table}_temporal_idx")), false)?;
    }

    add_default_optimizations(gateway, table, layer)
}

/// Every referenced column must exist before any mutation for the table.
fn validate_layer_columns(gateway: &Gateway, table: &str, layer: &LayerConfig) -> Result<()> {
    let mut referenced = vec![layer.fid_column.as_str(), layer.geom_column.as_str()];
    if let Some(columns) = layer.external_fid_columns() {
        referenced.extend(columns.iter().map(String::as_str));
    }
    if let Some(columns) = layer.temporal_columns() {
        referenced.extend(columns.iter().map(String::as_str));
    }
    gateway.ensure_columns_exist(table, referenced)
}

/// Add the four extent columns, populate them from the geometry column in
/// bulk, and build the composite index: identifier first, then the bounds,
/// then any temporal columns, so extent range queries can filter by time.
fn add_default_optimizations(gateway: &Gateway, table: &str, layer: &LayerConfig) -> Result<()> {
    let geom = sql::quote_identifier(&layer.geom_column)?;

    for (column, _) in EXTENT_COLUMNS {
        gateway.add_column(table, column, ColumnType::Numeric)?;
    }
    for (column, function) in EXTENT_COLUMNS {
        gateway.set_column(table, column, &format!("{function}({geom})"))?;
    }

    let mut columns = Vec::with_capacity(EXTENT_COLUMNS.len() + 3);
    columns.push(layer.fid_column.clone());
    columns.extend(EXTENT_COLUMNS.iter().map(|(column, _)| column.to_string()));
    if let Some(temporal) = layer.temporal_columns() {
        columns.extend(temporal.iter().cloned());
    }
    gateway.create_index(table, &columns, Some(&format!("{table}_spatial_idx")), false)
}

pub(crate) fn external_fid(table: &str, seed: &str) -> Uuid {
    Uuid::new_v5(&EXTERNAL_FID_NAMESPACE, format!("{table}{seed}").as_bytes())
}

/// Derive and store the deterministic identifier for every row, inside one
/// transaction per table.
///
/// The seed is the table name directly followed by each listed column's
/// engine-rendered text, NULL contributing the empty string; the identifier
/// is the version-5 UUID of the seed under [`EXTERNAL_FID_NAMESPACE`].
fn backfill_external_fid(gateway: &mut Gateway, table: &str, columns: &[String]) -> Result<()> {
    info!("deriving external_fid values for table '{table}'");
    let rows = collect_seeds(gateway, table, columns)?;
    let update = sql::sql_update_by_rowid(table, "external_fid")?;

    let tx = gateway.transaction()?;
    {
        let mut stmt = tx.prepare(&update)?;
        for (rowid, seed) in &rows {
            let id = external_fid(table, seed);
            stmt.execute(params![id.to_string(), rowid])?;
        }
    }
    tx.commit()?;

    info!(
        "finished setting external_fid values for table '{table}' ({} rows)",
        rows.len()
    );
    Ok(())
}

fn collect_seeds(gateway: &Gateway, table: &str, columns: &[String]) -> Result<Vec<(i64, String)>> {
    let mut stmt = gateway
        .connection()
        .prepare(&sql::sql_select_rowid_and_seed(table, columns)?)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<(i64, String)>, _>>()?;
    Ok(rows)
}
