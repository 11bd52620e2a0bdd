use crate::config::OwsConfig;
use crate::error::Result;
use crate::gateway::Gateway;
use crate::sql::{self, ColumnType};
use rusqlite::params;
use tracing::info;
use uuid::Uuid;

/// Run the OWS pipeline over every table in the package.
///
/// Each table gains a process-local random identifier (`puuid`) and a
/// human-readable fully-qualified identifier (`fuuid` = `<table>.<puuid>`),
/// both uniquely indexed. Configured extra indexes are created afterwards,
/// once the whole specification list has been validated.
pub fn optimize_ows(gateway: &mut Gateway, config: Option<&OwsConfig>) -> Result<()> {
    for table in gateway.table_names()? {
        gateway.add_column(&table, "puuid", ColumnType::Text)?;
        backfill_puuid(gateway, &table)?;
        gateway.create_index(&table, &["puuid".to_string()], None, true)?;

        gateway.add_column(&table, "fuuid", ColumnType::Text)?;
        gateway.set_column(&table, "fuuid", &qualified_id_expression(&table)?)?;
        gateway.create_index(&table, &["fuuid".to_string()], None, true)?;
    }

    if let Some(config) = config {
        config.validate()?;
        for spec in &config.indices {
            gateway.create_index(&spec.table, &spec.columns, Some(&spec.name), spec.unique)?;
        }
    }

    Ok(())
}

// Safe to splice: the table name passed identifier validation.
fn qualified_id_expression(table: &str) -> Result<String> {
    sql::validate_identifier(table)?;
    Ok(format!(r#"'{table}.' || "puuid""#))
}

/// Write a fresh random identifier into every row, inside one transaction
/// per table. A failing row rolls the whole table's backfill back.
fn backfill_puuid(gateway: &mut Gateway, table: &str) -> Result<()> {
    info!("generating puuid values for table '{table}'");
    let rowids = collect_rowids(gateway, table)?;
    let update = sql::sql_update_by_rowid(table, "puuid")?;

    let tx = gateway.transaction()?;
    {
        let mut stmt = tx.prepare(&update)?;
        for rowid in &rowids {
            stmt.execute(params![Uuid::new_v4().to_string(), rowid])?;
        }
    }
    tx.commit()?;

    info!(
        "finished setting puuid values for table '{table}' ({} rows)",
        rowids.len()
    );
    Ok(())
}

fn collect_rowids(gateway: &Gateway, table: &str) -> Result<Vec<i64>> {
    let mut stmt = gateway
        .connection()
        .prepare(&sql::sql_select_rowids(table)?)?;
    let rowids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<i64>, _>>()?;
    Ok(rowids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn unique_index_exists(gateway: &Gateway, name: &str) -> bool {
        let count: i64 = gateway
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'index' AND name = ?1 AND sql LIKE 'CREATE UNIQUE INDEX%'",
                params![name],
                |row| row.get(0),
            )
            .expect("query sqlite_master");
        count == 1
    }

    #[test]
    fn derives_identifiers_for_every_table() -> Result<()> {
        let mut gateway = fixtures::empty_package();
        fixtures::add_feature_table(&gateway, "roads", "", &[(0.0, 0.0), (1.0, 1.0)]);
        fixtures::add_feature_table(&gateway, "parcels", "", &[(2.0, 2.0)]);

        optimize_ows(&mut gateway, None)?;

        for table in ["roads", "parcels"] {
            let columns = gateway.table_columns(table)?;
            assert!(columns.contains(&"puuid".to_string()));
            assert!(columns.contains(&"fuuid".to_string()));
            assert!(unique_index_exists(&gateway, &format!("{table}_puuid_index")));
            assert!(unique_index_exists(&gateway, &format!("{table}_fuuid_index")));
        }

        // fuuid is the table-qualified puuid, row by row.
        let mut stmt = gateway
            .connection()
            .prepare("SELECT puuid, fuuid FROM roads")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<std::result::Result<Vec<(String, String)>, _>>()?;
        assert_eq!(rows.len(), 2);
        for (puuid, fuuid) in &rows {
            assert_eq!(fuuid, &format!("roads.{puuid}"));
        }
        assert_ne!(rows[0].0, rows[1].0);
        Ok(())
    }

    #[test]
    fn puuid_differs_between_runs() -> Result<()> {
        let mut first = fixtures::empty_package();
        fixtures::add_feature_table(&first, "roads", "", &[(0.0, 0.0)]);
        optimize_ows(&mut first, None)?;

        let mut second = fixtures::empty_package();
        fixtures::add_feature_table(&second, "roads", "", &[(0.0, 0.0)]);
        optimize_ows(&mut second, None)?;

        let read = |gateway: &Gateway| -> Result<String> {
            Ok(gateway
                .connection()
                .query_row("SELECT puuid FROM roads", [], |row| row.get(0))?)
        };
        assert_ne!(read(&first)?, read(&second)?);
        Ok(())
    }

    #[test]
    fn second_run_fails_on_existing_column() -> Result<()> {
        let mut gateway = fixtures::empty_package();
        fixtures::add_feature_table(&gateway, "roads", "", &[(0.0, 0.0)]);

        optimize_ows(&mut gateway, None)?;
        assert!(optimize_ows(&mut gateway, None).is_err());
        Ok(())
    }

    #[test]
    fn creates_configured_indexes() -> Result<()> {
        let mut gateway = fixtures::empty_package();
        fixtures::add_feature_table(&gateway, "roads", ", name TEXT", &[(0.0, 0.0)]);

        let config = OwsConfig::from_json(
            r#"{"indices": [{"table": "roads", "columns": ["name"], "name": "roads_name_idx", "unique": false}]}"#,
        )?;
        optimize_ows(&mut gateway, Some(&config))?;

        assert!(fixtures::index_names(&gateway, "roads").contains(&"roads_name_idx".to_string()));
        assert_eq!(fixtures::index_columns(&gateway, "roads_name_idx"), vec!["name"]);
        Ok(())
    }

    #[test]
    fn duplicate_index_name_aborts_before_any_creation() -> Result<()> {
        let mut gateway = fixtures::empty_package();
        fixtures::add_feature_table(&gateway, "roads", ", name TEXT, ref TEXT", &[(0.0, 0.0)]);

        let config = OwsConfig::from_json(
            r#"{"indices": [
                {"table": "roads", "columns": ["name"], "name": "idx"},
                {"table": "roads", "columns": ["ref"], "name": "idx"}
            ]}"#,
        )?;
        assert!(optimize_ows(&mut gateway, Some(&config)).is_err());
        assert!(!fixtures::index_names(&gateway, "roads").contains(&"idx".to_string()));
        Ok(())
    }

    #[test]
    fn configured_index_on_missing_column_is_fatal() -> Result<()> {
        let mut gateway = fixtures::empty_package();
        fixtures::add_feature_table(&gateway, "roads", "", &[(0.0, 0.0)]);

        let config = OwsConfig::from_json(
            r#"{"indices": [{"table": "roads", "columns": ["no_such"], "name": "idx"}]}"#,
        )?;
        assert!(optimize_ows(&mut gateway, Some(&config)).is_err());
        Ok(())
    }
}
