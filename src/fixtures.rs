//! In-memory GeoPackage fixtures shared by the crate's tests.

use crate::gateway::Gateway;
use crate::geom::geometry_to_gpkg_blob;
use geo_types::Point;
use rusqlite::params;

/// A package with a content catalog and nothing registered in it.
pub(crate) fn empty_package() -> Gateway {
    let gateway = Gateway::open_in_memory().expect("open in-memory package");
    gateway
        .connection()
        .execute_batch(
            "CREATE TABLE gpkg_contents (
               table_name TEXT NOT NULL PRIMARY KEY,
               data_type TEXT NOT NULL,
               identifier TEXT UNIQUE,
               description TEXT DEFAULT '',
               min_x DOUBLE,
               min_y DOUBLE,
               max_x DOUBLE,
               max_y DOUBLE,
               srs_id INTEGER
             );",
        )
        .expect("create content catalog");
    gateway
}

/// Create a feature table, register it in the catalog, and insert one point
/// feature per coordinate pair.
pub(crate) fn add_feature_table(
    gateway: &Gateway,
    table: &str,
    extra_columns: &str,
    points: &[(f64, f64)],
) {
    gateway
        .connection()
        .execute_batch(&format!(
            r#"CREATE TABLE "{table}" (fid INTEGER PRIMARY KEY AUTOINCREMENT, geom BLOB{extra_columns});"#
        ))
        .expect("create feature table");
    gateway
        .connection()
        .execute(
            "INSERT INTO gpkg_contents (table_name, data_type) VALUES (?1, 'features')",
            params![table],
        )
        .expect("register table in catalog");

    for (x, y) in points {
        let blob = geometry_to_gpkg_blob(&Point::new(*x, *y), 4326);
        gateway
            .connection()
            .execute(
                &format!(r#"INSERT INTO "{table}" (geom) VALUES (?1)"#),
                params![blob],
            )
            .expect("insert feature");
    }
}

pub(crate) fn index_names(gateway: &Gateway, table: &str) -> Vec<String> {
    let mut stmt = gateway
        .connection()
        .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = ?1 ORDER BY name")
        .expect("prepare index query");
    let names = stmt
        .query_map(params![table], |row| row.get(0))
        .expect("query indexes")
        .collect::<Result<Vec<String>, _>>()
        .expect("collect indexes");
    names
}

/// Column names of an index, in index order.
pub(crate) fn index_columns(gateway: &Gateway, index: &str) -> Vec<String> {
    let mut stmt = gateway
        .connection()
        .prepare(&format!(
            "SELECT name FROM pragma_index_info('{index}') ORDER BY seqno"
        ))
        .expect("prepare index_info query");
    let columns = stmt
        .query_map([], |row| row.get(0))
        .expect("query index columns")
        .collect::<Result<Vec<String>, _>>()
        .expect("collect index columns");
    columns
}
