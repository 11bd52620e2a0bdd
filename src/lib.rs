//! Optimize a GeoPackage for serving through an OGC web service.
//!
//! ## Overview
//!
//! The crate post-processes an existing GeoPackage in place, preparing it for
//! one of two serving modes:
//!
//! - **OWS**: every catalog table gains a random process-local identifier
//!   (`puuid`) and a table-qualified identifier (`fuuid`), both uniquely
//!   indexed, plus any extra indexes listed in the configuration.
//! - **OAF**: configured tables gain precomputed extent columns
//!   (`minx`/`maxx`/`miny`/`maxy`) with a composite index for range queries,
//!   optionally a deterministic `external_fid` and a temporal index.
//!
//! [`Gateway`] wraps the package connection and exposes the primitive schema
//! operations; [`optimize_ows`] and [`optimize_oaf`] drive them. Extent
//! values come from `ST_MinX`-style SQL functions, provided either by a
//! loadable spatial extension or by the crate's built-in registrations (see
//! [`ensure_spatial_capability`]).
//!
//! ## Short usage
//!
//! ```no_run
//! use gpkg_optimizer::{Gateway, OafConfig, optimize_oaf};
//!
//! let mut gateway = Gateway::open("data.gpkg")?;
//! let config = OafConfig::from_json(
//!     r#"{"layers": {"parcels": {"temporal_columns": ["valid_from"]}}}"#,
//! )?;
//! optimize_oaf(&mut gateway, Some(&config))?;
//! # Ok::<(), gpkg_optimizer::OptimizerError>(())
//! ```
//!
//! All schema mutations are applied directly to the source file; a run is not
//! idempotent (repeating it fails on the already-added columns) and any fatal
//! error aborts with the schema in the state the completed statements left
//! behind.

mod config;
mod error;
#[cfg(test)]
mod fixtures;
mod gateway;
mod geom;
mod optimize;
mod spatial;
mod sql;
mod sql_functions;

pub use config::{IndexSpec, LayerConfig, OafConfig, OwsConfig};
pub use error::{OptimizerError, Result};
pub use gateway::Gateway;
pub use optimize::{EXTERNAL_FID_NAMESPACE, optimize_oaf, optimize_ows};
pub use spatial::{SpatialCapability, SpatialLoadOptions, ensure_spatial_capability};
pub use sql::ColumnType;
pub use sql_functions::register_envelope_functions;
