//! Per-service optimization pipelines.
//!
//! The two pipelines deliberately diverge: OWS needs identifiers on every
//! table, so it processes the whole catalog; OAF needs spatial extents only
//! where configured, so with a configuration it skips unlisted tables.

mod oaf;
mod ows;

pub use oaf::{EXTERNAL_FID_NAMESPACE, optimize_oaf};
pub use ows::optimize_ows;
