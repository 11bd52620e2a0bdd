//! Spatial capability bootstrap.
//!
//! The pipelines only need the extent functions (`ST_MinX` and friends), but
//! hosts that ship SpatiaLite get the full spatial SQL surface. Strategies
//! are ranked: runtime extension candidates first, then the crate's built-in
//! registered functions. Extension loading on some hosts fails transiently
//! while dynamic libraries settle, hence the bounded retry.

use crate::sql_functions::register_envelope_functions;
use rusqlite::{Connection, LoadExtensionGuard};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How the spatial SQL functions became available, if at all.
#[derive(Clone, Debug, PartialEq)]
pub enum SpatialCapability {
    /// A runtime extension was loaded from this path.
    Extension(PathBuf),
    /// The crate's built-in envelope functions were registered.
    Builtin,
    /// No strategy succeeded; spatial expressions fail at the point of use.
    Unavailable,
}

/// Strategy list and bounded-retry policy for [`ensure_spatial_capability`].
#[derive(Clone, Debug)]
pub struct SpatialLoadOptions {
    /// Rounds of extension loading before falling back.
    pub attempts: u32,
    /// Pause between rounds.
    pub retry_delay: Duration,
    /// Candidate extension names or paths, tried in order each round.
    pub extension_candidates: Vec<PathBuf>,
    /// Register the built-in envelope functions when no extension loads.
    pub builtin_fallback: bool,
}

impl Default for SpatialLoadOptions {
    fn default() -> Self {
        Self {
            attempts: 3,
            retry_delay: Duration::from_millis(500),
            extension_candidates: default_candidates(),
            builtin_fallback: true,
        }
    }
}

impl SpatialLoadOptions {
    /// Built-in functions only. Used for in-memory packages and tests, where
    /// probing the host for loadable extensions is unwanted.
    pub fn builtin_only() -> Self {
        Self {
            attempts: 1,
            retry_delay: Duration::ZERO,
            extension_candidates: Vec::new(),
            builtin_fallback: true,
        }
    }
}

fn default_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![
        PathBuf::from("mod_spatialite"),
        PathBuf::from("./mod_spatialite"),
    ];
    if let Some(dir) = executable_dir() {
        candidates.push(dir.join("mod_spatialite"));
    }
    candidates
}

fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(Path::to_path_buf))
}

/// Make the spatial SQL functions available on the connection.
///
/// Never fails: when every strategy is exhausted the connection is returned
/// degraded, and statements using spatial functions fail when executed.
pub fn ensure_spatial_capability(
    conn: &Connection,
    options: &SpatialLoadOptions,
) -> SpatialCapability {
    adjust_search_path();

    for attempt in 1..=options.attempts.max(1) {
        if attempt > 1 {
            debug!(
                "retrying spatial extension loading, attempt {attempt} of {}",
                options.attempts
            );
            std::thread::sleep(options.retry_delay);
        }
        for candidate in &options.extension_candidates {
            match load_extension(conn, candidate) {
                Ok(()) => {
                    info!("loaded spatial extension from '{}'", candidate.display());
                    return SpatialCapability::Extension(candidate.clone());
                }
                Err(err) => {
                    debug!(
                        "could not load spatial extension from '{}': {err}",
                        candidate.display()
                    );
                }
            }
        }
        if options.extension_candidates.is_empty() {
            break;
        }
    }

    if options.builtin_fallback {
        match register_envelope_functions(conn) {
            Ok(()) => {
                info!("registered built-in envelope functions");
                return SpatialCapability::Builtin;
            }
            Err(err) => warn!("could not register built-in envelope functions: {err}"),
        }
    }

    warn!("spatial capability unavailable; extent expressions will fail when used");
    SpatialCapability::Unavailable
}

fn load_extension(conn: &Connection, path: &Path) -> rusqlite::Result<()> {
    // The guard re-disables extension loading when it drops.
    unsafe {
        let _guard = LoadExtensionGuard::new(conn)?;
        conn.load_extension(path, None::<&str>)
    }
}

// Extension DLLs commonly sit next to the executable on Windows; that
// directory must be searched first for their dependencies to resolve.
#[cfg(windows)]
fn adjust_search_path() {
    let Some(dir) = executable_dir() else {
        return;
    };
    let current = std::env::var_os("PATH").unwrap_or_default();
    let mut parts = vec![dir];
    parts.extend(std::env::split_paths(&current));
    if let Ok(joined) = std::env::join_paths(parts) {
        // Single-threaded startup path; no concurrent readers of PATH.
        unsafe { std::env::set_var("PATH", joined) };
    }
}

#[cfg(not(windows))]
fn adjust_search_path() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_only_registers_functions() -> crate::Result<()> {
        let conn = Connection::open_in_memory()?;
        let capability = ensure_spatial_capability(&conn, &SpatialLoadOptions::builtin_only());
        assert_eq!(capability, SpatialCapability::Builtin);

        let minx: Option<f64> = conn.query_row("SELECT ST_MinX(NULL)", [], |row| row.get(0))?;
        assert!(minx.is_none());
        Ok(())
    }

    #[test]
    fn falls_back_past_missing_extension() -> crate::Result<()> {
        let conn = Connection::open_in_memory()?;
        let options = SpatialLoadOptions {
            attempts: 2,
            retry_delay: Duration::ZERO,
            extension_candidates: vec![PathBuf::from("definitely_not_a_spatial_extension")],
            builtin_fallback: true,
        };
        assert_eq!(
            ensure_spatial_capability(&conn, &options),
            SpatialCapability::Builtin
        );
        Ok(())
    }

    #[test]
    fn degrades_to_unavailable() -> crate::Result<()> {
        let conn = Connection::open_in_memory()?;
        let options = SpatialLoadOptions {
            attempts: 1,
            retry_delay: Duration::ZERO,
            extension_candidates: Vec::new(),
            builtin_fallback: false,
        };
        assert_eq!(
            ensure_spatial_capability(&conn, &options),
            SpatialCapability::Unavailable
        );

        // Degraded mode fails loudly at the point of use.
        let result: rusqlite::Result<Option<f64>> =
            conn.query_row("SELECT ST_MinX(NULL)", [], |row| row.get(0));
        assert!(result.is_err());
        Ok(())
    }
}
