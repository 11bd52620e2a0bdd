use clap::{Parser, ValueEnum};
use gpkg_optimizer::{Gateway, OafConfig, OwsConfig, Result, optimize_oaf, optimize_ows};
use std::path::PathBuf;
use tracing::{error, info};

/// Optimize a GeoPackage for serving through an OGC web service.
#[derive(Parser, Debug)]
#[command(name = "optimize_gpkg")]
#[command(about = "Optimize a GeoPackage for serving through an OWS or OAF service")]
struct Cli {
    /// Source GeoPackage, optimized in place.
    #[arg(short = 's', value_name = "GEOPACKAGE", default_value = "empty")]
    source: PathBuf,

    /// Service type to optimize the GeoPackage for.
    #[arg(long = "service-type", value_enum, default_value = "ows")]
    service_type: ServiceType,

    /// Optional inline JSON config for additional optimizations.
    #[arg(long)]
    config: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ServiceType {
    Ows,
    Oaf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    if let Err(err) = run(Cli::parse()) {
        error!("optimization failed: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.service_type {
        ServiceType::Ows => {
            info!(
                "performing OWS optimizations for geopackage: '{}'",
                cli.source.display()
            );
            let config = cli.config.as_deref().map(OwsConfig::from_json).transpose()?;
            let mut gateway = Gateway::open(&cli.source)?;
            optimize_ows(&mut gateway, config.as_ref())
        }
        ServiceType::Oaf => {
            info!(
                "performing OAF optimizations for geopackage: '{}'",
                cli.source.display()
            );
            let config = cli.config.as_deref().map(OafConfig::from_json).transpose()?;
            let mut gateway = Gateway::open(&cli.source)?;
            optimize_oaf(&mut gateway, config.as_ref())
        }
    }
}
