use clap::Parser;
use clap::Subcommand;
use utils::version;

use crate::config::exporter::ExporterArgs;
use crate::config::exporter::ServeArgs;

#[derive(Parser)]
#[command(about, long_about, version = &**version::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve metrics over HTTP until terminated
    Serve(Box<ServeArgs>),
    /// Run a single scan pass and print the metrics to stdout
    Scan(Box<ExporterArgs>),
}
