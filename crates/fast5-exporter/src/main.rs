use anyhow::Result;
use clap::Parser;
use fast5_exporter::app::ApplicationBuilder;
use fast5_exporter::cmd::scan::run_scan;
use fast5_exporter::config::Cli;
use fast5_exporter::config::Commands;
use fast5_exporter::config::ExporterArgs;
use fast5_exporter::config::ServeArgs;
use utils::version;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(serve_args) => run_serve(*serve_args).await,
        Commands::Scan(exporter_args) => run_scan_once(*exporter_args).await,
    }
}

async fn run_serve(serve_args: ServeArgs) -> Result<()> {
    let _guard = utils::logging::init(serve_args.exporter.log_dir.as_deref());

    tracing::info!("Starting fast5 exporter {}", &**version::VERSION);

    let app = ApplicationBuilder::new(serve_args).build()?;

    app.run().await?;
    app.shutdown().await?;

    Ok(())
}

async fn run_scan_once(exporter_args: ExporterArgs) -> Result<()> {
    let _guard = utils::logging::init(exporter_args.log_dir.as_deref());

    tracing::info!("Running single scan, fast5 exporter {}", &**version::VERSION);

    run_scan(&exporter_args, &mut std::io::stdout().lock()).await
}
