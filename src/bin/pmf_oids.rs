use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use pmf_chansons::app::TracingSink;
use pmf_chansons::lfs::SystemLfsClient;
use pmf_chansons::output::TextOutput;
use pmf_chansons::reconcile::Reconciler;

#[derive(Parser)]
#[command(name = "pmf-oids")]
#[command(about = "Record the Git LFS object id of every .mp3 into its chanson.md")]
#[command(version)]
struct Cli {
    /// Root of the song tree, e.g. site/chansons
    directory: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(report) = run(cli) {
        tracing::error!("{report:?}");
        return ExitCode::from(2);
    }
    ExitCode::SUCCESS
}

fn run(cli: Cli) -> miette::Result<()> {
    tracing::info!("[oids] starting in {}", cli.directory.display());
    let reconciler = Reconciler::new(SystemLfsClient::new());
    let oids = reconciler.reconcile(&cli.directory, &TracingSink)?;
    TextOutput::print_oids(&oids).into_diagnostic()?;
    Ok(())
}
