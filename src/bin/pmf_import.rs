use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use pmf_chansons::app::{App, ImportOptions, TracingSink};
use pmf_chansons::config::ConfigLoader;
use pmf_chansons::error::SongError;
use pmf_chansons::output::JsonOutput;
use pmf_chansons::site::SiteHttpClient;

#[derive(Parser)]
#[command(name = "pmf-import")]
#[command(about = "Import songs from pardon-my-french.fr into chanson.md files")]
#[command(version)]
struct Cli {
    /// Directory that receives one folder per song
    #[arg(long)]
    output: Option<Utf8PathBuf>,

    /// Download audio files even when they already exist locally
    #[arg(long)]
    force_download: bool,

    /// JSON config file (defaults to ./pmf-chansons.json when present)
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    base_url: Option<String>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<SongError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &SongError) -> u8 {
    match error {
        SongError::ConfigRead(_) | SongError::ConfigParse(_) => 2,
        SongError::Http(_) | SongError::HttpStatus { .. } | SongError::Listing(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ConfigLoader::resolve(cli.config.as_deref())?;
    if let Some(output) = cli.output {
        config.output = output;
    }
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url.trim_end_matches('/').to_string();
    }

    let client = SiteHttpClient::new(&config)?;
    let app = App::new(client, config);
    let report = app.import(
        ImportOptions {
            force_download: cli.force_download,
        },
        &TracingSink,
    )?;

    if cli.json {
        JsonOutput::print_import(&report).into_diagnostic()?;
    }
    tracing::info!("[songs] done");
    Ok(())
}
