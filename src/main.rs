//! tiffscope - prints the directory structure of a TIFF container

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiffscope::formats::tiff::{GpsInfo, LayoutIssue};
use tiffscope::{ByteSourceFile, FormatCompliance, ReadOptions, Result, TiffContents, TiffReader};

/// Inspect the directories, tags and image payloads of a TIFF or EXIF file.
#[derive(Parser, Debug)]
#[command(name = "tiffscope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File to inspect
    file: PathBuf,

    /// Fail on the first structural deviation
    #[arg(long, env = "TIFFSCOPE_STRICT")]
    strict: bool,

    /// Also locate strips, tiles and JPEG thumbnails
    #[arg(long)]
    thumbnails: bool,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,

    /// Report gaps and overlaps in the byte layout
    #[arg(long)]
    dissect: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn read_options(&self) -> ReadOptions {
        ReadOptions::new()
            .with_strict(self.strict)
            .with_thumbnails(self.thumbnails)
    }
}

#[derive(Serialize)]
struct Report<'a> {
    contents: &'a TiffContents,
    #[serde(skip_serializing_if = "Option::is_none")]
    gps: Option<GpsInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    layout: Option<Vec<LayoutIssue>>,
    compliance: &'a FormatCompliance,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}: {}", cli.file.display(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let source = ByteSourceFile::open(&cli.file)?;
    let mut reader = TiffReader::new(&source, cli.read_options());
    let contents = reader.read_contents()?;
    let compliance = reader.into_compliance();

    let gps = match contents.gps() {
        Ok(gps) => gps,
        Err(e) => {
            debug!("GPS directory not decodable: {}", e);
            None
        }
    };
    let layout = cli.dissect.then(|| contents.dissect());

    if cli.json {
        let report = Report {
            contents: &contents,
            gps,
            layout,
            compliance: &compliance,
        };
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| tiffscope::Error::InvalidFormat(format!("JSON output: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    println!("{}", contents);
    if let Some(gps) = gps {
        println!("{}", gps);
    }
    if let Some(issues) = layout {
        println!("Layout:");
        if issues.is_empty() {
            println!("  No gaps or overlaps.");
        }
        for issue in issues {
            println!("  {}", issue);
        }
        println!();
    }
    print!("{}", compliance);
    Ok(())
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose { "tiffscope=debug" } else { "tiffscope=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
