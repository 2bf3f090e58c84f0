use std::{fs, io::Write, path::PathBuf};

use clap::Parser;
use routecost::{
    config::{PipelineConfig, Settings},
    models::BatchRow,
    ors::OrsClient,
    run_batch,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Route and cost a batch of loads through openrouteservice"
)]
struct Args {
    /// JSON array of rows ({load_id, coordinates, manual_km}) or plain text
    /// with one coordinate per line
    #[arg(long)]
    input: PathBuf,

    /// Manual kilometers added to a plain-text load
    #[arg(long, default_value_t = 0.0)]
    manual_km: f64,

    /// Pipeline config JSON (overrides ROUTECOST_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let settings = Settings::from_env();
    let config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => settings.pipeline()?,
    };

    let text = fs::read_to_string(&args.input)?;
    let rows = parse_rows(&text, args.manual_km)?;
    tracing::info!("read {} rows from {:?}", rows.len(), args.input);

    let client = OrsClient::new(&settings.base_url, settings.api_key()?, &config.profile)?;
    let report = run_batch(&client, &config, &rows)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    match &args.output {
        Some(path) => {
            fs::write(path, json)?;
            tracing::info!("report written to {:?}", path);
        }
        None => writeln!(std::io::stdout(), "{json}")?,
    }

    Ok(())
}

/// JSON input is taken as rows; anything else is one coordinate per line
/// forming a single implicit load.
fn parse_rows(text: &str, manual_km: f64) -> Result<Vec<BatchRow>, serde_json::Error> {
    if text.trim_start().starts_with('[') {
        return serde_json::from_str(text);
    }

    let mut rows: Vec<BatchRow> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| BatchRow {
            load_id: None,
            coordinates: line.to_string(),
            manual_km: None,
        })
        .collect();
    if let Some(first) = rows.first_mut() {
        first.manual_km = Some(manual_km);
    }
    Ok(rows)
}
