mod config;
mod runner;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use intake_protocol::StatusTone;
use intake_widget::EndpointConfig;
use intake_widget::HttpTransport;
use intake_widget::IntakeConfig;
use intake_widget::PhotoFile;
use intake_widget::PhotoIntake;
use intake_widget::ProductForm;
use url::Url;

use crate::config::ConfigStore;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Select product photos and run debounced background analysis against an intake server"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze photos for one pickup/pallet and print the resulting view.
    Analyze(AnalyzeArgs),
    /// Persist default widget limits to the config file.
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Base URL of the intake server.
    #[arg(long, env = "INTAKE_BASE_URL")]
    base_url: Url,

    /// Pickup number the pallet belongs to.
    #[arg(long)]
    pickup: u64,

    /// Pallet (COD_ASSETS) identifier.
    #[arg(long)]
    pallet: u64,

    /// Subcategory options offered by the host form, for suggestion matching.
    #[arg(long, value_delimiter = ',')]
    subcategories: Vec<String>,

    /// Destination options offered by the host form, for suggestion matching.
    #[arg(long, value_delimiter = ',')]
    destinations: Vec<String>,

    /// Override the settle window (milliseconds) for this run.
    #[arg(long)]
    settle_ms: Option<u64>,

    /// Photo files, in selection order.
    #[arg(required = true)]
    photos: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Maximum number of photos per selection.
    #[arg(long)]
    max_photos: Option<u64>,

    /// Maximum aggregate photo size in bytes.
    #[arg(long)]
    max_total_bytes: Option<u64>,

    /// Settle window in milliseconds.
    #[arg(long)]
    settle_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    match Cli::parse().command {
        Command::Analyze(args) => run_analyze(args).await,
        Command::Config(args) => run_config(&args),
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

async fn run_analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let store = ConfigStore::new_default()?;
    let config = effective_config(&store, args.settle_ms)?;

    let endpoint = EndpointConfig::new(args.base_url, args.pickup, args.pallet)?;
    let transport = HttpTransport::new(&endpoint).context("build HTTP client")?;
    let form = ProductForm::new(args.subcategories, args.destinations);
    let (mut widget, mut events) = PhotoIntake::new(config, form, transport);

    let mut files = Vec::with_capacity(args.photos.len());
    for path in &args.photos {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("read photo {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("photo.jpg")
            .to_string();
        files.push(PhotoFile::new(name, bytes));
    }
    tracing::debug!("picked {} photo files from disk", files.len());

    runner::run_to_settlement(&mut widget, &mut events, files).await?;

    let view = widget.view();
    println!(
        "{}",
        serde_json::to_string_pretty(&view).context("encode view model")?
    );
    print_form(widget.form());

    let failure = (view.status.tone == StatusTone::Error).then(|| view.status.text.clone());
    widget.dispose();
    if let Some(message) = failure {
        anyhow::bail!("analysis failed: {message}");
    }
    Ok(())
}

fn print_form(form: &ProductForm) {
    println!("serial_number: {}", form.serial_number.value());
    println!("asset_tag: {}", form.asset_tag.value());
    println!("description: {}", form.description.value());
    println!("subcategory: {}", form.subcategory.value());
    println!("destination: {}", form.destination.value());
}

fn run_config(args: &ConfigArgs) -> anyhow::Result<()> {
    let store = ConfigStore::new_default()?;
    if let Some(count) = args.max_photos {
        store.set_max_photos(count)?;
    }
    if let Some(bytes) = args.max_total_bytes {
        store.set_max_total_bytes(bytes)?;
    }
    if let Some(millis) = args.settle_ms {
        store.set_settle_ms(millis)?;
    }

    let config = effective_config(&store, None)?;
    println!("config file: {}", store.path().display());
    println!("max_photos = {}", config.max_photos);
    println!("max_total_bytes = {}", config.max_total_bytes);
    println!("settle_ms = {}", config.settle_window.as_millis());
    Ok(())
}

/// Defaults, overlaid with the config file, overlaid with CLI overrides.
fn effective_config(
    store: &ConfigStore,
    settle_override: Option<u64>,
) -> anyhow::Result<IntakeConfig> {
    let mut config = IntakeConfig::default();
    if let Some(count) = store.max_photos()? {
        config.max_photos = usize::try_from(count).context("max_photos out of range")?;
    }
    if let Some(bytes) = store.max_total_bytes()? {
        config.max_total_bytes = bytes;
    }
    let settle_ms = match settle_override {
        Some(millis) => Some(millis),
        None => store.settle_ms()?,
    };
    if let Some(millis) = settle_ms {
        config.settle_window = Duration::from_millis(millis);
    }
    Ok(config)
}
