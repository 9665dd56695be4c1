//! InvoiceGen desktop app.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use invoice_gen::InvoiceApp;
use invoice_gen::settings::AppSettings;

#[derive(Parser)]
#[command(name = "invoice-gen", version, about = "Instant invoice generator")]
struct Cli {
    /// Settings file to read instead of the platform default
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Tracing filter, e.g. `debug` or `invoice_gen=trace`. RUST_LOG wins when set.
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging is configured from the settings, so report a bad file only after init.
    let loaded = AppSettings::load(cli.config.as_deref());
    let log_filter = match (&cli.log_level, &loaded) {
        (Some(filter), _) => filter.clone(),
        (None, Ok(settings)) => settings.log_filter.clone(),
        (None, Err(_)) => AppSettings::default().log_filter,
    };
    init_tracing(&log_filter);

    let settings = match loaded {
        Ok(settings) => {
            tracing::info!(
                path = %cli.config.clone().unwrap_or_else(AppSettings::config_path).display(),
                "Settings loaded"
            );
            settings
        }
        Err(e) => {
            tracing::warn!("{}; using defaults", e);
            AppSettings::default()
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("InvoiceGen")
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "InvoiceGen",
        options,
        Box::new(move |cc| Ok(Box::new(InvoiceApp::new(cc, settings)))),
    )
    .map_err(|e| anyhow::anyhow!("{}", e))
    .context("Failed to start the invoice window")
}

fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
