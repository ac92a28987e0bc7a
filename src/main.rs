//! LENDSCORE — profit-driven credit decisions.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! reads the scored loan file, runs the threshold search and allocation
//! ranking, and writes the combined report to disk.

use anyhow::Result;
use tracing::info;

use lendscore::config;
use lendscore::data::csv::CsvProvider;
use lendscore::storage;
use lendscore::strategy::{CreditStrategy, PolicyReport};

const BANNER: &str = r#"
 _     _____ _   _ ____  ____   ____ ___  ____  _____
| |   | ____| \ | |  _ \/ ___| / ___/ _ \|  _ \| ____|
| |   |  _| |  \| | | | \___ \| |  | | | | |_) |  _|
| |___| |___| |\  | |_| |___) | |__| |_| |  _ <| |___
|_____|_____|_| \_|____/|____/ \____\___/|_| \_\_____|

  Profit thresholds & capital allocation for scored loans
  v0.1.0
"#;

fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var("LENDSCORE_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");
    info!(
        config = %config_path,
        input = %cfg.input.path,
        grid_points = cfg.threshold.grid.steps,
        parallel = cfg.threshold.parallel,
        "LENDSCORE starting up"
    );

    if let Some(previous) = storage::load_report(Some(&cfg.output.report_path))? {
        info!(
            run_id = %previous.run_id,
            generated_at = %previous.generated_at,
            best_threshold = format!("{:.2}", previous.threshold.best_threshold),
            "Previous report will be replaced"
        );
    }

    let provider = CsvProvider::new(&cfg.input.path, cfg.input.columns.clone());
    let strategy = CreditStrategy::new(
        cfg.payoff,
        cfg.threshold,
        cfg.diagnostics.calibration_bins,
    );

    let report = strategy.run_from(&provider)?;
    log_report(&report);

    storage::save_report(&report, Some(&cfg.output.report_path))?;
    info!(path = %cfg.output.report_path, run_id = %report.run_id, "Report written");

    Ok(())
}

/// Log a human-readable run summary.
fn log_report(report: &PolicyReport) {
    info!(
        threshold = format!("{:.2}", report.reference.threshold),
        profit = format!("${:.2}", report.reference.net_profit),
        accuracy = format!("{:.2}%", report.reference.accuracy * 100.0),
        "Reference threshold"
    );
    info!(
        threshold = format!("{:.2}", report.threshold.best_threshold),
        profit = format!("${:.2}", report.threshold.best_profit),
        exposure = format!("${:.0}", report.optimal.total_exposure),
        rate_of_return = format!("{:.2}%", report.optimal.rate_of_return_pct),
        default_recall = format!("{:.2}%", report.optimal.default.recall * 100.0),
        "Optimal threshold"
    );
    info!(
        best_fraction = format!("{:.2}%", report.allocation.best_fraction * 100.0),
        cutoff = format!("{:.4}", report.allocation.best_cutoff),
        cumulative_profit = format!("${:.2}", report.allocation.best_cumulative_profit),
        funded = report.allocation.funded_count(),
        "Capital allocation"
    );
    info!(
        brier = format!("{:.4}", report.diagnostics.brier_score),
        roc_auc = ?report.diagnostics.roc_auc,
        "Score diagnostics"
    );
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lendscore=info"));

    let json_logging = std::env::var("LENDSCORE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
