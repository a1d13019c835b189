mod app;
mod calendar;
mod config;
mod dates;
mod listener;
mod picker;
mod theme;
mod toggle;
mod ui;

use anyhow::{Context, Result};
use app::App;
use config::AppConfig;
use dates::{DateUtilities, Period};
use theme::ThemeConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        // ── dp format <value> ─────────────────────────────────────────────────
        Some("format") => cmd_format(args.get(2).map(String::as_str).unwrap_or("")),
        // ── dp month [value] ──────────────────────────────────────────────────
        Some("month")  => cmd_month(args.get(2).map(String::as_str).unwrap_or("")),
        // ── dp (TUI) ──────────────────────────────────────────────────────────
        _ => run_tui(),
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_stderr_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// ─── One-shot commands ────────────────────────────────────────────────────────

fn cmd_format(value: &str) -> Result<()> {
    init_stderr_logging();
    let cfg   = AppConfig::load()?;
    let utils = DateUtilities::new(cfg.display_format());
    println!("{}", utils.value_to_input_format(value));
    Ok(())
}

fn cmd_month(value: &str) -> Result<()> {
    init_stderr_logging();
    let cfg       = AppConfig::load()?;
    let utils     = DateUtilities::new(cfg.display_format());
    let disabled  = cfg.disabled.predicate()?;
    let today     = dates::today();
    let period: Period = utils.get_period_from_value(value);

    let text = ui::month_text(
        &utils,
        period,
        value,
        today,
        &|d: chrono::NaiveDate| disabled.as_ref().is_some_and(|f| f(d)),
    );
    print!("{text}");
    Ok(())
}

// ─── TUI ─────────────────────────────────────────────────────────────────────

fn run_tui() -> Result<()> {
    let log_dir = dirs::data_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("datepicker");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "datepicker.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    tracing::info!("Starting date picker");

    let cfg   = AppConfig::load().context("loading config.toml")?;
    let theme = ThemeConfig::load(&cfg.theme).context("loading theme")?;

    let mut app = App::from_config(&cfg, theme)?;
    app.run()?;

    println!("{}", serde_json::to_string_pretty(&app.values())?);
    Ok(())
}
