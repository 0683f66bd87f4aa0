use anyhow::Result;
use std::{fs, path::Path};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use tripcrunch::{ingest, normalize, report};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) configure paths ──────────────────────────────────────────
    let input_path = Path::new("driver_week_sample.csv");
    let reports_dir = Path::new("reports");
    fs::create_dir_all(reports_dir)?;

    // ─── 3) load driver-week rows ────────────────────────────────────
    let wide_rows = ingest::load_wide_csv(input_path)?;
    info!("{} driver-week rows loaded", wide_rows.len());

    // ─── 4) one row per reported vehicle ─────────────────────────────
    let long_rows = normalize::normalize(&wide_rows);
    info!("{} driver-week-vehicle rows", long_rows.len());

    // ─── 5) grouped means → report files ─────────────────────────────
    report::write_all_reports(&long_rows, reports_dir)?;

    info!("all done");
    Ok(())
}
