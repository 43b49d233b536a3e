use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use seabed::config::{ExperimentConfig, Scenario};
use seabed::harness::{run_all, sac_agent};
use seabed::report::{format_table, plot_comparison, save_csv};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ExperimentConfig::from_env().context("failed to load experiment config")?;
    tch::manual_seed(config.seed as i64);
    tracing::info!(
        "Running {} scenarios, {} training steps each",
        Scenario::canonical().len(),
        config.sac.total_steps
    );

    let sac = config.sac.clone();
    let results = run_all(&config, |env, scenario, seed| {
        sac_agent(env, scenario, seed, &sac)
    })?;

    save_csv(&config.output_csv, &results)
        .with_context(|| format!("failed to write {}", config.output_csv.display()))?;
    if let Some(chart) = &config.output_chart {
        plot_comparison(&results, &chart.to_string_lossy())?;
    }

    print!("{}", format_table(&results));
    Ok(())
}
