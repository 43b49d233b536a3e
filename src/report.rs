use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::harness::ExperimentResult;

pub const CSV_HEADER: &str = "scenario,sac_mean,sac_var,fixed_mean,fixed_var";

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn write_csv<W: Write>(mut out: W, results: &[ExperimentResult]) -> Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for r in results {
        writeln!(
            out,
            "{},{},{},{},{}",
            csv_field(&r.scenario),
            r.sac_mean,
            r.sac_var,
            r.fixed_mean,
            r.fixed_var
        )?;
    }
    out.flush()?;
    Ok(())
}

pub fn save_csv(path: impl AsRef<Path>, results: &[ExperimentResult]) -> Result<()> {
    let path = path.as_ref();
    write_csv(BufWriter::new(File::create(path)?), results)?;
    tracing::info!("Wrote {} rows to {}", results.len(), path.display());
    Ok(())
}

/// Aligned plain-text table for the console.
pub fn format_table(results: &[ExperimentResult]) -> String {
    let width = results
        .iter()
        .map(|r| r.scenario.len())
        .chain(std::iter::once("scenario".len()))
        .max()
        .unwrap_or(0);
    let mut table = format!(
        "{:<width$} {:>12} {:>12} {:>12} {:>12}\n",
        "scenario", "sac_mean", "sac_var", "fixed_mean", "fixed_var"
    );
    for r in results {
        table.push_str(&format!(
            "{:<width$} {:>12.3} {:>12.3} {:>12.3} {:>12.3}\n",
            r.scenario, r.sac_mean, r.sac_var, r.fixed_mean, r.fixed_var
        ));
    }
    table
}

/// Grouped bar chart of mean total yield per scenario.
pub fn plot_comparison(results: &[ExperimentResult], filename: &str) -> Result<()> {
    use plotters::prelude::*;

    let root = BitMapBackend::new(filename, (800, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| Error::Plot(e.to_string()))?;

    let max_yield = results
        .iter()
        .flat_map(|r| [r.sac_mean, r.fixed_mean])
        .fold(1.0_f64, f64::max)
        * 1.1;
    let n = results.len().max(1) as f64;

    let mut chart = ChartBuilder::on(&root)
        .caption("Mean total yield per episode", ("sans-serif", 32).into_font())
        .margin(30)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..n, 0.0..max_yield)
        .map_err(|e| Error::Plot(e.to_string()))?;

    let labels: Vec<String> = results.iter().map(|r| r.scenario.clone()).collect();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(results.len().max(1) * 2 + 1)
        .x_label_formatter(&|x| {
            let i = x.floor() as usize;
            if (x - x.floor() - 0.5).abs() < 1e-6 {
                labels.get(i).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .y_desc("Yield (kg)")
        .draw()
        .map_err(|e| Error::Plot(e.to_string()))?;

    chart
        .draw_series(results.iter().enumerate().map(|(i, r)| {
            let x = i as f64;
            Rectangle::new([(x + 0.1, 0.0), (x + 0.5, r.sac_mean)], BLUE.filled())
        }))
        .map_err(|e| Error::Plot(e.to_string()))?
        .label("SAC")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], BLUE.filled()));

    chart
        .draw_series(results.iter().enumerate().map(|(i, r)| {
            let x = i as f64;
            Rectangle::new([(x + 0.5, 0.0), (x + 0.9, r.fixed_mean)], RED.filled())
        }))
        .map_err(|e| Error::Plot(e.to_string()))?
        .label("Fixed")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], RED.filled()));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| Error::Plot(e.to_string()))?;

    root.present().map_err(|e| Error::Plot(e.to_string()))?;
    tracing::info!("Saved comparison chart to {}", filename);
    Ok(())
}
