//! SVG line plots of relative conformer energies.
//!
//! Uses the SVG backend so no system fonts are needed.

use super::report::EnergyTable;
use plotters::prelude::*;
use plotters_svg::SVGBackend;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("Failed to draw '{path}': {details}")]
    Drawing { path: String, details: String },
}

fn drawing_error(path: &Path, err: impl Display) -> PlotError {
    PlotError::Drawing {
        path: path.to_string_lossy().to_string(),
        details: err.to_string(),
    }
}

/// Letter labels for `n` conformer positions.
///
/// All labels share one width: single letters up to 25 positions, then
/// `AA, AB, ...` for every position once there are more.
pub fn conformer_labels(n: usize) -> Vec<String> {
    let width = n / 26 + 1;
    (0..n)
        .map(|mut i| {
            let mut label = vec![b'A'; width];
            for slot in label.iter_mut().rev() {
                *slot = b'A' + (i % 26) as u8;
                i /= 26;
            }
            String::from_utf8_lossy(&label).into_owned()
        })
        .collect()
}

/// Path of the plot for one molecule: `<dir>/minimaE_<stem>.svg`.
pub fn plot_path(directory: &Path, stem: &str) -> PathBuf {
    directory.join(format!("minimaE_{}.svg", stem))
}

/// Splits a column into runs of consecutive defined values.
fn segments(column: &[f64]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (i, &value) in column.iter().enumerate() {
        if value.is_finite() {
            current.push((i as f64, value));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Draws one series per method over the conformer positions of a molecule.
pub fn plot_molecule(table: &EnergyTable, path: &Path) -> Result<(), PlotError> {
    let root = SVGBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| drawing_error(path, e))?;

    let n = table.num_conformers();
    let (floor, ceiling) = table
        .columns
        .iter()
        .flat_map(|c| c.iter().copied())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if n == 0 || floor > ceiling {
        root.draw(&Text::new(
            "No energies to display",
            (400, 300),
            ("sans-serif", 20).into_font().color(&BLACK),
        ))
        .map_err(|e| drawing_error(path, e))?;
        root.present().map_err(|e| drawing_error(path, e))?;
        return Ok(());
    }

    let reference = table.methods.first().map_or("", |m| m.as_str());
    let labels = conformer_labels(n);
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!(
                "Relative Energies of {} Minima by Reference: {}",
                table.title, reference
            ),
            ("sans-serif", 20),
        )
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-1.0..n as f64, (floor.round() - 2.0)..(ceiling.round() + 2.0))
        .map_err(|e| drawing_error(path, e))?;

    let x_formatter = |x: &f64| {
        let position = x.round();
        if (x - position).abs() < 1e-6 && position >= 0.0 && (position as usize) < n {
            labels[position as usize].clone()
        } else {
            String::new()
        }
    };
    chart
        .configure_mesh()
        .x_labels(n + 2)
        .x_label_formatter(&x_formatter)
        .x_desc("conformer minimum")
        .y_desc("Relative energy (kcal/mol)")
        .draw()
        .map_err(|e| drawing_error(path, e))?;

    for (i, (column, method)) in table.columns.iter().zip(table.methods).enumerate() {
        let color = Palette99::pick(i).to_rgba();
        for (k, run) in segments(column).into_iter().enumerate() {
            let series = chart
                .draw_series(LineSeries::new(run.iter().copied(), color.stroke_width(2)))
                .map_err(|e| drawing_error(path, e))?;
            if k == 0 {
                series
                    .label(method.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }
            chart
                .draw_series(run.iter().map(|&p| Circle::new(p, 4, color.filled())))
                .map_err(|e| drawing_error(path, e))?;
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| drawing_error(path, e))?;

    root.present().map_err(|e| drawing_error(path, e))?;
    Ok(())
}
