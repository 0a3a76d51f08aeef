//! Strip plot of delta scores per variant class.

use base64::Engine as _;
use itertools::Itertools as _;
use plotters::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::{Error, Result};

use super::labels::BinaryClass;
use super::roc::median;

/// Image size in pixels.
const SIZE: (u32, u32) = (800, 400);
/// Half width of the uniform jitter along the class axis.
const JITTER: f64 = 0.3;
/// Color of FUNC/INT points.
const COLOR_FUNC: RGBColor = RGBColor(0x77, 0x77, 0x77);
/// Color of LOF points.
const COLOR_LOF: RGBColor = RGBColor(0xd6, 0x27, 0x28);

fn plot_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Calibration(format!("plotting failed: {}", e))
}

/// Vertical position of a class; FUNC/INT is drawn on top.
fn class_row(class: BinaryClass) -> f64 {
    match class {
        BinaryClass::FuncInt => 1.0,
        BinaryClass::Lof => 0.0,
    }
}

/// Render the strip plot as PNG and return the raw bytes.
///
/// Points are jittered with a fixed seed so the image is reproducible.  A black bar
/// marks the median delta score of each class.
pub fn render_png(deltas: &[f64], classes: &[BinaryClass]) -> Result<Vec<u8>> {
    if deltas.is_empty() || deltas.len() != classes.len() {
        return Err(Error::Calibration(
            "need one class per delta score to plot".into(),
        ));
    }

    let tmp_file = tempfile::Builder::new().suffix(".png").tempfile()?;
    {
        let root = BitMapBackend::new(tmp_file.path(), SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(plot_err)?;

        let (min, max) = deltas
            .iter()
            .copied()
            .minmax()
            .into_option()
            .unwrap_or((0.0, 0.0));
        let pad = ((max - min) * 0.05).max(1e-6);

        let mut chart = ChartBuilder::on(&root)
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(90)
            .build_cartesian_2d((min - pad)..(max + pad), -0.5f64..1.5f64)
            .map_err(plot_err)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("Delta likelihood score, Evo 2")
            .y_desc("BRCA1 SNV class")
            .y_labels(3)
            .y_label_formatter(&|y| {
                if (*y - 1.0).abs() < 0.25 {
                    BinaryClass::FuncInt.to_string()
                } else if y.abs() < 0.25 {
                    BinaryClass::Lof.to_string()
                } else {
                    String::new()
                }
            })
            .draw()
            .map_err(plot_err)?;

        let mut rng = StdRng::seed_from_u64(42);
        let points = deltas
            .iter()
            .zip(classes.iter())
            .map(|(delta, class)| {
                let y = class_row(*class) + rng.random_range(-JITTER..JITTER);
                let color = match class {
                    BinaryClass::FuncInt => COLOR_FUNC,
                    BinaryClass::Lof => COLOR_LOF,
                };
                Circle::new((*delta, y), 2, color.filled())
            })
            .collect::<Vec<_>>();
        chart.draw_series(points).map_err(plot_err)?;

        for class in [BinaryClass::FuncInt, BinaryClass::Lof] {
            let values = deltas
                .iter()
                .zip(classes.iter())
                .filter(|(_, c)| **c == class)
                .map(|(d, _)| *d)
                .collect::<Vec<_>>();
            if let Some(m) = median(&values) {
                let y = class_row(class);
                chart
                    .draw_series(std::iter::once(PathElement::new(
                        vec![(m, y - 0.4), (m, y + 0.4)],
                        BLACK.stroke_width(2),
                    )))
                    .map_err(plot_err)?;
            }
        }

        root.present().map_err(plot_err)?;
    }

    Ok(std::fs::read(tmp_file.path())?)
}

/// Render the strip plot and return it base64-encoded.
pub fn render_base64(deltas: &[f64], classes: &[BinaryClass]) -> Result<String> {
    let png = render_png(deltas, classes)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(png))
}
