use std::env;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use uuid::Uuid;

use crate::error::BotError;
use crate::model::ClanCensusRow;

/// Fixed class palette. A class name reaching the renderer that is missing
/// here is a data-integrity error, never a slice to skip.
pub const CLASS_COLORS: [(&str, RGBColor); 5] = [
    ("Rogue", RGBColor(0xca, 0xa8, 0xff)),
    ("Ranger", RGBColor(0xf9, 0xc8, 0x57)),
    ("Warrior", RGBColor(0xff, 0x34, 0x34)),
    ("Mage", RGBColor(0x53, 0xa9, 0xe9)),
    ("Druid", RGBColor(0x76, 0xae, 0x58)),
];

pub fn class_color(class: &str) -> Result<RGBColor, BotError> {
    CLASS_COLORS
        .iter()
        .find(|(name, _)| *name == class)
        .map(|(_, color)| *color)
        .ok_or_else(|| BotError::UnknownClass(class.to_string()))
}

/// Labeled numeric series for one census pie: one slice per class, each
/// caption carrying the class name and absolute count. The percentage share
/// is drawn inside the slice at render time.
#[derive(Debug, Clone)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
    pub colors: Vec<RGBColor>,
}

impl ChartSeries {
    pub fn from_census(rows: &[ClanCensusRow]) -> Result<Self, BotError> {
        let mut labels = Vec::with_capacity(rows.len());
        let mut values = Vec::with_capacity(rows.len());
        let mut colors = Vec::with_capacity(rows.len());
        for row in rows {
            colors.push(class_color(&row.class)?);
            labels.push(format!("{} ({})", row.class, row.members));
            values.push(row.members);
        }
        Ok(ChartSeries {
            labels,
            values,
            colors,
        })
    }
}

/// A temporary PNG on disk with a collision-resistant random name. The file
/// is removed when the artifact is dropped, so cleanup happens on the send
/// path and the error path alike.
#[derive(Debug)]
pub struct ChartArtifact {
    path: PathBuf,
}

impl ChartArtifact {
    fn new() -> Self {
        let path = env::temp_dir().join(format!("{}.png", Uuid::new_v4().simple()));
        ChartArtifact { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ChartArtifact {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn render_err<E: Display>(err: E) -> BotError {
    BotError::Render(err.to_string())
}

/// Draws the census proportions chart and saves it as a fresh temp PNG.
/// Each call owns its own drawing backend, so concurrent renders do not
/// share state.
pub fn render_census_pie(series: &ChartSeries, title: &str) -> Result<ChartArtifact, BotError> {
    let artifact = ChartArtifact::new();
    {
        let root = BitMapBackend::new(artifact.path(), (800, 600)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let root = root
            .titled(title, ("sans-serif", 28).into_font())
            .map_err(render_err)?;

        let (width, height) = root.dim_in_pixel();
        let center = ((width / 2) as i32, (height / 2) as i32);
        let radius = f64::from(width.min(height)) * 0.35;
        let sizes: Vec<f64> = series.values.iter().map(|v| *v as f64).collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &series.colors, &series.labels);
        pie.label_style(("sans-serif", 18).into_font());
        pie.percentages(("sans-serif", 20).into_font());
        root.draw(&pie).map_err(render_err)?;
        root.present().map_err(render_err)?;
    }
    Ok(artifact)
}
