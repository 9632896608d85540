mod app;
mod filter;
mod pack;
mod render;
mod taxonomy;
mod util;
mod view;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::AppConfig;
use crate::pack::PackOptions;
use crate::taxonomy::LoadOptions;
use crate::view::{Easing, ZoomOptions};

/// Zoomable circle-packing explorer for ICD-10 style code hierarchies.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Hierarchy JSON document.
    #[arg(long, default_value = "data/icd10_full.json")]
    data: PathBuf,

    /// Code list applied as a filter once the hierarchy is loaded.
    #[arg(long)]
    codes: Option<PathBuf>,

    #[arg(long, default_value_t = 800.0)]
    layout_width: f64,

    #[arg(long, default_value_t = 550.0)]
    layout_height: f64,

    /// Gap between sibling circles, in layout units.
    #[arg(long, default_value_t = 10.0)]
    padding: f64,

    /// Smallest value a leaf is sized as.
    #[arg(long, default_value_t = 0.1)]
    min_radius: f64,

    /// Value for leaves that carry none; without it such leaves are rejected.
    #[arg(long)]
    default_leaf_value: Option<f64>,

    /// Layout units framed around the focused circle.
    #[arg(long, default_value_t = 20.0)]
    margin: f64,

    #[arg(long, default_value_t = 750)]
    duration_ms: u64,

    /// Duration multiplier while Alt is held.
    #[arg(long, default_value_t = 10.0)]
    slow_motion_factor: f64,

    #[arg(long, value_enum, default_value_t = Easing::Linear)]
    easing: Easing,
}

impl Args {
    fn into_config(self) -> AppConfig {
        AppConfig {
            data_path: self.data,
            codes_path: self.codes,
            load: LoadOptions {
                default_leaf_value: self.default_leaf_value,
            },
            pack: PackOptions {
                width: self.layout_width,
                height: self.layout_height,
                padding: self.padding,
                min_radius: self.min_radius,
            },
            zoom: ZoomOptions {
                margin: self.margin,
                duration: self.duration_ms as f64 / 1000.0,
                slow_motion_factor: self.slow_motion_factor,
                easing: self.easing,
            },
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "icd-circlepack",
        options,
        Box::new(move |cc| Ok(Box::new(app::CodePackApp::new(cc, config.clone())))),
    )
}
