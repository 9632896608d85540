use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Instant;

use anyhow::Result;
use eframe::egui::{self, Context};
use tracing::{error, info};

use crate::filter::{SearchFields, load_code_list};
use crate::pack::{self, PackLayout, PackOptions};
use crate::render::Renderer;
use crate::taxonomy::{LoadOptions, NodeId, Taxonomy, load_taxonomy};
use crate::view::{TransitionToken, ViewState, ZoomOptions};

mod canvas;
mod ui;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub codes_path: Option<PathBuf>,
    pub load: LoadOptions,
    pub pack: PackOptions,
    pub zoom: ZoomOptions,
}

pub struct CodePackApp {
    config: AppConfig,
    state: AppState,
    reload_rx: Option<Receiver<Result<Diagram, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Diagram, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct Diagram {
    taxonomy: Taxonomy,
    layout: PackLayout,
    codes: Option<Vec<String>>,
}

struct ViewModel {
    taxonomy: Taxonomy,
    layout: PackLayout,
    renderer: Renderer,
    state: ViewState,
    transition: Option<TransitionToken>,
    hovered: Option<NodeId>,
    search_query: String,
    search_fields: SearchFields,
    last_search_matches: Option<usize>,
    user_list_path: String,
    user_list_error: Option<String>,
    quick_jump: String,
    quick_jump_cache: Option<QuickJumpCache>,
}

struct QuickJumpCache {
    query: String,
    results: Vec<NodeId>,
}

fn load_diagram(config: &AppConfig) -> Result<Diagram> {
    let taxonomy = load_taxonomy(&config.data_path, &config.load)?;

    let started = Instant::now();
    let layout = pack::layout(&taxonomy, &config.pack);
    info!(
        circles = layout.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "layout computed"
    );

    let codes = config
        .codes_path
        .as_deref()
        .map(load_code_list)
        .transpose()?;

    Ok(Diagram {
        taxonomy,
        layout,
        codes,
    })
}

impl CodePackApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let state = Self::start_load(config.clone());
        Self {
            config,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(config: AppConfig) -> Receiver<Result<Diagram, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_diagram(&config).map_err(|error| {
                error!(path = %config.data_path.display(), "load failed: {error:#}");
                format!("{error:#}")
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(config: AppConfig) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(config),
        }
    }

    fn ready(&self, diagram: Diagram) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(diagram, self.config.zoom)))
    }
}

impl eframe::App for CodePackApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;
        let data_path = self.config.data_path.display().to_string();

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => transition = Some(result),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading(format!("Loading {data_path}..."));
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the code hierarchy");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &data_path, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.config.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if retry {
            self.state = Self::start_load(self.config.clone());
            return;
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = match result {
                Ok(diagram) => self.ready(diagram),
                Err(error) => AppState::Error(error),
            };
        }
    }
}
