use eframe::egui::{self, Align, Context, Layout, RichText, Ui};

use crate::filter::SearchFields;
use crate::render::Renderer;
use crate::taxonomy::NodeId;
use crate::view::{ViewState, ZoomOptions};

use super::super::{Diagram, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(diagram: Diagram, zoom: ZoomOptions) -> Self {
        let Diagram {
            taxonomy,
            layout,
            codes,
        } = diagram;

        let renderer = Renderer::new(&taxonomy);
        let mut state = ViewState::new(&taxonomy, &layout, zoom);
        if let Some(codes) = codes {
            state.load_user_list(&taxonomy, codes);
        }

        Self {
            taxonomy,
            layout,
            renderer,
            state,
            transition: None,
            hovered: None,
            search_query: String::new(),
            search_fields: SearchFields::default(),
            last_search_matches: None,
            user_list_path: String::new(),
            user_list_error: None,
            quick_jump: String::new(),
            quick_jump_cache: None,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        data_path: &str,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("ICD-10 explorer");
                    ui.separator();
                    ui.label(format!("data: {data_path}"));
                    ui.label(format!("codes: {}", self.taxonomy.len()));
                    ui.label(format!("leaves: {}", self.taxonomy.leaf_count()));
                    ui.label(self.state.filter().summary());
                    let reload_button = ui.add_enabled(!is_loading, egui::Button::new("Reload"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.small(format!(
                            "Alt+click: {}x slower",
                            self.state.options().slow_motion_factor
                        ));
                        if self.state.is_transitioning() {
                            ui.spinner();
                        }
                    });
                });
                ui.horizontal_wrapped(|ui| self.draw_breadcrumb(ui));
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(330.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_canvas(ui));
    }

    fn draw_breadcrumb(&mut self, ui: &mut Ui) {
        let path = self.taxonomy.path_from_root(self.state.focus());
        let mut clicked: Option<NodeId> = None;

        for (position, &id) in path.iter().enumerate() {
            if position > 0 {
                ui.label("→");
            }
            let name = self.taxonomy.node(id).name.as_str();
            if id == self.state.focus() {
                ui.label(RichText::new(name).strong());
            } else if ui.link(name).clicked() {
                clicked = Some(id);
            }
        }

        if let Some(id) = clicked {
            let now = ui.input(|input| input.time);
            let started = self.state.zoom_in(&self.taxonomy, &self.layout, id, now, false);
            self.track_transition(ui, started);
        }
    }
}
