use std::path::Path;

use eframe::egui::{self, Align, Color32, Key, Layout, RichText, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use tracing::warn;

use crate::filter::load_code_list;
use crate::taxonomy::{NodeId, Taxonomy};
use crate::util::ellipsize;

use super::super::{QuickJumpCache, ViewModel};

const QUICK_JUMP_LIMIT: usize = 40;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Best fuzzy hits over code names, falling back to descriptions at a discount.
fn quick_jump_results(taxonomy: &Taxonomy, query: &str, limit: usize) -> Vec<NodeId> {
    let matcher = SkimMatcherV2::default();
    let mut scored = taxonomy
        .ids()
        .filter_map(|id| {
            let node = taxonomy.node(id);
            let by_name = fuzzy_match_score(&matcher, &node.name, query);
            let by_description = node
                .description
                .as_deref()
                .and_then(|description| fuzzy_match_score(&matcher, description, query))
                .map(|score| score / 2);
            by_name.max(by_description).map(|score| (score, id))
        })
        .collect::<Vec<_>>();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.truncate(limit);
    scored.into_iter().map(|(_, id)| id).collect()
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Filters");
        ui.separator();
        ui.add_space(4.0);

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                self.draw_search(ui);
                ui.separator();
                self.draw_user_list(ui);
                ui.separator();
                self.draw_quick_jump(ui);
            });
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Search").strong())
            .on_hover_text("Whitespace or comma separated terms; any term may match.");
        let response = ui.text_edit_singleline(&mut self.search_query);
        let submitted = response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));

        ui.horizontal(|ui| {
            ui.checkbox(&mut self.search_fields.name, "Code");
            ui.checkbox(&mut self.search_fields.description, "Description");
        });

        let mut search = submitted;
        let mut clear = false;
        ui.horizontal(|ui| {
            search |= ui.button("Search").clicked();
            clear = ui
                .add_enabled(self.state.filter().is_active(), egui::Button::new("Clear"))
                .clicked();
        });

        if clear {
            self.search_query.clear();
            self.last_search_matches = None;
            self.state.clear_filter(&self.taxonomy);
        } else if search {
            let now = ui.input(|input| input.time);
            let (count, started) = self.state.submit_search(
                &self.taxonomy,
                &self.layout,
                &self.search_query,
                self.search_fields,
                now,
            );
            self.track_transition(ui, started);
            self.last_search_matches = (!self.search_query.trim().is_empty()).then_some(count);
        }

        if let Some(count) = self.last_search_matches
            && self.state.filter().user_list().is_none()
        {
            let text = if count == 0 {
                "No codes matched.".to_owned()
            } else {
                format!("{count} matching codes")
            };
            ui.small(text);
        }
    }

    fn draw_user_list(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Code list").strong())
            .on_hover_text("A text file with one code per line; # starts a comment.");
        ui.text_edit_singleline(&mut self.user_list_path);

        let mut load = false;
        let mut clear = false;
        ui.horizontal(|ui| {
            load = ui
                .add_enabled(!self.user_list_path.trim().is_empty(), egui::Button::new("Load"))
                .clicked();
            clear = ui
                .add_enabled(self.state.filter().user_list().is_some(), egui::Button::new("Clear"))
                .clicked();
        });

        if load {
            match load_code_list(Path::new(self.user_list_path.trim())) {
                Ok(codes) => {
                    self.user_list_error = None;
                    self.last_search_matches = None;
                    self.state.load_user_list(&self.taxonomy, codes);
                }
                Err(error) => {
                    warn!("code list not loaded: {error:#}");
                    self.user_list_error = Some(format!("{error:#}"));
                }
            }
        } else if clear {
            self.state.clear_filter(&self.taxonomy);
        }

        if let Some(error) = &self.user_list_error {
            ui.colored_label(Color32::from_rgb(235, 110, 95), error.as_str());
        }

        let Some(list) = self.state.filter().user_list() else {
            return;
        };

        let entries = list.entries().to_vec();
        let mut toggles = Vec::new();
        let mut set_all = None;

        ui.horizontal(|ui| {
            ui.small(format!(
                "{} codes, {} unknown",
                entries.len(),
                list.unknown_count()
            ));
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.small_button("None").clicked() {
                    set_all = Some(false);
                }
                if ui.small_button("All").clicked() {
                    set_all = Some(true);
                }
            });
        });

        egui::ScrollArea::vertical()
            .id_salt("user_list_scroll")
            .max_height(220.0)
            .auto_shrink([false, true])
            .show_rows(ui, 20.0, entries.len(), |ui, row_range| {
                for entry in &entries[row_range] {
                    let mut checked = entry.checked;
                    let Some(id) = entry.node else {
                        ui.add_enabled(false, egui::Checkbox::new(&mut checked, entry.code.as_str()))
                            .on_disabled_hover_text("Not part of the loaded hierarchy.");
                        continue;
                    };

                    let description = self
                        .taxonomy
                        .node(id)
                        .description
                        .as_deref()
                        .unwrap_or_default();
                    let response = ui
                        .checkbox(&mut checked, entry.code.as_str())
                        .on_hover_text(description);
                    if response.changed() {
                        toggles.push((entry.code.clone(), checked));
                    }
                }
            });

        if let Some(checked) = set_all {
            self.state.set_all_codes_checked(checked);
        }
        for (code, checked) in toggles {
            self.state.set_code_checked(&code, checked);
        }
    }

    fn draw_quick_jump(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Quick jump").strong())
            .on_hover_text("Fuzzy-find a code and zoom to it.");
        ui.text_edit_singleline(&mut self.quick_jump);

        let query = self.quick_jump.trim().to_owned();
        if query.is_empty() {
            self.quick_jump_cache = None;
            return;
        }

        let stale = self
            .quick_jump_cache
            .as_ref()
            .is_none_or(|cache| cache.query != query);
        if stale {
            let results = quick_jump_results(&self.taxonomy, &query, QUICK_JUMP_LIMIT);
            self.quick_jump_cache = Some(QuickJumpCache { query, results });
        }

        let Some(cache) = &self.quick_jump_cache else {
            return;
        };
        if cache.results.is_empty() {
            ui.small("Nothing found.");
            return;
        }

        let mut picked = None;
        egui::ScrollArea::vertical()
            .id_salt("quick_jump_scroll")
            .max_height(260.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for &id in &cache.results {
                    let node = self.taxonomy.node(id);
                    let label = match &node.description {
                        Some(description) => format!("{}  {}", node.name, ellipsize(description, 48)),
                        None => node.name.clone(),
                    };
                    let is_selected = self.state.selected() == Some(id);
                    if ui.selectable_label(is_selected, label).clicked() {
                        picked = Some(id);
                    }
                }
            });

        if let Some(id) = picked {
            let now = ui.input(|input| input.time);
            let started = self.state.focus_on(&self.taxonomy, &self.layout, id, now);
            self.track_transition(ui, started);
        }
    }
}
