use eframe::egui::{RichText, Ui};

use crate::filter::subtree_contains_match;
use crate::util::format_value;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Details");
        ui.add_space(6.0);

        let Some(id) = self.hovered.or(self.state.selected()) else {
            ui.label("Hover a circle or pick a code to see its details.");
            return;
        };

        let taxonomy = &self.taxonomy;
        let node = taxonomy.node(id);

        ui.label(RichText::new(node.name.as_str()).strong());
        if let Some(description) = &node.description {
            ui.label(description.as_str());
        }
        ui.add_space(6.0);

        ui.label(format!("Value: {}", format_value(node.value)));
        ui.label(format!("Depth: {}", node.depth));
        if node.is_leaf() {
            ui.label("Leaf code");
        } else {
            ui.label(format!("Children: {}", node.children.len()));
        }
        if let Some(chapter) = taxonomy.top_level_category(id)
            && chapter != id
        {
            ui.label(format!("Chapter: {}", taxonomy.node(chapter).name));
        }
        ui.label(if self.state.is_visible(id) {
            "Shown in the current view"
        } else {
            "Hidden in the current view"
        });

        if taxonomy.is_ancestor(self.state.focus(), id) {
            ui.label("Inside the focused category");
        }

        let filter = self.state.filter();
        if let Some(set) = filter.match_set() {
            ui.separator();
            let genuine = filter.is_genuine_match(id);
            let below = subtree_contains_match(taxonomy, id, set.matches());
            ui.label(if genuine {
                "Matches the active filter"
            } else if below {
                "Contains codes matching the active filter"
            } else {
                "No filter matches in this subtree"
            });
        }

        if self.state.selected() == Some(id) {
            ui.add_space(8.0);
            if ui.button("Clear selection").clicked() {
                self.state.select(None);
            }
        }
    }
}
