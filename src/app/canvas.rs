use eframe::egui::{self, Align2, Color32, FontId, Painter, Rect, Sense, Stroke, Ui, vec2};

use crate::render::{Canvas, Frame, RenderSurface};
use crate::taxonomy::NodeId;
use crate::util::ellipsize;
use crate::view::{FrameOutcome, TransitionToken};

use super::ViewModel;

const BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);
const LABEL_COLOR: Color32 = Color32::from_gray(238);
const HOVER_STROKE: Color32 = Color32::from_rgb(255, 164, 101);
/// Labels below this size are unreadable and only cost tessellation.
const MIN_LABEL_FONT: f32 = 4.0;

struct PainterSurface<'p> {
    painter: &'p Painter,
    rect: Rect,
    hovered: Option<NodeId>,
}

impl RenderSurface for PainterSurface<'_> {
    fn present(&mut self, frame: &Frame<'_>) {
        self.painter.rect_filled(self.rect, 0.0, BACKGROUND);

        for node in frame.nodes.iter().filter(|node| node.is_drawn()) {
            self.painter
                .circle_filled(node.center, node.radius, node.fill.gamma_multiply(node.opacity));

            let stroke = if self.hovered == Some(node.id) {
                Stroke::new(2.0, HOVER_STROKE)
            } else {
                Stroke::new(1.0, node.stroke)
            };
            self.painter.circle_stroke(node.center, node.radius, stroke);
        }

        for node in &frame.nodes {
            let Some(label) = node.label else {
                continue;
            };
            if node.label_font_size < MIN_LABEL_FONT {
                continue;
            }
            self.painter.text(
                node.center,
                Align2::CENTER_CENTER,
                label,
                FontId::proportional(node.label_font_size),
                LABEL_COLOR,
            );
        }

        self.painter.text(
            self.rect.left_top() + vec2(10.0, 10.0),
            Align2::LEFT_TOP,
            frame.breadcrumb.as_str(),
            FontId::proportional(13.0),
            Color32::from_gray(200),
        );
    }
}

impl ViewModel {
    fn advance_transition(&mut self, ui: &Ui) {
        let Some(token) = self.transition else {
            return;
        };

        let now = ui.input(|input| input.time);
        match self.state.advance(&self.taxonomy, token, now) {
            FrameOutcome::InFlight(_) => ui.ctx().request_repaint(),
            FrameOutcome::Finished(_) | FrameOutcome::Stale => self.transition = None,
        }
    }

    pub(in crate::app) fn draw_canvas(&mut self, ui: &mut Ui) {
        self.advance_transition(ui);

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click());
        let painter = ui.painter_at(rect);
        let canvas = Canvas {
            center: rect.center(),
            diameter: rect.width().min(rect.height()),
        };

        let frame = self
            .renderer
            .frame(&self.taxonomy, &self.layout, &self.state, canvas);

        let pointer = ui.input(|input| input.pointer.hover_pos());
        self.hovered = pointer
            .filter(|_| response.hovered())
            .and_then(|pointer| frame.hit_test(pointer));

        let mut surface = PainterSurface {
            painter: &painter,
            rect,
            hovered: self.hovered,
        };
        surface.present(&frame);

        if let (Some(id), Some(pointer)) = (self.hovered, pointer) {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });

            let node = self.taxonomy.node(id);
            let tooltip = match &node.description {
                Some(description) => format!("{}: {}", node.name, ellipsize(description, 80)),
                None => node.name.clone(),
            };
            painter.text(
                pointer + vec2(14.0, 14.0),
                Align2::LEFT_TOP,
                tooltip,
                FontId::proportional(13.0),
                Color32::from_gray(245),
            );
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            let (now, slow_motion) = ui.input(|input| (input.time, input.modifiers.alt));
            let started = match self.hovered {
                Some(id) => self
                    .state
                    .zoom_in(&self.taxonomy, &self.layout, id, now, slow_motion),
                None => self
                    .state
                    .reset_to_root(&self.taxonomy, &self.layout, now, slow_motion),
            };
            self.track_transition(ui, started);
        }
    }

    pub(in crate::app) fn track_transition(&mut self, ui: &Ui, token: Option<TransitionToken>) {
        if let Some(token) = token {
            self.transition = Some(token);
            ui.ctx().request_repaint();
        }
    }
}
