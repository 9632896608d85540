use std::f32::consts::PI;

use eframe::egui::{Color32, Pos2, vec2};

use crate::filter::Membership;
use crate::pack::PackLayout;
use crate::taxonomy::{NodeId, Taxonomy};
use crate::view::{LABEL_FONT_DIVISOR, ViewState};

const MATCH_HIGHLIGHT: Color32 = Color32::from_rgb(255, 214, 92);
const MATCH_STROKE: Color32 = Color32::from_rgb(255, 240, 170);
const DEFAULT_STROKE: Color32 = Color32::from_rgba_premultiplied(12, 12, 12, 120);

/// Where the diagram is drawn: centre of the drawing area and the pixel
/// diameter the current view width maps onto.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Canvas {
    pub center: Pos2,
    pub diameter: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeAttributes<'a> {
    pub id: NodeId,
    pub center: Pos2,
    pub radius: f32,
    pub fill: Color32,
    pub stroke: Color32,
    pub opacity: f32,
    pub visible: bool,
    pub label: Option<&'a str>,
    pub label_font_size: f32,
}

impl NodeAttributes<'_> {
    pub fn is_drawn(&self) -> bool {
        self.visible && self.opacity > 0.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Frame<'a> {
    /// Breadth-first, so parents are drawn beneath their children.
    pub nodes: Vec<NodeAttributes<'a>>,
    pub breadcrumb: String,
}

impl Frame<'_> {
    /// Deepest visible, non-transparent node under `point`.
    pub fn hit_test(&self, point: Pos2) -> Option<NodeId> {
        self.nodes
            .iter()
            .rev()
            .find(|node| node.is_drawn() && node.center.distance(point) <= node.radius)
            .map(|node| node.id)
    }
}

pub trait RenderSurface {
    fn present(&mut self, frame: &Frame<'_>);
}

pub struct Renderer {
    order: Vec<NodeId>,
    base_fill: Vec<Color32>,
}

impl Renderer {
    pub fn new(taxonomy: &Taxonomy) -> Self {
        let order = taxonomy.breadth_first();
        let chapters = taxonomy.children(taxonomy.root());
        let palette_size = chapters.len() + 2;

        let mut base_fill = vec![category_color(0, palette_size); taxonomy.len()];
        for &id in &order {
            let Some(parent) = taxonomy.parent(id) else {
                continue;
            };
            base_fill[id.index()] = if parent == taxonomy.root() {
                let position = chapters.iter().position(|chapter| *chapter == id).unwrap_or(0);
                category_color(position + 1, palette_size)
            } else {
                base_fill[parent.index()]
            };
        }

        Self { order, base_fill }
    }

    pub fn frame<'a>(
        &self,
        taxonomy: &'a Taxonomy,
        layout: &PackLayout,
        state: &ViewState,
        canvas: Canvas,
    ) -> Frame<'a> {
        let view = state.view();
        let k = view.scale(canvas.diameter as f64);
        let filter = state.filter();
        let membership_of = |id: NodeId| filter.match_set().map(|set| set.membership(id));

        let nodes = self
            .order
            .iter()
            .map(|&id| {
                let circle = layout.get(id);
                let center = canvas.center
                    + vec2(((circle.x - view.x) * k) as f32, ((circle.y - view.y) * k) as f32);
                let radius = (circle.r * k) as f32;
                let base = self.base_fill[id.index()];

                let (fill, stroke) = match membership_of(id) {
                    None => (base, DEFAULT_STROKE),
                    Some(Membership::Match) => (blend_color(base, MATCH_HIGHLIGHT, 0.65), MATCH_STROKE),
                    Some(_) => (dim_color(base, 0.45), DEFAULT_STROKE),
                };

                NodeAttributes {
                    id,
                    center,
                    radius,
                    fill,
                    stroke,
                    opacity: state.fill_opacity(taxonomy, id),
                    visible: state.is_visible(id),
                    label: state
                        .label_visible(taxonomy, id)
                        .then(|| taxonomy.node(id).name.as_str()),
                    label_font_size: (radius as f64 / LABEL_FONT_DIVISOR) as f32,
                }
            })
            .collect();

        Frame {
            nodes,
            breadcrumb: state.breadcrumb_text(taxonomy),
        }
    }

    pub fn render(
        &self,
        taxonomy: &Taxonomy,
        layout: &PackLayout,
        state: &ViewState,
        canvas: Canvas,
        surface: &mut impl RenderSurface,
    ) {
        surface.present(&self.frame(taxonomy, layout, state, canvas));
    }
}

/// Evenly spaced hue on a sinebow wheel.
fn category_color(index: usize, count: usize) -> Color32 {
    let t = index as f32 / count.max(1) as f32;
    let channel = |offset: f32| {
        let s = (PI * (t + offset)).sin();
        (40.0 + 200.0 * s * s) as u8
    };
    Color32::from_rgb(channel(0.0), channel(1.0 / 3.0), channel(2.0 / 3.0))
}

pub fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}
