use std::f64::consts::SQRT_2;

use crate::pack::LayoutNode;

const RHO: f64 = SQRT_2;
const RHO2: f64 = 2.0;
const RHO4: f64 = 4.0;
const EPSILON2: f64 = 1e-12;

/// Visible window in layout space: centre plus the layout width spanned by
/// the canvas diameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

impl View {
    pub fn framing(node: LayoutNode, margin: f64) -> Self {
        Self {
            x: node.x,
            y: node.y,
            width: (node.r * 2.0 + margin).max(f64::MIN_POSITIVE),
        }
    }

    /// Screen pixels per layout unit for a canvas of the given diameter.
    pub fn scale(&self, canvas_diameter: f64) -> f64 {
        canvas_diameter / self.width
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Easing {
    #[default]
    Linear,
    Cubic,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Cubic => {
                let t = t * 2.0;
                if t <= 1.0 {
                    t * t * t / 2.0
                } else {
                    let t = t - 2.0;
                    (t * t * t + 2.0) / 2.0
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum PathShape {
    /// Centres coincide: pure geometric scaling.
    Scale { s: f64 },
    /// Zoom out, pan, zoom in along the optimal hyperbolic path.
    Arc { d1: f64, r0: f64, s: f64 },
}

/// Smooth zoom between two views (van Wijk & Nuij). Width changes
/// geometrically, never linearly.
#[derive(Clone, Copy, Debug)]
pub struct ZoomPath {
    from: View,
    to: View,
    shape: PathShape,
}

pub fn interpolate_zoom(from: View, to: View) -> ZoomPath {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let d2 = dx * dx + dy * dy;
    let (w0, w1) = (from.width, to.width);

    let shape = if d2 < EPSILON2 {
        PathShape::Scale {
            s: (w1 / w0).ln() / RHO,
        }
    } else {
        let d1 = d2.sqrt();
        let b0 = (w1 * w1 - w0 * w0 + RHO4 * d2) / (2.0 * w0 * RHO2 * d1);
        let b1 = (w1 * w1 - w0 * w0 - RHO4 * d2) / (2.0 * w1 * RHO2 * d1);
        let r0 = ((b0 * b0 + 1.0).sqrt() - b0).ln();
        let r1 = ((b1 * b1 + 1.0).sqrt() - b1).ln();
        PathShape::Arc {
            d1,
            r0,
            s: (r1 - r0) / RHO,
        }
    };

    ZoomPath { from, to, shape }
}

impl ZoomPath {
    pub fn at(&self, t: f64) -> View {
        if t <= 0.0 {
            return self.from;
        }
        if t >= 1.0 {
            return self.to;
        }

        let View { x: ux0, y: uy0, width: w0 } = self.from;
        let dx = self.to.x - ux0;
        let dy = self.to.y - uy0;

        match self.shape {
            PathShape::Scale { s } => View {
                x: ux0 + t * dx,
                y: uy0 + t * dy,
                width: w0 * (RHO * t * s).exp(),
            },
            PathShape::Arc { d1, r0, s } => {
                let s = t * s;
                let cosh_r0 = r0.cosh();
                let u = w0 / (RHO2 * d1) * (cosh_r0 * (RHO * s + r0).tanh() - r0.sinh());
                View {
                    x: ux0 + u * dx,
                    y: uy0 + u * dy,
                    width: w0 * cosh_r0 / (RHO * s + r0).cosh(),
                }
            }
        }
    }
}
