mod enclose;
mod siblings;

use crate::taxonomy::{NodeId, Taxonomy};
use enclose::Lcg;
use siblings::pack_siblings;

/// Padding never eats more than this share of a parent's radius.
const MAX_PADDING_FRACTION: f64 = 0.25;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Circle {
    x: f64,
    y: f64,
    r: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PackOptions {
    pub width: f64,
    pub height: f64,
    /// Gap between siblings and between children and their parent, in layout units.
    pub padding: f64,
    /// Smallest base radius (in value units) a node may have before packing.
    pub min_radius: f64,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 550.0,
            padding: 10.0,
            min_radius: 0.1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayoutNode {
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

impl LayoutNode {
    #[cfg(test)]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (x - self.x).hypot(y - self.y) <= self.r
    }
}

#[derive(Clone, Debug)]
pub struct PackLayout {
    nodes: Vec<LayoutNode>,
}

impl PackLayout {
    pub fn get(&self, id: NodeId) -> LayoutNode {
        self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// Circle-packs the whole taxonomy top-down.
///
/// Every node's base radius is `sqrt(value)` floored at `min_radius`; the
/// floor is applied before siblings are packed so floored nodes never
/// overlap. Each sibling group is packed around the origin and then scaled
/// into the parent circle minus padding.
pub fn layout(taxonomy: &Taxonomy, options: &PackOptions) -> PackLayout {
    let mut nodes = vec![LayoutNode::default(); taxonomy.len()];
    let root = taxonomy.root();
    nodes[root.index()] = LayoutNode {
        x: options.width / 2.0,
        y: options.height / 2.0,
        r: options.width.min(options.height).max(0.0) / 2.0,
    };

    let mut random = Lcg::new();
    let mut base_radii = Vec::new();
    let mut scratch = Vec::new();
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        let children = taxonomy.children(id);
        if children.is_empty() {
            continue;
        }

        base_radii.clear();
        base_radii.extend(
            children
                .iter()
                .map(|child| base_radius(taxonomy.node(*child).value, options.min_radius)),
        );

        fit_children(
            nodes[id.index()],
            &base_radii,
            options.padding,
            &mut random,
            &mut scratch,
        );

        for (child, circle) in children.iter().zip(&scratch) {
            nodes[child.index()] = LayoutNode {
                x: circle.x,
                y: circle.y,
                r: circle.r,
            };
        }
        stack.extend(children.iter().copied());
    }

    PackLayout { nodes }
}

fn base_radius(value: f64, min_radius: f64) -> f64 {
    value.max(0.0).sqrt().max(min_radius.max(f64::MIN_POSITIVE))
}

fn fit_children(
    parent: LayoutNode,
    base_radii: &[f64],
    padding: f64,
    random: &mut Lcg,
    scratch: &mut Vec<Circle>,
) {
    scratch.clear();
    scratch.extend(base_radii.iter().map(|&r| Circle { x: 0.0, y: 0.0, r }));
    let natural = pack_siblings(scratch, random);

    let padding = padding.min(parent.r * MAX_PADDING_FRACTION).max(0.0);
    let available = parent.r - padding / 2.0;

    // Padding expressed in the children's own (pre-scale) units.
    let inflate = if natural > 0.0 && parent.r > 0.0 {
        (padding / 2.0) * natural / parent.r
    } else {
        0.0
    };

    let enclosing = if inflate > 0.0 {
        for (circle, &r) in scratch.iter_mut().zip(base_radii) {
            *circle = Circle {
                x: 0.0,
                y: 0.0,
                r: r + inflate,
            };
        }
        pack_siblings(scratch, random)
    } else {
        natural
    };

    let scale = if enclosing > 0.0 {
        available / enclosing
    } else {
        0.0
    };

    for (circle, &r) in scratch.iter_mut().zip(base_radii) {
        circle.x = parent.x + circle.x * scale;
        circle.y = parent.y + circle.y * scale;
        circle.r = r * scale;
    }
}
