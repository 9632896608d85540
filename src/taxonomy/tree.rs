use std::collections::{HashMap, VecDeque};

use super::error::MalformedHierarchyError;
use super::parse::RawNode;

/// Index of a node inside a [`Taxonomy`]. Bijective with the node name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LoadOptions {
    /// Value given to leaves that carry none. `None` makes a valueless leaf an error.
    pub default_leaf_value: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct CodeNode {
    pub name: String,
    pub description: Option<String>,
    /// Literal value for leaves, sum of the children for internal nodes.
    pub value: f64,
    pub depth: usize,
    pub parent: Option<NodeId>,
    /// Sorted by descending value; ties keep document order.
    pub children: Vec<NodeId>,
}

impl CodeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Immutable, normalized code hierarchy. The root is always `NodeId(0)`.
#[derive(Clone, Debug)]
pub struct Taxonomy {
    nodes: Vec<CodeNode>,
    index_by_name: HashMap<String, NodeId>,
    max_depth: usize,
    leaf_count: usize,
}

impl Taxonomy {
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &CodeNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&CodeNode> {
        self.nodes.get(id.0)
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.index_by_name.get(name).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            taxonomy: self,
            cursor: self.nodes[id.0].parent,
        }
    }

    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        if self.nodes[node.0].depth <= self.nodes[ancestor.0].depth {
            return false;
        }
        self.ancestors(node).any(|candidate| candidate == ancestor)
    }

    pub fn path_from_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        path.extend(self.ancestors(id));
        path.reverse();
        path
    }

    pub fn breadth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::from([self.root()]);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            queue.extend(self.nodes[id.0].children.iter().copied());
        }
        order
    }

    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = self.nodes[id.0].children.iter().rev().copied().collect::<Vec<_>>();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev().copied());
        }
        out
    }

    /// The depth-1 chapter a node belongs to; `None` for the root.
    pub fn top_level_category(&self, id: NodeId) -> Option<NodeId> {
        let node = &self.nodes[id.0];
        match node.depth {
            0 => None,
            1 => Some(id),
            _ => self
                .ancestors(id)
                .find(|ancestor| self.nodes[ancestor.0].depth == 1),
        }
    }
}

pub struct Ancestors<'a> {
    taxonomy: &'a Taxonomy,
    cursor: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.cursor?;
        self.cursor = self.taxonomy.nodes[current.0].parent;
        Some(current)
    }
}

/// Depth is assigned top-down while the arena is filled in pre-order, so every
/// child index is larger than its parent's; a single reverse sweep then sums
/// values bottom-up. No recursion is involved at any depth.
pub fn normalize(raw: RawNode, options: &LoadOptions) -> Result<Taxonomy, MalformedHierarchyError> {
    let mut nodes: Vec<CodeNode> = Vec::new();
    let mut index_by_name: HashMap<String, NodeId> = HashMap::new();
    let mut max_depth = 0usize;
    let mut leaf_count = 0usize;

    let mut stack = vec![(raw, None::<NodeId>, 0usize, 0usize)];

    while let Some((mut raw, parent, depth, position)) = stack.pop() {
        let Some(name) = raw.name.take().filter(|name| !name.trim().is_empty()) else {
            return Err(MalformedHierarchyError::MissingName {
                location: describe_location(&nodes, parent, position),
            });
        };

        if let Some(&existing) = index_by_name.get(&name) {
            let mut cursor = parent;
            while let Some(ancestor) = cursor {
                if ancestor == existing {
                    return Err(MalformedHierarchyError::Cycle { name });
                }
                cursor = nodes[ancestor.0].parent;
            }
            return Err(MalformedHierarchyError::DuplicateName { name });
        }

        let raw_children = raw.children.take().unwrap_or_default();
        let value = if raw_children.is_empty() {
            leaf_count += 1;
            match raw.value.or(options.default_leaf_value) {
                Some(value) if value.is_finite() && value >= 0.0 => value,
                Some(value) => return Err(MalformedHierarchyError::InvalidValue { name, value }),
                None => return Err(MalformedHierarchyError::MissingValue { name }),
            }
        } else {
            0.0
        };

        let id = NodeId(nodes.len());
        index_by_name.insert(name.clone(), id);
        if let Some(parent) = parent {
            nodes[parent.0].children.push(id);
        }
        max_depth = max_depth.max(depth);

        nodes.push(CodeNode {
            name,
            description: raw.description.take().filter(|text| !text.trim().is_empty()),
            value,
            depth,
            parent,
            children: Vec::with_capacity(raw_children.len()),
        });

        for (position, child) in raw_children.into_iter().enumerate().rev() {
            stack.push((child, Some(id), depth + 1, position));
        }
    }

    for index in (0..nodes.len()).rev() {
        if nodes[index].children.is_empty() {
            continue;
        }

        let mut children = std::mem::take(&mut nodes[index].children);
        children.sort_by(|a, b| nodes[b.0].value.total_cmp(&nodes[a.0].value));
        nodes[index].value = children.iter().map(|child| nodes[child.0].value).sum();
        nodes[index].children = children;
    }

    Ok(Taxonomy {
        nodes,
        index_by_name,
        max_depth,
        leaf_count,
    })
}

fn describe_location(nodes: &[CodeNode], parent: Option<NodeId>, position: usize) -> String {
    match parent {
        Some(parent) => format!("child #{position} of `{}`", nodes[parent.0].name),
        None => "the document root".to_owned(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// root → {A(10: A1=4, A2=6), B=20}
    pub(crate) fn sample_taxonomy() -> Taxonomy {
        let raw = RawNode::branch(
            "root",
            vec![
                RawNode::branch(
                    "A",
                    vec![
                        RawNode::leaf("A1", 4.0).with_description("Cholera due to Vibrio cholerae"),
                        RawNode::leaf("A2", 6.0).with_description("Typhoid fever"),
                    ],
                )
                .with_description("Intestinal infectious diseases"),
                RawNode::leaf("B", 20.0).with_description("Viral infections"),
            ],
        );
        normalize(raw, &LoadOptions::default()).unwrap()
    }

    fn id(taxonomy: &Taxonomy, name: &str) -> NodeId {
        taxonomy.find(name).unwrap()
    }

    #[test]
    fn aggregates_values_bottom_up() {
        let taxonomy = sample_taxonomy();
        assert_eq!(taxonomy.node(id(&taxonomy, "A")).value, 10.0);
        assert_eq!(taxonomy.node(taxonomy.root()).value, 30.0);

        for node_id in taxonomy.ids() {
            let node = taxonomy.node(node_id);
            if !node.is_leaf() {
                let sum: f64 = node.children.iter().map(|c| taxonomy.node(*c).value).sum();
                assert_eq!(node.value, sum, "aggregate mismatch at {}", node.name);
            }
        }
    }

    #[test]
    fn depth_increases_by_one_per_level() {
        let taxonomy = sample_taxonomy();
        assert_eq!(taxonomy.node(taxonomy.root()).depth, 0);
        for node_id in taxonomy.ids() {
            if let Some(parent) = taxonomy.parent(node_id) {
                assert_eq!(taxonomy.node(node_id).depth, taxonomy.node(parent).depth + 1);
            }
        }
        assert_eq!(taxonomy.max_depth(), 2);
        assert_eq!(taxonomy.leaf_count(), 3);
    }

    #[test]
    fn children_sorted_by_descending_value_with_stable_ties() {
        let raw = RawNode::branch(
            "root",
            vec![
                RawNode::leaf("small", 1.0),
                RawNode::leaf("tie-first", 5.0),
                RawNode::leaf("big", 9.0),
                RawNode::leaf("tie-second", 5.0),
            ],
        );
        let taxonomy = normalize(raw, &LoadOptions::default()).unwrap();
        let names = taxonomy
            .children(taxonomy.root())
            .iter()
            .map(|child| taxonomy.node(*child).name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["big", "tie-first", "tie-second", "small"]);
    }

    #[test]
    fn internal_literal_value_is_replaced_by_sum() {
        let mut branch = RawNode::branch("A", vec![RawNode::leaf("A1", 2.0), RawNode::leaf("A2", 3.0)]);
        branch.value = Some(100.0);
        let taxonomy = normalize(RawNode::branch("root", vec![branch]), &LoadOptions::default()).unwrap();
        assert_eq!(taxonomy.node(taxonomy.find("A").unwrap()).value, 5.0);
    }

    #[test]
    fn empty_children_array_is_a_leaf() {
        let mut leaf = RawNode::leaf("A", 3.0);
        leaf.children = Some(Vec::new());
        let taxonomy = normalize(RawNode::branch("root", vec![leaf]), &LoadOptions::default()).unwrap();
        assert!(taxonomy.node(taxonomy.find("A").unwrap()).is_leaf());
    }

    #[test]
    fn rejects_missing_name() {
        let raw = RawNode::branch("root", vec![RawNode::leaf("A", 1.0), RawNode::default()]);
        let error = normalize(raw, &LoadOptions::default()).unwrap_err();
        assert_eq!(
            error,
            MalformedHierarchyError::MissingName {
                location: "child #1 of `root`".to_owned()
            }
        );
    }

    #[test]
    fn rejects_duplicate_sibling_names() {
        let raw = RawNode::branch("root", vec![RawNode::leaf("A", 1.0), RawNode::leaf("A", 2.0)]);
        assert_eq!(
            normalize(raw, &LoadOptions::default()).unwrap_err(),
            MalformedHierarchyError::DuplicateName { name: "A".to_owned() }
        );
    }

    #[test]
    fn name_repeated_on_ancestor_path_is_a_cycle() {
        let raw = RawNode::branch("root", vec![RawNode::branch("A", vec![RawNode::leaf("root", 1.0)])]);
        assert_eq!(
            normalize(raw, &LoadOptions::default()).unwrap_err(),
            MalformedHierarchyError::Cycle { name: "root".to_owned() }
        );
    }

    #[test]
    fn valueless_leaf_needs_a_default() {
        let raw = || {
            RawNode::branch(
                "root",
                vec![RawNode {
                    name: Some("A".to_owned()),
                    value: None,
                    description: None,
                    children: None,
                }],
            )
        };
        assert_eq!(
            normalize(raw(), &LoadOptions::default()).unwrap_err(),
            MalformedHierarchyError::MissingValue { name: "A".to_owned() }
        );

        let options = LoadOptions {
            default_leaf_value: Some(1.0),
        };
        let taxonomy = normalize(raw(), &options).unwrap();
        assert_eq!(taxonomy.node(taxonomy.root()).value, 1.0);
    }

    #[test]
    fn rejects_negative_leaf_value() {
        let raw = RawNode::branch("root", vec![RawNode::leaf("A", -1.0)]);
        assert!(matches!(
            normalize(raw, &LoadOptions::default()),
            Err(MalformedHierarchyError::InvalidValue { .. })
        ));
    }

    #[test]
    fn deep_chains_do_not_recurse() {
        let mut raw = RawNode::leaf("level-5000", 1.0);
        for level in (0..5000).rev() {
            raw = RawNode::branch(&format!("level-{level}"), vec![raw]);
        }
        let taxonomy = normalize(raw, &LoadOptions::default()).unwrap();
        assert_eq!(taxonomy.max_depth(), 5000);
        assert_eq!(taxonomy.node(taxonomy.root()).value, 1.0);
    }

    #[test]
    fn navigation_helpers() {
        let taxonomy = sample_taxonomy();
        let root = taxonomy.root();
        let a = id(&taxonomy, "A");
        let a1 = id(&taxonomy, "A1");
        let b = id(&taxonomy, "B");

        assert!(taxonomy.is_ancestor(root, a1));
        assert!(taxonomy.is_ancestor(a, a1));
        assert!(!taxonomy.is_ancestor(b, a1));
        assert!(!taxonomy.is_ancestor(a1, a1));
        assert_eq!(taxonomy.path_from_root(a1), vec![root, a, a1]);
        assert_eq!(taxonomy.top_level_category(a1), Some(a));
        assert_eq!(taxonomy.top_level_category(root), None);
        assert_eq!(taxonomy.descendants(root).len(), 4);

        let order = taxonomy.breadth_first();
        assert_eq!(order[0], root);
        assert_eq!(taxonomy.node(order[1]).name, "B");
        assert_eq!(order.len(), taxonomy.len());
    }
}
