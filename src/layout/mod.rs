mod enclose;
mod siblings;

use crate::config::PackConfig;
use crate::data::RowId;
use crate::tree::{GroupNode, TreeChild};
use serde::Serialize;
use siblings::pack_siblings;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Circle {
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

impl Circle {
    pub fn new(x: f64, y: f64, r: f64) -> Self {
        Self { x, y, r }
    }
}

/// Linear congruential generator seeded at 1, used to shuffle enclosure
/// input so layouts are reproducible run to run.
#[derive(Debug, Clone)]
pub(crate) struct Lcg {
    state: u64,
}

impl Lcg {
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;
    const M: u64 = 1 << 32;

    pub fn new() -> Self {
        Self { state: 1 }
    }

    pub fn next_f64(&mut self) -> f64 {
        self.state = (Self::A * self.state + Self::C) % Self::M;
        self.state as f64 / Self::M as f64
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        let mut m = items.len();
        while m > 0 {
            let i = (self.next_f64() * m as f64) as usize;
            m -= 1;
            items.swap(m, i);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Group { name: String },
    Leaf { row: RowId },
}

#[derive(Debug, Clone)]
pub struct PackedNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub depth: usize,
    pub value: f64,
    /// Position among leaves, left to right after sorting. `None` for groups.
    pub index: Option<usize>,
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

impl PackedNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    pub fn group_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Group { name } => Some(name),
            NodeKind::Leaf { .. } => None,
        }
    }

    pub fn row(&self) -> Option<RowId> {
        match self.kind {
            NodeKind::Leaf { row } => Some(row),
            NodeKind::Group { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackOptions {
    pub width: f64,
    pub height: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    /// Gap kept between sibling circles and between a circle and its parent.
    pub padding: f64,
    pub leaf_weight: f64,
}

impl PackOptions {
    pub fn square(size: f64, config: &PackConfig) -> Self {
        Self {
            width: size,
            height: size,
            margin_top: config.margin,
            margin_right: config.margin,
            margin_bottom: config.margin,
            margin_left: config.margin,
            padding: config.padding,
            leaf_weight: config.leaf_weight,
        }
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin_top = margin;
        self.margin_right = margin;
        self.margin_bottom = margin;
        self.margin_left = margin;
        self
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    fn inner_width(&self) -> f64 {
        (self.width - self.margin_left - self.margin_right).max(0.0)
    }

    fn inner_height(&self) -> f64 {
        (self.height - self.margin_top - self.margin_bottom).max(0.0)
    }
}

impl Default for PackOptions {
    fn default() -> Self {
        Self::square(640.0, &PackConfig::default())
    }
}

/// Packed circles stored in an arena; `NodeId(0)` is the root.
#[derive(Debug, Clone)]
pub struct PackedTree {
    nodes: Vec<PackedNode>,
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl PackedTree {
    pub fn root(&self) -> &PackedNode {
        &self.nodes[0]
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> Option<&PackedNode> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> &[PackedNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Nothing to draw: the root has no children.
    pub fn is_empty(&self) -> bool {
        !self.root().has_children()
    }

    /// Pre-order traversal following the sorted child order.
    pub fn descendants(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![NodeId(0)];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    /// Children before parents.
    fn post_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(NodeId(0), false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                out.push(id);
                continue;
            }
            stack.push((id, true));
            stack.extend(
                self.nodes[id.0]
                    .children
                    .iter()
                    .rev()
                    .map(|&child| (child, false)),
            );
        }
        out
    }

    pub fn leaves(&self) -> Vec<&PackedNode> {
        self.descendants()
            .into_iter()
            .map(|id| &self.nodes[id.0])
            .filter(|node| node.is_leaf())
            .collect()
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|node| node.depth).max().unwrap_or(0)
    }

    pub fn smallest_leaf_radius(&self) -> Option<f64> {
        self.nodes
            .iter()
            .filter(|node| node.is_leaf())
            .map(|node| node.r)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
    }

    /// Follows group names from the root, e.g. `["US", "CA"]`.
    pub fn find_group_path<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeId> {
        let mut current = NodeId(0);
        for name in path {
            current = *self.nodes[current.0].children.iter().find(|child| {
                self.nodes[child.0].group_name() == Some(name.as_ref())
            })?;
        }
        Some(current)
    }

    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.node(id).and_then(|node| node.parent);
        while let Some(parent) = cursor {
            out.push(parent);
            cursor = self.nodes[parent.0].parent;
        }
        out
    }

    fn insert(&mut self, kind: NodeKind, parent: Option<NodeId>, depth: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(PackedNode {
            id,
            kind,
            parent,
            children: Vec::new(),
            depth,
            value: 0.0,
            index: None,
            x: 0.0,
            y: 0.0,
            r: 0.0,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    fn insert_group(&mut self, group: &GroupNode, parent: Option<NodeId>, depth: usize) -> NodeId {
        let id = self.insert(
            NodeKind::Group {
                name: group.name.clone(),
            },
            parent,
            depth,
        );
        for child in &group.children {
            match child {
                TreeChild::Group(sub) => {
                    self.insert_group(sub, Some(id), depth + 1);
                }
                TreeChild::Row(row) => {
                    self.insert(NodeKind::Leaf { row: *row }, Some(id), depth + 1);
                }
            }
        }
        id
    }

    fn sum_values(&mut self, leaf_weight: f64) {
        // Children always sit at higher indices than their parent.
        let weight = leaf_weight.max(0.0);
        for index in (0..self.nodes.len()).rev() {
            let value = if self.nodes[index].is_leaf() {
                weight
            } else {
                self.nodes[index]
                    .children
                    .iter()
                    .map(|child| self.nodes[child.0].value)
                    .sum::<f64>()
            };
            self.nodes[index].value = value;
        }
    }

    fn sort_children(&mut self) {
        let values: Vec<f64> = self.nodes.iter().map(|node| node.value).collect();
        for node in &mut self.nodes {
            node.children.sort_by(|a, b| {
                values[b.0]
                    .partial_cmp(&values[a.0])
                    .unwrap_or(Ordering::Equal)
            });
        }
    }

    fn index_leaves(&mut self) {
        let order = self.descendants();
        let mut next = 0;
        for id in order {
            let node = &mut self.nodes[id.0];
            if node.is_leaf() {
                node.index = Some(next);
                next += 1;
            }
        }
    }

    fn pack_children(&mut self, id: NodeId, padding: f64, rng: &mut Lcg) {
        let children = self.nodes[id.0].children.clone();
        if children.is_empty() {
            return;
        }
        let mut circles: Vec<Circle> = children
            .iter()
            .map(|child| {
                let node = &self.nodes[child.0];
                Circle::new(node.x, node.y, node.r + padding)
            })
            .collect();
        let enclosing = pack_siblings(&mut circles, rng);
        for (child, circle) in children.iter().zip(&circles) {
            let node = &mut self.nodes[child.0];
            node.x = circle.x;
            node.y = circle.y;
            node.r = circle.r - padding;
        }
        self.nodes[id.0].r = enclosing + padding;
    }

    fn layout(&mut self, options: &PackOptions) {
        let dx = options.inner_width();
        let dy = options.inner_height();
        let (cx, cy) = (
            options.margin_left + dx / 2.0,
            options.margin_top + dy / 2.0,
        );

        for node in &mut self.nodes {
            node.r = if node.is_leaf() { node.value.sqrt() } else { 0.0 };
        }

        let post_order = self.post_order();
        let mut rng = Lcg::new();
        for &id in &post_order {
            self.pack_children(id, 0.0, &mut rng);
        }

        let side = dx.min(dy);
        let unpadded_root = self.nodes[0].r;
        if self.is_empty() || unpadded_root <= 0.0 || side <= 0.0 {
            for node in &mut self.nodes {
                node.x = cx;
                node.y = cy;
                node.r = 0.0;
            }
            return;
        }

        let padding = options.padding.max(0.0) * unpadded_root / side;
        if padding > 0.0 {
            for &id in &post_order {
                self.pack_children(id, padding, &mut rng);
            }
        }

        let k = side / (2.0 * self.nodes[0].r);
        self.nodes[0].x = cx;
        self.nodes[0].y = cy;
        self.nodes[0].r *= k;
        for id in self.descendants().into_iter().skip(1) {
            let Some(parent) = self.nodes[id.0].parent else {
                continue;
            };
            let (px, py) = (self.nodes[parent.0].x, self.nodes[parent.0].y);
            let node = &mut self.nodes[id.0];
            node.x = px + k * node.x;
            node.y = py + k * node.y;
            node.r *= k;
        }
    }
}

/// Packs `tree` into `options.width × options.height`.
///
/// Leaves weigh `leaf_weight`, groups the sum of their children; children are
/// sorted largest first. Circles are packed bottom-up, first without padding to
/// find the overall scale, then again with padding expressed in that scale, and
/// finally scaled so the root fits the inner viewport.
pub fn pack(tree: &GroupNode, options: &PackOptions) -> PackedTree {
    let mut packed = PackedTree {
        nodes: Vec::new(),
        width: options.width,
        height: options.height,
        padding: options.padding,
    };
    packed.insert_group(tree, None, 0);
    packed.sum_values(options.leaf_weight);
    packed.sort_children();
    packed.index_leaves();
    packed.layout(options);
    tracing::debug!(
        nodes = packed.len(),
        width = options.width,
        height = options.height,
        root_r = packed.root().r,
        "packed circles"
    );
    packed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Row;
    use crate::tree::build_tree;

    fn rows(count: usize) -> Vec<Row> {
        (0..count)
            .map(|i| {
                let a = format!("g{}", i % 4);
                let b = format!("s{}", i % 9);
                [("a", a), ("b", b), ("name", format!("leaf {i}"))]
                    .into_iter()
                    .collect()
            })
            .collect()
    }

    fn packed(count: usize, size: f64) -> PackedTree {
        let tree = build_tree(&rows(count), &["a", "b"]);
        pack(&tree, &PackOptions::square(size, &PackConfig::default()))
    }

    #[test]
    fn values_sum_bottom_up() {
        let packed = packed(37, 600.0);
        assert_eq!(packed.root().value, 37.0 * 1000.0);
        for node in packed.nodes() {
            if node.has_children() {
                let sum: f64 = node.children.iter().map(|c| packed.nodes()[c.0].value).sum();
                assert_eq!(node.value, sum);
            }
        }
    }

    #[test]
    fn children_sorted_largest_first_and_leaves_indexed() {
        let packed = packed(37, 600.0);
        for node in packed.nodes() {
            let values: Vec<f64> = node.children.iter().map(|c| packed.nodes()[c.0].value).collect();
            assert!(values.windows(2).all(|w| w[0] >= w[1]));
        }
        let indices: Vec<usize> = packed.leaves().iter().filter_map(|leaf| leaf.index).collect();
        assert_eq!(indices, (0..37).collect::<Vec<_>>());
    }

    #[test]
    fn ties_keep_original_order() {
        let tree = build_tree(&rows(8), &["a"]);
        let packed = pack(&tree, &PackOptions::default());
        let names: Vec<&str> = packed
            .root()
            .children
            .iter()
            .filter_map(|c| packed.nodes()[c.0].group_name())
            .collect();
        assert_eq!(names, vec!["g0", "g1", "g2", "g3"]);
    }

    #[test]
    fn root_fills_the_inner_viewport() {
        let packed = packed(20, 500.0);
        let root = packed.root();
        assert!((root.r - 249.0).abs() < 1e-9);
        assert!((root.x - 250.0).abs() < 1e-9);
        assert!((root.y - 250.0).abs() < 1e-9);
    }

    #[test]
    fn depth_and_parent_links() {
        let packed = packed(10, 400.0);
        for node in packed.nodes() {
            match node.parent {
                None => assert_eq!(node.depth, 0),
                Some(parent) => {
                    assert_eq!(packed.nodes()[parent.0].depth + 1, node.depth);
                    assert!(packed.nodes()[parent.0].children.contains(&node.id));
                }
            }
        }
        assert_eq!(packed.max_depth(), 3);
    }

    #[test]
    fn empty_tree_has_zero_radius() {
        let tree = build_tree(&[], &["a"]);
        let packed = pack(&tree, &PackOptions::default());
        assert!(packed.is_empty());
        assert_eq!(packed.root().r, 0.0);
        assert_eq!(packed.len(), 1);
        assert!(packed.smallest_leaf_radius().is_none());
    }

    #[test]
    fn finds_groups_by_path() {
        let packed = packed(12, 400.0);
        let id = packed.find_group_path(&["g1", "s1"]).unwrap();
        let node = packed.node(id).unwrap();
        assert_eq!(node.group_name(), Some("s1"));
        assert_eq!(packed.ancestors(id).len(), 2);
        assert!(packed.find_group_path(&["nope"]).is_none());
    }

    #[test]
    fn lcg_matches_reference_sequence() {
        let mut rng = Lcg::new();
        let first = rng.next_f64();
        assert!((first - 1_015_568_748.0 / 4_294_967_296.0).abs() < 1e-15);
    }
}
