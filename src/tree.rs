use crate::data::{Row, RowId};
use std::collections::HashMap;

pub const ROOT_NAME: &str = "pack";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeChild {
    Group(GroupNode),
    Row(RowId),
}

/// A grouping level. Children keep the order in which their keys were first seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNode {
    pub name: String,
    pub children: Vec<TreeChild>,
}

impl GroupNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                TreeChild::Group(group) => group.leaf_count(),
                TreeChild::Row(_) => 1,
            })
            .sum()
    }

    /// Row ids in depth-first order.
    pub fn row_ids(&self) -> Vec<RowId> {
        let mut out = Vec::new();
        self.collect_rows(&mut out);
        out
    }

    fn collect_rows(&self, out: &mut Vec<RowId>) {
        for child in &self.children {
            match child {
                TreeChild::Group(group) => group.collect_rows(out),
                TreeChild::Row(id) => out.push(*id),
            }
        }
    }

    pub fn groups(&self) -> impl Iterator<Item = &GroupNode> {
        self.children.iter().filter_map(|child| match child {
            TreeChild::Group(group) => Some(group),
            TreeChild::Row(_) => None,
        })
    }

    pub fn group(&self, name: &str) -> Option<&GroupNode> {
        self.groups().find(|group| group.name == name)
    }

    pub fn depth(&self) -> usize {
        self.groups().map(|group| group.depth() + 1).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Group(usize),
    Row(RowId),
}

#[derive(Debug)]
struct BuilderNode {
    name: String,
    groups: Vec<BuilderNode>,
    by_key: HashMap<String, usize>,
    order: Vec<Slot>,
}

impl BuilderNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            groups: Vec::new(),
            by_key: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn child_mut(&mut self, key: &str) -> &mut BuilderNode {
        let index = match self.by_key.get(key) {
            Some(&index) => index,
            None => {
                let index = self.groups.len();
                self.groups.push(BuilderNode::new(key));
                self.by_key.insert(key.to_string(), index);
                self.order.push(Slot::Group(index));
                index
            }
        };
        &mut self.groups[index]
    }

    fn finish(self) -> GroupNode {
        let mut groups: Vec<Option<GroupNode>> = self
            .groups
            .into_iter()
            .map(|group| Some(group.finish()))
            .collect();
        let children = self
            .order
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Group(index) => groups[index].take().map(TreeChild::Group),
                Slot::Row(id) => Some(TreeChild::Row(id)),
            })
            .collect();
        GroupNode {
            name: self.name,
            children,
        }
    }
}

/// Folds rows into nested groups keyed by grouping-column values.
///
/// Blank column names are skipped. A row that lacks a grouping column stops
/// descending and is attached at the level reached so far; an empty value is a
/// regular key.
#[derive(Debug)]
pub struct TreeBuilder {
    columns: Vec<String>,
    root: BuilderNode,
}

impl TreeBuilder {
    pub fn new<S: AsRef<str>>(grouping_columns: &[S]) -> Self {
        let columns = grouping_columns
            .iter()
            .map(|column| column.as_ref())
            .filter(|column| !column.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            columns,
            root: BuilderNode::new(ROOT_NAME),
        }
    }

    pub fn insert(&mut self, id: RowId, row: &Row) {
        let mut node = &mut self.root;
        for column in &self.columns {
            let Some(key) = row.get(column) else {
                break;
            };
            node = node.child_mut(key);
        }
        node.order.push(Slot::Row(id));
    }

    pub fn finish(self) -> GroupNode {
        self.root.finish()
    }
}

pub fn build_tree<S: AsRef<str>>(rows: &[Row], grouping_columns: &[S]) -> GroupNode {
    let mut builder = TreeBuilder::new(grouping_columns);
    for (id, row) in rows.iter().enumerate() {
        builder.insert(id, row);
    }
    let tree = builder.finish();
    tracing::debug!(rows = rows.len(), depth = tree.depth(), "built grouping tree");
    tree
}
