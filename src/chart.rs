use crate::color::{ColorMap, assign_colors};
use crate::data::Row;
use crate::error::{CirclePackError, RequiredColumn};
use crate::layout::{NodeKind, PackOptions, PackedNode, PackedTree, pack};
use crate::theme::Theme;
use crate::tree::{GroupNode, build_tree};
use serde::{Deserialize, Serialize};

pub const MAX_GROUPING_LEVELS: usize = 3;

/// Column names chosen by the user. Empty strings mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnSelection {
    pub grouping: Vec<String>,
    pub label: String,
    pub color: String,
}

impl ColumnSelection {
    pub fn new(grouping: Vec<String>, label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            grouping,
            label: label.into(),
            color: color.into(),
        }
    }

    pub fn grouping_columns(&self) -> Vec<&str> {
        self.grouping
            .iter()
            .map(String::as_str)
            .filter(|column| !column.is_empty())
            .collect()
    }

    pub fn validate(&self) -> Result<(), CirclePackError> {
        if self.label.is_empty() {
            return Err(CirclePackError::MissingColumn(RequiredColumn::Label));
        }
        if self.color.is_empty() {
            return Err(CirclePackError::MissingColumn(RequiredColumn::Color));
        }
        if self.grouping.len() > MAX_GROUPING_LEVELS {
            return Err(CirclePackError::TooManyGroupingColumns {
                got: self.grouping.len(),
                max: MAX_GROUPING_LEVELS,
            });
        }
        Ok(())
    }
}

/// Everything one render produces: grouping tree, packed layout and colors.
#[derive(Debug, Clone)]
pub struct Chart {
    pub selection: ColumnSelection,
    pub grouping: GroupNode,
    pub tree: PackedTree,
    pub colors: ColorMap,
    pub options: PackOptions,
}

impl Chart {
    pub fn build(
        rows: &[Row],
        selection: &ColumnSelection,
        options: PackOptions,
    ) -> Result<Self, CirclePackError> {
        selection.validate()?;
        let grouping = build_tree(rows, &selection.grouping_columns());
        let colors = assign_colors(rows, &selection.color);
        let tree = pack(&grouping, &options);
        Ok(Self {
            selection: selection.clone(),
            grouping,
            tree,
            colors,
            options,
        })
    }

    /// Group name for groups, label-column value for leaves.
    pub fn label<'a>(&'a self, node: &'a PackedNode, rows: &'a [Row]) -> &'a str {
        match &node.kind {
            NodeKind::Group { name } => name,
            NodeKind::Leaf { row } => rows
                .get(*row)
                .map(|row| row.get_or_empty(&self.selection.label))
                .unwrap_or(""),
        }
    }

    pub fn title(&self, node: &PackedNode, rows: &[Row]) -> String {
        match &node.kind {
            NodeKind::Group { name } => name.clone(),
            NodeKind::Leaf { row } => {
                let color_value = rows
                    .get(*row)
                    .map(|row| row.get_or_empty(&self.selection.color))
                    .unwrap_or("");
                format!("{} - {}", self.label(node, rows), color_value)
            }
        }
    }

    pub fn fill<'a>(&'a self, node: &PackedNode, rows: &[Row], theme: &'a Theme) -> &'a str {
        match &node.kind {
            NodeKind::Group { .. } => &theme.group_fill,
            NodeKind::Leaf { row } => rows
                .get(*row)
                .and_then(|row| self.colors.color_for(row.get_or_empty(&self.selection.color)))
                .unwrap_or(&theme.leaf_fill),
        }
    }

    pub fn longest_label_chars(&self, rows: &[Row]) -> usize {
        self.tree
            .leaves()
            .into_iter()
            .map(|leaf| self.label(leaf, rows).chars().count())
            .max()
            .unwrap_or(0)
    }
}
