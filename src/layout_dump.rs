use crate::chart::Chart;
use crate::color::ColorEntry;
use crate::data::Row;
use crate::layout::NodeKind;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub grouping: Vec<String>,
    pub label_column: String,
    pub color_column: String,
    pub max_depth: usize,
    pub nodes: Vec<NodeDump>,
    pub colors: Vec<ColorEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: usize,
    pub parent: Option<usize>,
    pub kind: &'static str,
    pub label: String,
    pub row: Option<usize>,
    pub depth: usize,
    pub value: f64,
    pub index: Option<usize>,
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub children: Vec<usize>,
}

impl LayoutDump {
    pub fn from_chart(chart: &Chart, rows: &[Row]) -> Self {
        let tree = &chart.tree;
        let nodes = tree
            .descendants()
            .into_iter()
            .filter_map(|id| tree.node(id))
            .map(|node| NodeDump {
                id: node.id.0,
                parent: node.parent.map(|parent| parent.0),
                kind: match node.kind {
                    NodeKind::Group { .. } => "group",
                    NodeKind::Leaf { .. } => "leaf",
                },
                label: chart.label(node, rows).to_string(),
                row: node.row(),
                depth: node.depth,
                value: node.value,
                index: node.index,
                x: node.x,
                y: node.y,
                r: node.r,
                children: node.children.iter().map(|child| child.0).collect(),
            })
            .collect();

        LayoutDump {
            width: tree.width,
            height: tree.height,
            padding: tree.padding,
            grouping: chart.selection.grouping.clone(),
            label_column: chart.selection.label.clone(),
            color_column: chart.selection.color.clone(),
            max_depth: tree.max_depth(),
            nodes,
            colors: chart.colors.entries().to_vec(),
        }
    }
}

pub fn write_layout_dump(path: &Path, chart: &Chart, rows: &[Row]) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_chart(chart, rows);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ColumnSelection;
    use crate::config::PackConfig;
    use crate::layout::PackOptions;

    #[test]
    fn dump_lists_nodes_in_pre_order() {
        let rows: Vec<Row> = vec![
            [("team", "a"), ("who", "ann")].into_iter().collect(),
            [("team", "b"), ("who", "bob")].into_iter().collect(),
            [("team", "a"), ("who", "amy")].into_iter().collect(),
        ];
        let selection = ColumnSelection::new(vec!["team".into()], "who", "team");
        let chart = Chart::build(&rows, &selection, PackOptions::square(300.0, &PackConfig::default())).unwrap();
        let dump = LayoutDump::from_chart(&chart, &rows);

        assert_eq!(dump.nodes.len(), chart.tree.len());
        assert_eq!(dump.nodes[0].kind, "group");
        assert_eq!(dump.nodes[0].parent, None);
        assert_eq!(dump.nodes[1].label, "a");
        assert_eq!(dump.max_depth, 2);

        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(json["labelColumn"], "who");
        assert_eq!(json["colors"].as_array().unwrap().len(), 2);
        assert!(json["nodes"][0]["children"].is_array());
    }
}
