use std::collections::HashSet;

use circle_packer::chart::{Chart, ColumnSelection};
use circle_packer::color::assign_colors;
use circle_packer::config::{ExportConfig, PackConfig, ZoomConfig};
use circle_packer::export::export_svg;
use circle_packer::layout::{PackOptions, PackedTree, pack};
use circle_packer::theme::Theme;
use circle_packer::tree::build_tree;
use circle_packer::zoom::ZoomController;
use circle_packer::{Dataset, Row};

const EPS: f64 = 1e-6;

fn rows(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            [
                ("a", format!("a{}", i % 4)),
                ("b", format!("b{}", (i * 7) % 5)),
                ("c", format!("c{}", i % 3)),
                ("name", format!("item {i}")),
            ]
            .into_iter()
            .collect()
        })
        .collect()
}

fn packed(rows: &[Row], columns: &[&str], size: f64) -> PackedTree {
    pack(
        &build_tree(rows, columns),
        &PackOptions::square(size, &PackConfig::default()),
    )
}

fn distance(tree: &PackedTree, a: usize, b: usize) -> f64 {
    let (a, b) = (&tree.nodes()[a], &tree.nodes()[b]);
    (a.x - b.x).hypot(a.y - b.y)
}

#[test]
fn every_row_becomes_exactly_one_leaf() {
    let rows = rows(137);
    let tree = packed(&rows, &["a", "b", "c"], 900.0);
    let leaves = tree.leaves();
    assert_eq!(leaves.len(), rows.len());
    let seen: HashSet<usize> = leaves.iter().filter_map(|leaf| leaf.row()).collect();
    assert_eq!(seen.len(), rows.len());

    let mut indices: Vec<usize> = leaves.iter().filter_map(|leaf| leaf.index).collect();
    indices.sort_unstable();
    assert_eq!(indices, (0..rows.len()).collect::<Vec<_>>());
}

#[test]
fn children_stay_inside_parents_and_apart_from_siblings() {
    let rows = rows(200);
    let padding = PackConfig::default().padding;
    let tree = packed(&rows, &["a", "b"], 1000.0);

    for node in tree.nodes() {
        for child in &node.children {
            let c = &tree.nodes()[child.0];
            let d = distance(&tree, node.id.0, child.0);
            assert!(
                d + c.r <= node.r - padding * 0.5 + EPS,
                "node {} escapes parent {}",
                child.0,
                node.id.0
            );
        }
        for (i, a) in node.children.iter().enumerate() {
            for b in &node.children[i + 1..] {
                let (ra, rb) = (tree.nodes()[a.0].r, tree.nodes()[b.0].r);
                let d = distance(&tree, a.0, b.0);
                assert!(
                    d >= ra + rb + padding * 0.5 - EPS,
                    "siblings {} and {} overlap",
                    a.0,
                    b.0
                );
            }
        }
    }
}

#[test]
fn parent_value_is_sum_of_children() {
    let rows = rows(60);
    let tree = packed(&rows, &["a", "c"], 640.0);
    for node in tree.nodes() {
        if node.has_children() {
            let sum: f64 = node.children.iter().map(|c| tree.nodes()[c.0].value).sum();
            assert!((node.value - sum).abs() < EPS);
        } else {
            assert_eq!(node.value, 1000.0);
        }
    }
    assert_eq!(tree.root().value, 60_000.0);
}

#[test]
fn layout_is_idempotent() {
    let rows = rows(90);
    let first = packed(&rows, &["a", "b"], 700.0);
    let second = packed(&rows, &["a", "b"], 700.0);
    assert_eq!(first.len(), second.len());
    for (a, b) in first.nodes().iter().zip(second.nodes()) {
        assert_eq!((a.x, a.y, a.r), (b.x, b.y, b.r));
    }
}

#[test]
fn colors_are_stable_per_value() {
    let rows = rows(40);
    let colors = assign_colors(&rows, "b");
    assert_eq!(colors.len(), 5);
    assert_eq!(colors, assign_colors(&rows, "b"));

    let first: Vec<&str> = colors.entries().iter().map(|e| e.value.as_str()).collect();
    assert_eq!(first, ["b0", "b2", "b4", "b1", "b3"]);
    for row in &rows {
        assert!(colors.color_for(row.get_or_empty("b")).is_some());
    }
}

#[test]
fn zoom_round_trip_restores_the_view() {
    let rows = rows(30);
    let tree = packed(&rows, &["a", "b"], 600.0);
    let mut zoom = ZoomController::new(&tree, 600.0, 1, ZoomConfig::default());
    let initial = zoom.view();

    let target = tree.root().children[0];
    let there = zoom.focus_node(&tree, target, 0.0, false).unwrap();
    zoom.advance(there.token, there.duration).unwrap();
    let back = zoom.focus_root(&tree, 1000.0, false).unwrap();
    let frame = zoom.advance(back.token, 1000.0 + back.duration).unwrap();

    assert!(frame.done);
    assert!((zoom.view().cx - initial.cx).abs() < EPS);
    assert!((zoom.view().cy - initial.cy).abs() < EPS);
    assert!((zoom.view().diameter - initial.diameter).abs() < EPS);
}

#[test]
fn us_states_scenario() {
    let dataset =
        Dataset::from_csv_str("country,state,city\nUS,CA,LA\nUS,CA,SF\nUS,NY,NYC\n").unwrap();
    let selection = ColumnSelection::new(vec!["country".into(), "state".into()], "city", "country");
    let chart = Chart::build(&dataset.rows, &selection, PackOptions::default()).unwrap();

    assert_eq!(chart.grouping.children.len(), 1);
    let us = chart.grouping.group("US").unwrap();
    assert_eq!(us.group("CA").unwrap().leaf_count(), 2);
    assert_eq!(us.group("NY").unwrap().leaf_count(), 1);
    assert_eq!(chart.colors.len(), 1);
    assert!(chart.colors.color_for("US").is_some());
}

#[test]
fn empty_rows_render_nothing() {
    let rows: Vec<Row> = Vec::new();
    let tree = packed(&rows, &["a"], 500.0);
    assert_eq!(tree.root().r, 0.0);
    assert!(tree.root().children.is_empty());
    assert!(tree.is_empty());
}

#[test]
fn long_label_export_scales_smallest_leaf() {
    let label = "abcdefghij".repeat(4);
    let rows: Vec<Row> = vec![[("name", label.as_str()), ("kind", "k")].into_iter().collect()];
    let selection = ColumnSelection::new(Vec::new(), "name", "kind");
    let chart = Chart::build(&rows, &selection, PackOptions::default()).unwrap();
    let doc = export_svg(&chart, &rows, &Theme::classic(), &ExportConfig::default()).unwrap();

    assert_eq!(doc.min_leaf_radius, 130.0);
    let inner = doc.diagram_size - 2.0;
    let repacked = pack(
        &chart.grouping,
        &PackOptions::square(inner, &PackConfig::default())
            .with_margin(0.0)
            .with_padding(3.0 * doc.scale_factor),
    );
    let smallest = repacked.smallest_leaf_radius().unwrap();
    assert!((smallest - 130.0).abs() < 1.0, "smallest leaf {smallest}");
}
