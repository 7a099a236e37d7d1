use crate::chart::Chart;
use crate::config::RenderConfig;
use crate::data::Row;
use crate::layout::{NodeId, PackedNode};
use crate::theme::Theme;
use crate::zoom::{View, ZoomController};
use anyhow::Result;
use std::path::Path;

/// Interactive view at the controller's current zoom.
///
/// The drawing is centered on the view (viewBox origin at the canvas center).
/// Every circle carries `data-node="<id>"` on its group so the host can map
/// pointer events back to [`NodeId`]s; the `<svg>` element itself is the
/// background target.
pub fn render_interactive(
    chart: &Chart,
    rows: &[Row],
    zoom: &ZoomController,
    theme: &Theme,
    config: &RenderConfig,
) -> String {
    let width = zoom.width();
    let height = width;
    let view = zoom.view();
    let k = view.scale(width);
    let tree = &chart.tree;
    let prefix = &config.id_prefix;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{:.2} {:.2} {width:.2} {height:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" style=\"max-width: 100%; height: auto; display: block; cursor: pointer;\" font-family=\"{}\" font-size=\"{}\" text-anchor=\"middle\" data-role=\"canvas\">",
        -width / 2.0,
        -height / 2.0,
        escape_xml(&theme.font_family),
        theme.font_size,
    ));
    svg.push_str(&format!(
        "<style>.{prefix}-node:hover .{prefix}-shape{{stroke:{};}}</style>",
        theme.hover_stroke
    ));

    if tree.is_empty() {
        svg.push_str("</svg>");
        return svg;
    }

    let order = tree.descendants();

    svg.push_str("<g class=\"nodes\">");
    for &id in &order {
        let node = &tree.nodes()[id.0];
        let (tx, ty) = view.project(node.x, node.y, width);
        let r = node.r * k;
        svg.push_str(&format!(
            "<g class=\"{prefix}-node\" data-node=\"{}\" transform=\"translate({tx:.2},{ty:.2})\">",
            id.0
        ));
        if node.has_children() {
            svg.push_str(&format!(
                "<circle class=\"{prefix}-shape\" r=\"{r:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
                theme.group_fill, theme.group_stroke, theme.group_stroke_width
            ));
        } else {
            svg.push_str(&format!(
                "<circle class=\"{prefix}-shape\" r=\"{r:.2}\" fill=\"{}\"/>",
                escape_xml(chart.fill(node, rows, theme))
            ));
        }
        svg.push_str(&format!(
            "<circle class=\"{prefix}-hit\" r=\"{r:.2}\" fill=\"transparent\" pointer-events=\"all\"><title>{}</title></circle></g>",
            escape_xml(&chart.title(node, rows))
        ));
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"parent-labels\" pointer-events=\"none\">");
    for &id in &order {
        let node = &tree.nodes()[id.0];
        if !node.has_children() || node.depth == 0 {
            continue;
        }
        let label = zoom.label(id);
        let (cx, cy) = view.project(node.x, node.y, width);
        let r = node.r * k;
        let font_size = (r / 4.0).clamp(8.0, 14.0);
        let path_id = arc_path_id(prefix, id);
        svg.push_str(&format!(
            "<g><path id=\"{path_id}\" fill=\"none\" d=\"{}\"/>",
            upper_arc_path(cx, cy, r)
        ));
        let style = format!(
            "font: 10px {}; font-size: {font_size:.2}px; letter-spacing: -0.5px; fill-opacity: {:.3}; display: {};",
            theme.label_font_family,
            label.opacity,
            display(label.displayed)
        );
        let text = escape_xml(chart.label(node, rows));
        svg.push_str(&format!(
            "<text style=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"3\" stroke-linejoin=\"round\">{}</text>",
            escape_xml(&style),
            theme.label_halo_color,
            arc_text(&path_id, &text)
        ));
        svg.push_str(&format!(
            "<text style=\"{}\" fill=\"{}\">{}</text></g>",
            escape_xml(&style),
            theme.text_color,
            arc_text(&path_id, &text)
        ));
    }
    svg.push_str("</g>");

    svg.push_str(&format!(
        "<g class=\"leaf-labels\" style=\"font: 10px {}\" pointer-events=\"none\" text-anchor=\"middle\">",
        escape_xml(&theme.label_font_family)
    ));
    for &id in &order {
        let node = &tree.nodes()[id.0];
        if node.has_children() {
            continue;
        }
        let label = zoom.label(id);
        let (tx, ty) = view.project(node.x, node.y, width);
        svg.push_str(&format!(
            "<text transform=\"translate({tx:.2},{ty:.2})\" font-size=\"{:.2}px\" style=\"fill-opacity: {:.3}; display: {};\">{}</text>",
            leaf_font_size(node, view, width),
            label.opacity,
            display(label.displayed),
            escape_xml(chart.label(node, rows))
        ));
    }
    svg.push_str("</g>");

    svg.push_str("</svg>");
    svg
}

pub fn leaf_font_size(node: &PackedNode, view: View, width: f64) -> f64 {
    (node.r * view.scale(width) / 3.0).min(12.0)
}

fn display(displayed: bool) -> &'static str {
    if displayed { "inline" } else { "none" }
}

pub(crate) fn arc_path_id(prefix: &str, id: NodeId) -> String {
    format!("{prefix}-arc-{}", id.0)
}

/// Upper semicircle from 9 o'clock to 3 o'clock, so text runs left to right.
pub(crate) fn upper_arc_path(cx: f64, cy: f64, r: f64) -> String {
    format!(
        "M {:.2},{cy:.2} A {r:.2},{r:.2} 0 0,1 {:.2},{cy:.2}",
        cx - r,
        cx + r
    )
}

pub(crate) fn arc_text(path_id: &str, text: &str) -> String {
    format!(
        "<textPath href=\"#{path_id}\" startOffset=\"50%\" text-anchor=\"middle\">{text}</textPath>"
    )
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Helvetica".to_string();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .or_else(|| usvg::Size::from_wh(800.0, 800.0))
        .ok_or_else(|| anyhow::anyhow!("Invalid render size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ColumnSelection;
    use crate::config::{PackConfig, ZoomConfig};
    use crate::layout::PackOptions;

    fn rows() -> Vec<Row> {
        vec![
            [("country", "US"), ("state", "CA"), ("city", "LA")].into_iter().collect(),
            [("country", "US"), ("state", "CA"), ("city", "S&F")].into_iter().collect(),
            [("country", "US"), ("state", "NY"), ("city", "NYC")].into_iter().collect(),
        ]
    }

    fn chart(rows: &[Row]) -> Chart {
        let selection = ColumnSelection::new(vec!["country".into(), "state".into()], "city", "country");
        Chart::build(rows, &selection, PackOptions::square(500.0, &PackConfig::default())).unwrap()
    }

    #[test]
    fn renders_circles_labels_and_hit_regions() {
        let rows = rows();
        let chart = chart(&rows);
        let zoom = ZoomController::new(&chart.tree, 500.0, 1, ZoomConfig::default());
        let svg = render_interactive(&chart, &rows, &zoom, &Theme::classic(), &RenderConfig::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("data-node=").count(), chart.tree.len());
        assert_eq!(svg.matches("pointer-events=\"all\"").count(), chart.tree.len());
        assert!(svg.contains("circle-pack-arc-1"));
        assert!(svg.contains("S&amp;F"));
        assert!(svg.contains("<title>LA - US</title>"));
        assert!(svg.contains(chart.colors.color_for("US").unwrap()));
    }

    #[test]
    fn only_root_children_are_labelled_initially() {
        let rows = rows();
        let chart = chart(&rows);
        let zoom = ZoomController::new(&chart.tree, 500.0, 1, ZoomConfig::default());
        let svg = render_interactive(&chart, &rows, &zoom, &Theme::classic(), &RenderConfig::default());
        let visible = svg.matches("display: inline;").count();
        // "US" is drawn twice: halo and text.
        assert_eq!(visible, 2);
    }

    #[test]
    fn empty_chart_is_an_empty_canvas() {
        let rows: Vec<Row> = Vec::new();
        let chart = chart(&rows);
        let zoom = ZoomController::new(&chart.tree, 500.0, 1, ZoomConfig::default());
        let svg = render_interactive(&chart, &rows, &zoom, &Theme::classic(), &RenderConfig::default());
        assert!(!svg.contains("<circle"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn leaf_font_is_capped() {
        let rows = rows();
        let chart = chart(&rows);
        let view = View::of_node(chart.tree.root());
        for leaf in chart.tree.leaves() {
            let size = leaf_font_size(leaf, view, 500.0);
            assert!(size <= 12.0);
            assert!((size - (leaf.r / 3.0).min(12.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn arc_runs_over_the_top() {
        assert_eq!(
            upper_arc_path(10.0, 20.0, 5.0),
            "M 5.00,20.00 A 5.00,5.00 0 0,1 15.00,20.00"
        );
    }
}
