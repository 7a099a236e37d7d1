//! Static, downloadable rendering of a chart.
//!
//! The export re-packs the tree at a size where the smallest leaf can hold its
//! label at a fixed 11px font, then lays a legend out to the right of the
//! diagram.

use crate::chart::Chart;
use crate::color::ColorMap;
use crate::config::ExportConfig;
use crate::data::Row;
use crate::error::CirclePackError;
use crate::layout::{PackOptions, PackedTree, pack};
use crate::render::{arc_path_id, arc_text, escape_xml, upper_arc_path};
use crate::theme::Theme;

const LEGEND_TITLE: &str = "Legend";
const LEGEND_TITLE_SCALE: f64 = 1.2;
const LEGEND_FIRST_ITEM: f64 = 1.5;
const LEGEND_LINE_HEIGHT: f64 = 1.4;
const LEGEND_BASELINE_SHIFT: f64 = 0.35;
const LEGEND_TEXT_GAP: f64 = 8.0;

#[derive(Debug, Clone)]
pub struct ExportDocument {
    pub file_name: String,
    pub svg: String,
    pub width: f64,
    pub height: f64,
    pub diagram_size: f64,
    pub scale_factor: f64,
    pub min_leaf_radius: f64,
}

/// Radius a leaf needs so a label of `chars` characters fits at 11px.
pub fn min_leaf_radius(chars: usize, config: &ExportConfig) -> f64 {
    config
        .min_leaf_radius
        .max(chars as f64 * config.char_width / 2.0 + config.label_padding)
}

/// Parent label scale: largest at depth 1, smallest at the deepest parent.
pub fn font_multiplier(depth: usize, max_depth: usize, config: &ExportConfig) -> f64 {
    let max = config.parent_font_max_scale;
    if max_depth <= 1 {
        return max;
    }
    let step = (max - config.parent_font_min_scale) / (max_depth - 1) as f64;
    max - depth.saturating_sub(1) as f64 * step
}

pub fn export_svg(
    chart: &Chart,
    rows: &[Row],
    theme: &Theme,
    config: &ExportConfig,
) -> Result<ExportDocument, CirclePackError> {
    if chart.tree.is_empty() {
        return Err(CirclePackError::NothingRendered);
    }

    let base = PackOptions {
        width: config.base_size,
        height: config.base_size,
        margin_top: 0.0,
        margin_right: 0.0,
        margin_bottom: 0.0,
        margin_left: 0.0,
        padding: config.base_padding,
        leaf_weight: chart.options.leaf_weight,
    };
    let initial = pack(&chart.grouping, &base);
    let smallest = initial
        .smallest_leaf_radius()
        .filter(|r| *r > 0.0)
        .ok_or(CirclePackError::NothingRendered)?;

    let min_radius = min_leaf_radius(chart.longest_label_chars(rows), config);
    let scale_factor = min_radius / smallest;
    let diagram_size = (config.base_size * scale_factor).ceil();

    let inner = (diagram_size - 2.0 * config.margin).max(0.0);
    let options = PackOptions {
        width: inner,
        height: inner,
        padding: config.base_padding * scale_factor,
        ..base
    };
    let tree = pack(&chart.grouping, &options);
    tracing::debug!(
        diagram_size,
        scale_factor,
        min_radius,
        smallest = tree.smallest_leaf_radius().unwrap_or(0.0),
        "export layout"
    );

    let width = diagram_size + config.legend_gap + config.legend_width;
    let height = diagram_size.max(legend_height(&chart.colors, config));

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height:.2}\" viewBox=\"0 0 {width} {height:.2}\" font-family=\"{}\">",
        escape_xml(&config.font_family)
    ));
    svg.push_str(&format!(
        "<rect width=\"{width}\" height=\"{height:.2}\" fill=\"{}\"/>",
        theme.background
    ));
    write_defs(&mut svg, &tree);
    write_diagram(&mut svg, chart, &tree, rows, theme, config);
    write_legend(&mut svg, &chart.colors, theme, diagram_size, config);
    svg.push_str("</svg>");

    Ok(ExportDocument {
        file_name: config.file_name.clone(),
        svg,
        width,
        height,
        diagram_size,
        scale_factor,
        min_leaf_radius: min_radius,
    })
}

const EXPORT_PREFIX: &str = "export";

fn write_defs(svg: &mut String, tree: &PackedTree) {
    svg.push_str("<defs>");
    for node in tree.nodes() {
        if node.has_children() && node.depth > 0 {
            svg.push_str(&format!(
                "<path id=\"{}\" d=\"{}\"/>",
                arc_path_id(EXPORT_PREFIX, node.id),
                upper_arc_path(node.x, node.y, node.r)
            ));
        }
    }
    svg.push_str("</defs>");
}

fn write_diagram(
    svg: &mut String,
    chart: &Chart,
    tree: &PackedTree,
    rows: &[Row],
    theme: &Theme,
    config: &ExportConfig,
) {
    let order = tree.descendants();
    svg.push_str(&format!(
        "<g transform=\"translate({}, {})\">",
        config.margin, config.margin
    ));

    for &id in &order {
        let node = &tree.nodes()[id.0];
        if node.has_children() {
            svg.push_str(&format!(
                "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
                node.x, node.y, node.r, theme.group_fill, theme.group_stroke, theme.group_stroke_width
            ));
        } else {
            svg.push_str(&format!(
                "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\"/>",
                node.x,
                node.y,
                node.r,
                escape_xml(chart.fill(node, rows, theme))
            ));
        }
    }

    let parents: Vec<_> = order
        .iter()
        .map(|id| &tree.nodes()[id.0])
        .filter(|node| node.has_children() && node.depth > 0)
        .collect();
    let max_depth = parents.iter().map(|node| node.depth).max().unwrap_or(1);
    for node in &parents {
        let font_size = config.parent_font_size * font_multiplier(node.depth, max_depth, config);
        let path_id = arc_path_id(EXPORT_PREFIX, node.id);
        let text = escape_xml(chart.label(node, rows));
        let style = format!("font-size: {font_size}px; letter-spacing: -0.5px;");
        svg.push_str(&format!(
            "<text style=\"{style}\" fill=\"none\" stroke=\"{}\" stroke-width=\"3\" stroke-linejoin=\"round\">{}</text>",
            theme.label_halo_color,
            arc_text(&path_id, &text)
        ));
        svg.push_str(&format!(
            "<text style=\"{style}\" fill=\"{}\">{}</text>",
            theme.text_color,
            arc_text(&path_id, &text)
        ));
    }

    for &id in &order {
        let node = &tree.nodes()[id.0];
        if node.has_children() {
            continue;
        }
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" dominant-baseline=\"middle\" style=\"font-size: {}px;\" fill=\"{}\">{}</text>",
            node.x,
            node.y,
            config.leaf_font_size,
            theme.text_color,
            escape_xml(chart.label(node, rows))
        ));
    }
    svg.push_str("</g>");
}

fn legend_item_y(index: usize, config: &ExportConfig) -> f64 {
    config.legend_font_size * LEGEND_FIRST_ITEM
        + index as f64 * config.legend_font_size * LEGEND_LINE_HEIGHT
}

fn legend_height(colors: &ColorMap, config: &ExportConfig) -> f64 {
    let last = colors.len().saturating_sub(1);
    config.legend_top + legend_item_y(last, config) + config.legend_font_size
}

fn write_legend(
    svg: &mut String,
    colors: &ColorMap,
    theme: &Theme,
    diagram_size: f64,
    config: &ExportConfig,
) {
    let radius = config.legend_swatch_radius;
    svg.push_str(&format!(
        "<g class=\"legend\" transform=\"translate({}, {})\">",
        diagram_size + config.legend_gap,
        config.legend_top
    ));
    svg.push_str(&format!(
        "<text x=\"0\" y=\"0\" style=\"font-size: {:.1}px; font-weight: 600;\" fill=\"{}\">{LEGEND_TITLE}</text>",
        config.legend_font_size * LEGEND_TITLE_SCALE,
        theme.text_color
    ));
    for (index, entry) in colors.entries().iter().enumerate() {
        let y = legend_item_y(index, config);
        svg.push_str(&format!(
            "<circle cx=\"{radius}\" cy=\"{y:.1}\" r=\"{radius}\" fill=\"{}\"/>",
            entry.color
        ));
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{:.1}\" style=\"font-size: {}px;\" fill=\"{}\">{}</text>",
            radius * 2.0 + LEGEND_TEXT_GAP,
            y + config.legend_font_size * LEGEND_BASELINE_SHIFT,
            config.legend_font_size,
            theme.text_color,
            escape_xml(&entry.value)
        ));
    }
    svg.push_str("</g>");
}
