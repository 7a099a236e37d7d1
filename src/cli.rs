use crate::app::{AppState, Viewport};
use crate::chart::ColumnSelection;
use crate::config::load_config;
use crate::layout_dump::write_layout_dump;
use crate::render::write_output_svg;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "circlepack",
    version,
    about = "Render CSV rows as a zoomable circle-packing diagram"
)]
pub struct Args {
    /// Input CSV file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Grouping column, outermost first (repeat up to three times)
    #[arg(short = 'g', long = "group")]
    pub group: Vec<String>,

    /// Column shown as the leaf label
    #[arg(short = 'l', long = "label")]
    pub label: String,

    /// Column whose distinct values pick the leaf colors
    #[arg(short = 'c', long = "color")]
    pub color: String,

    /// Render the static export document (with legend) instead of the interactive view
    #[arg(long = "export")]
    pub export: bool,

    /// Interactive chart side in pixels
    #[arg(short = 's', long = "size")]
    pub size: Option<f64>,

    /// Zoom to a group before rendering, e.g. "US/CA"
    #[arg(short = 'f', long = "focus")]
    pub focus: Option<String>,

    /// Config JSON file
    #[arg(long = "configFile")]
    pub config: Option<PathBuf>,

    /// Write the packed layout as JSON
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let size = args.size.unwrap_or(config.render.width as f64);

    let mut app = AppState::new(config);
    app.on_files_dropped(vec![open_input(args.input.as_deref())?])?;

    let selection = ColumnSelection::new(args.group.clone(), &args.label, &args.color);
    let rendered = app.on_render_requested(&selection, Viewport::new(Some(size), f64::INFINITY))?;
    tracing::debug!(
        leaves = rendered.leaf_count,
        colors = rendered.legend.len(),
        "rendered"
    );

    if let Some(path) = args.dump_layout.as_deref()
        && let Some(chart) = app.chart()
    {
        let rows = app.dataset().map(|dataset| dataset.rows.as_slice()).unwrap_or(&[]);
        write_layout_dump(path, chart, rows)?;
    }

    let svg = if args.export {
        app.on_export_requested()?.svg
    } else if let Some(focus) = args.focus.as_deref() {
        render_focused(&mut app, focus)?
    } else {
        rendered.svg
    };

    match args.output_format {
        OutputFormat::Svg => write_output_svg(&svg, args.output.as_deref())?,
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_png(&svg, &output, &app)?;
        }
    }
    Ok(())
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>> {
    match path {
        Some(path) if path != Path::new("-") => Ok(Box::new(BufReader::new(File::open(path)?))),
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

/// Runs a click on the group at `path` through to the end of its transition.
fn render_focused(app: &mut AppState, path: &str) -> Result<String> {
    let segments = parse_focus_path(path);
    let target = app
        .chart()
        .and_then(|chart| chart.tree.find_group_path(&segments))
        .ok_or_else(|| anyhow::anyhow!("No group at path '{path}'"))?;

    let Some(transition) = app.on_node_clicked(target, 0.0, false)? else {
        return app
            .current_svg()
            .ok_or_else(|| anyhow::anyhow!("Nothing rendered"));
    };
    let update = app
        .on_frame(transition.token, transition.started_at + transition.duration)
        .ok_or_else(|| anyhow::anyhow!("Zoom transition was superseded"))?;
    Ok(update.svg)
}

fn parse_focus_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, app: &AppState) -> Result<()> {
    crate::render::write_output_png(svg, output, &app.config().render)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _app: &AppState) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}
