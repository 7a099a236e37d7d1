//! Application state and command dispatch.
//!
//! A host (CLI, browser wrapper) owns one [`AppState`] and forwards user
//! actions to the `on_*` methods. Every render replaces the chart and zoom
//! state wholesale and bumps the render generation, which invalidates any
//! animation still running against the previous chart.

use crate::chart::{Chart, ColumnSelection};
use crate::color::ColorEntry;
use crate::config::{Config, RenderConfig};
use crate::data::{Dataset, Row};
use crate::error::CirclePackError;
use crate::export::{ExportDocument, export_svg};
use crate::layout::{NodeId, PackOptions};
use crate::render::render_interactive;
use crate::zoom::{FocusTransition, Frame, TransitionToken, ZoomController};
use serde::Serialize;
use std::io::Read;

/// Space available to the chart in the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// `None` when the container cannot be measured.
    pub container_width: Option<f64>,
    pub window_height: f64,
}

impl Viewport {
    pub fn new(container_width: Option<f64>, window_height: f64) -> Self {
        Self {
            container_width,
            window_height,
        }
    }

    /// Square chart side: the container width, capped by the window height
    /// minus page chrome.
    pub fn chart_size(&self, config: &RenderConfig) -> f64 {
        let width = self
            .container_width
            .filter(|width| *width > 0.0)
            .unwrap_or(config.fallback_width);
        width.min(self.window_height - config.chrome_height).max(0.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(None, f64::INFINITY)
    }
}

/// Trailing-edge debounce: only the last viewport of a burst is delivered,
/// once `delay` ms have passed without another resize.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    delay: f64,
    pending: Option<(f64, Viewport)>,
}

impl ResizeDebouncer {
    pub fn new(delay: f64) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn schedule(&mut self, viewport: Viewport, now: f64) {
        self.pending = Some((now + self.delay, viewport));
    }

    pub fn poll(&mut self, now: f64) -> Option<Viewport> {
        match self.pending {
            Some((deadline, viewport)) if now >= deadline => {
                self.pending = None;
                Some(viewport)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    pub svg: String,
    pub legend: Vec<ColorEntry>,
    pub size: f64,
    pub generation: u64,
    pub leaf_count: usize,
}

/// One animation frame: the interpolated view and the redrawn SVG.
#[derive(Debug, Clone, Serialize)]
pub struct FrameUpdate {
    pub frame: Frame,
    pub svg: String,
}

#[derive(Debug, Clone)]
struct RenderedChart {
    chart: Chart,
    zoom: ZoomController,
}

#[derive(Debug, Clone)]
pub struct AppState {
    config: Config,
    dataset: Option<Dataset>,
    rendered: Option<RenderedChart>,
    generation: u64,
    viewport: Viewport,
    resize: ResizeDebouncer,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let resize = ResizeDebouncer::new(config.render.resize_debounce_ms);
        Self {
            config,
            dataset: None,
            rendered: None,
            generation: 0,
            viewport: Viewport::default(),
            resize,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Column names offered for selection, in header order.
    pub fn fields(&self) -> &[String] {
        self.dataset
            .as_ref()
            .map(|dataset| dataset.fields.as_slice())
            .unwrap_or(&[])
    }

    pub fn chart(&self) -> Option<&Chart> {
        self.rendered.as_ref().map(|rendered| &rendered.chart)
    }

    pub fn zoom(&self) -> Option<&ZoomController> {
        self.rendered.as_ref().map(|rendered| &rendered.zoom)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn rows(&self) -> &[Row] {
        self.dataset
            .as_ref()
            .map(|dataset| dataset.rows.as_slice())
            .unwrap_or(&[])
    }

    /// Accepts exactly one file. Anything else leaves the current state alone.
    pub fn on_files_dropped<R: Read>(&mut self, mut files: Vec<R>) -> Result<&Dataset, CirclePackError> {
        if files.len() != 1 {
            return Err(CirclePackError::WrongFileCount(files.len()));
        }
        let dataset = match files.pop() {
            Some(file) => Dataset::from_reader(file)?,
            None => return Err(CirclePackError::WrongFileCount(0)),
        };
        Ok(self.load_dataset(dataset))
    }

    /// Replaces the data. The previous chart refers to old rows, so it is dropped.
    pub fn load_dataset(&mut self, dataset: Dataset) -> &Dataset {
        tracing::debug!(
            fields = dataset.fields.len(),
            rows = dataset.rows.len(),
            "dataset loaded"
        );
        if dataset.is_empty() {
            tracing::warn!("dataset has a header but no rows");
        }
        self.rendered = None;
        self.resize = ResizeDebouncer::new(self.config.render.resize_debounce_ms);
        self.dataset.insert(dataset)
    }

    pub fn on_render_requested(
        &mut self,
        selection: &ColumnSelection,
        viewport: Viewport,
    ) -> Result<RenderResult, CirclePackError> {
        selection.validate()?;
        let size = viewport.chart_size(&self.config.render);
        let options = PackOptions::square(size, &self.config.pack);
        let chart = Chart::build(self.rows(), selection, options)?;

        self.generation += 1;
        let zoom = ZoomController::new(&chart.tree, size, self.generation, self.config.zoom.clone());
        self.viewport = viewport;
        self.rendered = Some(RenderedChart { chart, zoom });
        tracing::debug!(size, generation = self.generation, "chart rendered");
        self.render_result()
    }

    fn render_result(&self) -> Result<RenderResult, CirclePackError> {
        let rendered = self.rendered.as_ref().ok_or(CirclePackError::NothingRendered)?;
        Ok(RenderResult {
            svg: self.draw(rendered),
            legend: rendered.chart.colors.entries().to_vec(),
            size: rendered.zoom.width(),
            generation: rendered.zoom.generation(),
            leaf_count: rendered.chart.tree.leaves().len(),
        })
    }

    fn draw(&self, rendered: &RenderedChart) -> String {
        render_interactive(
            &rendered.chart,
            self.rows(),
            &rendered.zoom,
            &self.config.theme,
            &self.config.render,
        )
    }

    /// The interactive SVG at the current zoom state.
    pub fn current_svg(&self) -> Option<String> {
        self.rendered.as_ref().map(|rendered| self.draw(rendered))
    }

    pub fn on_node_clicked(
        &mut self,
        node: NodeId,
        now: f64,
        slow: bool,
    ) -> Result<Option<FocusTransition>, CirclePackError> {
        let rendered = self.rendered.as_mut().ok_or(CirclePackError::NothingRendered)?;
        if rendered.chart.tree.node(node).is_none() {
            return Err(CirclePackError::UnknownNode(node.0));
        }
        Ok(rendered.zoom.focus_node(&rendered.chart.tree, node, now, slow))
    }

    pub fn on_background_clicked(&mut self, now: f64, slow: bool) -> Option<FocusTransition> {
        let rendered = self.rendered.as_mut()?;
        rendered.zoom.focus_root(&rendered.chart.tree, now, slow)
    }

    /// Advances the running transition. Stale tokens produce nothing.
    pub fn on_frame(&mut self, token: TransitionToken, now: f64) -> Option<FrameUpdate> {
        let rendered = self.rendered.as_mut()?;
        let frame = rendered.zoom.advance(token, now)?;
        let rendered = self.rendered.as_ref()?;
        Some(FrameUpdate {
            frame,
            svg: self.draw(rendered),
        })
    }

    pub fn on_resize(&mut self, viewport: Viewport, now: f64) {
        self.resize.schedule(viewport, now);
    }

    /// Re-renders once the resize burst settles, but only over a chart that
    /// actually has something drawn.
    pub fn poll_resize(&mut self, now: f64) -> Result<Option<RenderResult>, CirclePackError> {
        let Some(viewport) = self.resize.poll(now) else {
            return Ok(None);
        };
        let Some(rendered) = self.rendered.as_ref() else {
            self.viewport = viewport;
            return Ok(None);
        };
        if rendered.chart.tree.is_empty() {
            self.viewport = viewport;
            return Ok(None);
        }
        let selection = rendered.chart.selection.clone();
        self.on_render_requested(&selection, viewport).map(Some)
    }

    pub fn on_export_requested(&self) -> Result<ExportDocument, CirclePackError> {
        let rendered = self.rendered.as_ref().ok_or(CirclePackError::NothingRendered)?;
        export_svg(&rendered.chart, self.rows(), &self.config.theme, &self.config.export)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
