use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const EXPORT_FILE_NAME: &str = "circle-pack-diagram.svg";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackConfig {
    pub padding: f64,
    pub margin: f64,
    pub leaf_weight: f64,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            padding: 3.0,
            margin: 1.0,
            leaf_weight: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoomConfig {
    pub duration: f64,
    pub slow_duration: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            duration: 750.0,
            slow_duration: 7500.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub file_name: String,
    pub base_size: f64,
    pub base_padding: f64,
    pub margin: f64,
    pub min_leaf_radius: f64,
    pub char_width: f64,
    pub label_padding: f64,
    pub leaf_font_size: f64,
    pub parent_font_size: f64,
    pub parent_font_max_scale: f64,
    pub parent_font_min_scale: f64,
    pub legend_gap: f64,
    pub legend_width: f64,
    pub legend_top: f64,
    pub legend_font_size: f64,
    pub legend_swatch_radius: f64,
    pub font_family: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: EXPORT_FILE_NAME.to_string(),
            base_size: 1000.0,
            base_padding: 3.0,
            margin: 1.0,
            min_leaf_radius: 30.0,
            char_width: 6.0,
            label_padding: 10.0,
            leaf_font_size: 11.0,
            parent_font_size: 11.0,
            parent_font_max_scale: 2.0,
            parent_font_min_scale: 1.25,
            legend_gap: 100.0,
            legend_width: 200.0,
            legend_top: 20.0,
            legend_font_size: 22.0,
            legend_swatch_radius: 8.0,
            font_family: "Helvetica, Arial, sans-serif".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    /// Used when the host cannot measure its container.
    pub fallback_width: f64,
    /// Vertical space reserved for page chrome around the chart.
    pub chrome_height: f64,
    pub resize_debounce_ms: f64,
    pub id_prefix: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 928.0,
            height: 928.0,
            fallback_width: 1152.0,
            chrome_height: 100.0,
            resize_debounce_ms: 250.0,
            id_prefix: "circle-pack".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub pack: PackConfig,
    pub zoom: ZoomConfig,
    pub export: ExportConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    label_font_family: Option<String>,
    font_size: Option<f32>,
    text_color: Option<String>,
    label_halo_color: Option<String>,
    group_fill: Option<String>,
    group_stroke: Option<String>,
    group_stroke_width: Option<f32>,
    leaf_fill: Option<String>,
    hover_stroke: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PackConfigFile {
    padding: Option<f64>,
    margin: Option<f64>,
    leaf_weight: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ZoomConfigFile {
    duration: Option<f64>,
    slow_duration: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ExportConfigFile {
    file_name: Option<String>,
    base_size: Option<f64>,
    base_padding: Option<f64>,
    min_leaf_radius: Option<f64>,
    char_width: Option<f64>,
    label_padding: Option<f64>,
    leaf_font_size: Option<f64>,
    parent_font_size: Option<f64>,
    legend_gap: Option<f64>,
    legend_width: Option<f64>,
    legend_font_size: Option<f64>,
    font_family: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    fallback_width: Option<f64>,
    chrome_height: Option<f64>,
    resize_debounce_ms: Option<f64>,
    id_prefix: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    pack: Option<PackConfigFile>,
    zoom: Option<ZoomConfigFile>,
    export: Option<ExportConfigFile>,
    render: Option<RenderConfigFile>,
}

/// Loads a JSON (or JSON5) config file over the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = Config::default();

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "modern" => config.theme = Theme::modern(),
            "classic" | "default" => config.theme = Theme::classic(),
            other => tracing::warn!(theme = other, "unknown theme, keeping default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        let theme = &mut config.theme;
        if let Some(v) = vars.font_family {
            theme.font_family = v;
        }
        if let Some(v) = vars.label_font_family {
            theme.label_font_family = v;
        }
        if let Some(v) = vars.font_size {
            theme.font_size = v;
        }
        if let Some(v) = vars.text_color {
            theme.text_color = v;
        }
        if let Some(v) = vars.label_halo_color {
            theme.label_halo_color = v;
        }
        if let Some(v) = vars.group_fill {
            theme.group_fill = v;
        }
        if let Some(v) = vars.group_stroke {
            theme.group_stroke = v;
        }
        if let Some(v) = vars.group_stroke_width {
            theme.group_stroke_width = v;
        }
        if let Some(v) = vars.leaf_fill {
            theme.leaf_fill = v;
        }
        if let Some(v) = vars.hover_stroke {
            theme.hover_stroke = v;
        }
        if let Some(v) = vars.background {
            theme.background = v;
        }
    }

    if let Some(pack) = parsed.pack {
        if let Some(v) = pack.padding {
            config.pack.padding = v.max(0.0);
        }
        if let Some(v) = pack.margin {
            config.pack.margin = v.max(0.0);
        }
        if let Some(v) = pack.leaf_weight {
            config.pack.leaf_weight = v;
        }
    }

    if let Some(zoom) = parsed.zoom {
        if let Some(v) = zoom.duration {
            config.zoom.duration = v.max(0.0);
        }
        if let Some(v) = zoom.slow_duration {
            config.zoom.slow_duration = v.max(0.0);
        }
    }

    if let Some(export) = parsed.export {
        let cfg = &mut config.export;
        if let Some(v) = export.file_name {
            cfg.file_name = v;
        }
        if let Some(v) = export.base_size {
            cfg.base_size = v;
        }
        if let Some(v) = export.base_padding {
            cfg.base_padding = v;
        }
        if let Some(v) = export.min_leaf_radius {
            cfg.min_leaf_radius = v;
        }
        if let Some(v) = export.char_width {
            cfg.char_width = v;
        }
        if let Some(v) = export.label_padding {
            cfg.label_padding = v;
        }
        if let Some(v) = export.leaf_font_size {
            cfg.leaf_font_size = v;
        }
        if let Some(v) = export.parent_font_size {
            cfg.parent_font_size = v;
        }
        if let Some(v) = export.legend_gap {
            cfg.legend_gap = v;
        }
        if let Some(v) = export.legend_width {
            cfg.legend_width = v;
        }
        if let Some(v) = export.legend_font_size {
            cfg.legend_font_size = v;
        }
        if let Some(v) = export.font_family {
            cfg.font_family = v;
        }
    }

    if let Some(render) = parsed.render {
        let cfg = &mut config.render;
        if let Some(v) = render.width {
            cfg.width = v;
        }
        if let Some(v) = render.height {
            cfg.height = v;
        }
        if let Some(v) = render.fallback_width {
            cfg.fallback_width = v;
        }
        if let Some(v) = render.chrome_height {
            cfg.chrome_height = v;
        }
        if let Some(v) = render.resize_debounce_ms {
            cfg.resize_debounce_ms = v.max(0.0);
        }
        if let Some(v) = render.id_prefix {
            cfg.id_prefix = v;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_keeps_defaults() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config.pack.padding, 3.0);
        assert_eq!(config.zoom.duration, 750.0);
        assert_eq!(config.export.file_name, EXPORT_FILE_NAME);
    }

    #[test]
    fn overrides_and_json5_syntax() {
        let config = parse_config(
            r##"{
                // comments and trailing commas are fine
                theme: "modern",
                themeVariables: { groupStroke: "#999", background: "#fafafa" },
                pack: { padding: 5, leafWeight: 10, },
                zoom: { slowDuration: 3000 },
            }"##,
        )
        .unwrap();
        assert_eq!(config.theme.group_stroke, "#999");
        assert_eq!(config.theme.background, "#fafafa");
        assert_eq!(config.pack.padding, 5.0);
        assert_eq!(config.pack.leaf_weight, 10.0);
        assert_eq!(config.zoom.slow_duration, 3000.0);
        assert_eq!(config.zoom.duration, 750.0);
    }

    #[test]
    fn missing_path_is_default() {
        let config = load_config(None).unwrap();
        assert_eq!(config.render.resize_debounce_ms, 250.0);
    }
}
