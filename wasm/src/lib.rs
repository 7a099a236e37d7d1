use circle_packer::config::parse_config;
use circle_packer::layout::NodeId;
use circle_packer::theme::Theme;
use circle_packer::zoom::TransitionToken;
use circle_packer::{AppState, ColumnSelection, Config, Viewport};
use serde::Deserialize;
use std::fmt::Display;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CirclePackOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    padding: Option<f64>,
    duration: Option<f64>,
    slow_duration: Option<f64>,
    /// Full config document, applied before the fields above.
    config: Option<String>,
}

fn build_config(options: CirclePackOptions) -> Result<Config, String> {
    let mut config = match options.config.as_deref() {
        Some(raw) => parse_config(raw).map_err(|error| error.to_string())?,
        None => Config::default(),
    };

    match options.theme.as_deref() {
        Some("modern") => config.theme = Theme::modern(),
        Some("classic") | Some("default") => config.theme = Theme::classic(),
        _ => {}
    }
    if let Some(font_family) = options.font_family {
        config.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        config.theme.font_size = font_size;
    }
    if let Some(padding) = options.padding {
        config.pack.padding = padding.max(0.0);
    }
    if let Some(duration) = options.duration {
        config.zoom.duration = duration.max(0.0);
    }
    if let Some(slow_duration) = options.slow_duration {
        config.zoom.slow_duration = slow_duration.max(0.0);
    }
    Ok(config)
}

fn parse_options(options_json: Option<String>) -> Result<CirclePackOptions, String> {
    match options_json {
        Some(raw) => serde_json::from_str(&raw).map_err(|error| error.to_string()),
        None => Ok(CirclePackOptions::default()),
    }
}

fn frame_json(state: &mut AppState, token_json: &str, now: f64) -> Result<Option<String>, String> {
    let token: TransitionToken = serde_json::from_str(token_json).map_err(|error| error.to_string())?;
    match state.on_frame(token, now) {
        Some(update) => serde_json::to_string(&update)
            .map(Some)
            .map_err(|error| error.to_string()),
        None => Ok(None),
    }
}

fn js_error(error: impl Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(js_error)
}

/// Browser-side handle on the application state. Results are JSON strings.
#[wasm_bindgen]
pub struct CirclePackApp {
    state: AppState,
}

#[wasm_bindgen]
impl CirclePackApp {
    #[wasm_bindgen(constructor)]
    pub fn new(options_json: Option<String>) -> Result<CirclePackApp, JsValue> {
        let options = parse_options(options_json).map_err(js_error)?;
        let config = build_config(options).map_err(js_error)?;
        Ok(Self {
            state: AppState::new(config),
        })
    }

    /// Loads a dropped CSV file and returns its column names.
    pub fn load_csv(&mut self, csv: &str) -> Result<String, JsValue> {
        let dataset = self
            .state
            .on_files_dropped(vec![csv.as_bytes()])
            .map_err(js_error)?;
        to_json(&dataset.fields)
    }

    /// Renders with `selection_json` (`{ grouping, label, color }`).
    pub fn render(
        &mut self,
        selection_json: &str,
        container_width: Option<f64>,
        window_height: f64,
    ) -> Result<String, JsValue> {
        let selection: ColumnSelection = serde_json::from_str(selection_json).map_err(js_error)?;
        let result = self
            .state
            .on_render_requested(&selection, Viewport::new(container_width, window_height))
            .map_err(js_error)?;
        to_json(&result)
    }

    /// Starts a zoom to node `id`; `None` when it is already focused.
    pub fn click_node(&mut self, id: usize, now: f64, slow: bool) -> Result<Option<String>, JsValue> {
        match self.state.on_node_clicked(NodeId(id), now, slow).map_err(js_error)? {
            Some(transition) => to_json(&transition).map(Some),
            None => Ok(None),
        }
    }

    pub fn click_background(&mut self, now: f64, slow: bool) -> Result<Option<String>, JsValue> {
        match self.state.on_background_clicked(now, slow) {
            Some(transition) => to_json(&transition).map(Some),
            None => Ok(None),
        }
    }

    /// Next animation frame as `{ frame: { view, scale, done }, svg }`, or
    /// `None` once the token is stale.
    pub fn frame(&mut self, token_json: &str, now: f64) -> Result<Option<String>, JsValue> {
        frame_json(&mut self.state, token_json, now).map_err(js_error)
    }

    pub fn is_animating(&self) -> bool {
        self.state.zoom().is_some_and(|zoom| zoom.is_animating())
    }

    pub fn resize(&mut self, container_width: Option<f64>, window_height: f64, now: f64) {
        self.state
            .on_resize(Viewport::new(container_width, window_height), now);
    }

    pub fn poll_resize(&mut self, now: f64) -> Result<Option<String>, JsValue> {
        match self.state.poll_resize(now).map_err(js_error)? {
            Some(result) => to_json(&result).map(Some),
            None => Ok(None),
        }
    }

    pub fn export_svg(&self) -> Result<String, JsValue> {
        let document = self.state.on_export_requested().map_err(js_error)?;
        Ok(document.svg)
    }

    pub fn export_file_name(&self) -> String {
        self.state.config().export.file_name.clone()
    }
}

#[cfg(test)]
mod tests {
    use circle_packer::{AppState, ColumnSelection, Viewport};

    use crate::{CirclePackOptions, build_config, frame_json, parse_options};

    #[test]
    fn options_override_config() {
        let options = parse_options(Some(
            r#"{"theme":"modern","padding":5,"slowDuration":2000,"config":"{zoom:{duration:300}}"}"#
                .to_string(),
        ))
        .unwrap();
        let config = build_config(options).unwrap();
        assert_eq!(config.theme.group_stroke, "#C7D2E5");
        assert_eq!(config.pack.padding, 5.0);
        assert_eq!(config.zoom.duration, 300.0);
        assert_eq!(config.zoom.slow_duration, 2000.0);
    }

    #[test]
    fn bad_options_are_reported() {
        assert!(parse_options(Some("{".to_string())).is_err());
        let options = CirclePackOptions {
            config: Some("not json".to_string()),
            ..CirclePackOptions::default()
        };
        assert!(build_config(options).is_err());
    }

    #[test]
    fn selection_json_drives_a_render() {
        let selection: ColumnSelection =
            serde_json::from_str(r#"{"grouping":["team",""],"label":"who","color":"team"}"#).unwrap();
        let mut state = AppState::new(build_config(CirclePackOptions::default()).unwrap());
        state
            .on_files_dropped(vec!["team,who\na,ann\nb,bob\n".as_bytes()])
            .unwrap();
        let result = state
            .on_render_requested(&selection, Viewport::new(Some(320.0), 900.0))
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["leafCount"], 2);
        assert_eq!(json["legend"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn frames_carry_view_and_completion() {
        let selection: ColumnSelection =
            serde_json::from_str(r#"{"grouping":["team"],"label":"who","color":"team"}"#).unwrap();
        let mut state = AppState::new(build_config(CirclePackOptions::default()).unwrap());
        state
            .on_files_dropped(vec!["team,who\na,ann\na,amy\nb,bob\n".as_bytes()])
            .unwrap();
        state
            .on_render_requested(&selection, Viewport::new(Some(320.0), 900.0))
            .unwrap();
        let team = state.chart().unwrap().tree.find_group_path(&["a"]).unwrap();
        let transition = state.on_node_clicked(team, 0.0, false).unwrap().unwrap();
        let token = serde_json::to_string(&transition.token).unwrap();

        let mid = frame_json(&mut state, &token, transition.duration / 2.0)
            .unwrap()
            .unwrap();
        let mid: serde_json::Value = serde_json::from_str(&mid).unwrap();
        assert_eq!(mid["frame"]["done"], false);
        assert!(mid["frame"]["view"]["diameter"].is_number());
        assert!(mid["svg"].as_str().unwrap().starts_with("<svg"));

        let end = frame_json(&mut state, &token, transition.duration).unwrap().unwrap();
        let end: serde_json::Value = serde_json::from_str(&end).unwrap();
        assert_eq!(end["frame"]["done"], true);
    }
}
