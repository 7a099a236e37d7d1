use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub label_font_family: String,
    pub font_size: f32,
    pub text_color: String,
    pub label_halo_color: String,
    pub group_fill: String,
    pub group_stroke: String,
    pub group_stroke_width: f32,
    pub leaf_fill: String,
    pub hover_stroke: String,
    pub background: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            label_font_family: "Helvetica, Arial, sans-serif".to_string(),
            font_size: 10.0,
            text_color: "#333".to_string(),
            label_halo_color: "white".to_string(),
            group_fill: "#fff".to_string(),
            group_stroke: "#bbb".to_string(),
            group_stroke_width: 1.0,
            leaf_fill: "#ddd".to_string(),
            hover_stroke: "#000".to_string(),
            background: "white".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            label_font_family: "Inter, Segoe UI, system-ui, sans-serif".to_string(),
            font_size: 10.0,
            text_color: "#1C2430".to_string(),
            label_halo_color: "#FFFFFF".to_string(),
            group_fill: "#F8FAFF".to_string(),
            group_stroke: "#C7D2E5".to_string(),
            group_stroke_width: 1.0,
            leaf_fill: "#EEF2F8".to_string(),
            hover_stroke: "#1C2430".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
