use crate::geometry::Edges;

/// Typography properties carried between static text, probes and edit fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: u16,
    pub font_style: String,
    pub color: String,
    pub line_height: f64,
    pub letter_spacing: f64,
    pub text_transform: String,
    pub text_align: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_size: 16.0,
            font_weight: 400,
            font_style: "normal".to_string(),
            color: "inherit".to_string(),
            line_height: 24.0,
            letter_spacing: 0.0,
            text_transform: "none".to_string(),
            text_align: "start".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Length {
    #[default]
    Auto,
    Px(f64),
    Percent(f64),
}

impl Length {
    pub fn px(self) -> Option<f64> {
        match self {
            Self::Px(value) => Some(value),
            Self::Auto | Self::Percent(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhiteSpace {
    #[default]
    Normal,
    NoWrap,
    PreWrap,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    pub text: TextStyle,
    pub border: Edges,
    pub border_color: Option<String>,
    pub border_radius: Option<String>,
    pub background: Option<String>,
    pub width: Length,
    pub height: Length,
    pub white_space: WhiteSpace,
    pub hidden: bool,
    pub offscreen: bool,
    pub filter: Option<String>,
}
