use ratatui::style::Color;
use ratatui::widgets::BorderType;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{config_dir, ConfigError};

/// `#rrggbb` to an RGB colour. Anything else renders in the terminal default.
pub fn hex_to_color(hex: &str) -> Color {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Color::Reset;
    }
    match u32::from_str_radix(digits, 16) {
        Ok(rgb) => {
            let [_, r, g, b] = rgb.to_be_bytes();
            Color::Rgb(r, g, b)
        }
        Err(_) => Color::Reset,
    }
}

fn default_border_style() -> String { "rounded".to_owned() }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub name: String,
    // Backgrounds
    pub bg_primary: String, pub bg_secondary: String, pub bg_popup: String,
    // Borders
    pub border_normal: String, pub border_focused: String,
    // Text
    pub text_primary: String, pub text_muted: String, pub text_accent: String,
    // Day cells
    pub today_bg: String, pub today_fg: String,
    pub selected_bg: String, pub selected_fg: String,
    pub weekend_fg: String, pub outside_fg: String, pub disabled_fg: String,
    /// Border style: "rounded" | "double" | "thick" | "plain"
    #[serde(default = "default_border_style")]
    pub border_style: String,
}

impl ThemeConfig {
    // ── Color accessors ───────────────────────────────────────────────────────
    pub fn bg(&self)            -> Color { hex_to_color(&self.bg_primary) }
    pub fn bg2(&self)           -> Color { hex_to_color(&self.bg_secondary) }
    pub fn popup_bg(&self)      -> Color { hex_to_color(&self.bg_popup) }
    pub fn border(&self)        -> Color { hex_to_color(&self.border_normal) }
    pub fn border_active(&self) -> Color { hex_to_color(&self.border_focused) }
    pub fn fg(&self)            -> Color { hex_to_color(&self.text_primary) }
    pub fn fg_dim(&self)        -> Color { hex_to_color(&self.text_muted) }
    pub fn accent(&self)        -> Color { hex_to_color(&self.text_accent) }
    pub fn weekend_color(&self) -> Color { hex_to_color(&self.weekend_fg) }
    pub fn outside_color(&self) -> Color { hex_to_color(&self.outside_fg) }
    pub fn disabled_color(&self)-> Color { hex_to_color(&self.disabled_fg) }

    pub fn today_highlight(&self)    -> (Color, Color) {
        (hex_to_color(&self.today_bg), hex_to_color(&self.today_fg))
    }
    pub fn selected_highlight(&self) -> (Color, Color) {
        (hex_to_color(&self.selected_bg), hex_to_color(&self.selected_fg))
    }

    pub fn border_type(&self) -> BorderType {
        match self.border_style.as_str() {
            "double" => BorderType::Double,
            "thick"  => BorderType::Thick,
            "plain"  => BorderType::Plain,
            _        => BorderType::Rounded,
        }
    }

    // ── Loading ───────────────────────────────────────────────────────────────

    /// A `theme.toml` next to the config wins; otherwise the named built-in.
    pub fn load(name: &str) -> Result<Self, ConfigError> {
        Self::load_from(&config_dir().join("theme.toml"), name)
    }

    pub fn load_from(path: &Path, name: &str) -> Result<Self, ConfigError> {
        if path.exists() {
            let text = std::fs::read_to_string(path)
                .map_err(|source| ConfigError::Io { path: path.to_owned(), source })?;
            return Ok(toml::from_str(&text)?);
        }
        Ok(Self::by_name(name).unwrap_or_else(|| {
            tracing::warn!("unknown theme {name:?}, using default");
            Self::default()
        }))
    }

    pub fn by_name(name: &str) -> Option<Self> {
        Self::all_themes().into_iter().find(|t| t.name == name)
    }

    pub fn all_themes() -> Vec<ThemeConfig> {
        vec![ThemeConfig::default(), ThemeConfig::paper()]
    }

    /// Light palette for bright terminals.
    pub fn paper() -> Self { Self {
        name: "paper".into(),
        bg_primary: "#fafafa".into(), bg_secondary: "#ececec".into(), bg_popup: "#ffffff".into(),
        border_normal: "#b0b0b0".into(), border_focused: "#1f6feb".into(),
        text_primary: "#24292f".into(), text_muted: "#8c959f".into(), text_accent: "#1f6feb".into(),
        today_bg: "#ddf4ff".into(), today_fg: "#0969da".into(),
        selected_bg: "#1f6feb".into(), selected_fg: "#ffffff".into(),
        weekend_fg: "#cf222e".into(), outside_fg: "#afb8c1".into(), disabled_fg: "#d0d7de".into(),
        border_style: "plain".into(),
    }}
}

impl Default for ThemeConfig {
    fn default() -> Self { Self {
        name: "catppuccin-mocha".into(),
        bg_primary: "#1e1e2e".into(), bg_secondary: "#181825".into(), bg_popup: "#313244".into(),
        border_normal: "#45475a".into(), border_focused: "#89b4fa".into(),
        text_primary: "#cdd6f4".into(), text_muted: "#6c7086".into(), text_accent: "#89b4fa".into(),
        today_bg: "#cba6f7".into(), today_fg: "#1e1e2e".into(),
        selected_bg: "#89b4fa".into(), selected_fg: "#1e1e2e".into(),
        weekend_fg: "#f38ba8".into(), outside_fg: "#585b70".into(), disabled_fg: "#45475a".into(),
        border_style: "rounded".into(),
    }}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        assert_eq!(hex_to_color("#1e1e2e"), Color::Rgb(0x1e, 0x1e, 0x2e));
        assert_eq!(hex_to_color("fff"), Color::Reset);
        assert_eq!(hex_to_color("#ééé"), Color::Reset);
        assert_eq!(hex_to_color("+12345"), Color::Reset);
        assert_eq!(hex_to_color("1F6FEB"), Color::Rgb(0x1f, 0x6f, 0xeb));
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(ThemeConfig::by_name("catppuccin-mocha").map(|t| t.border_type()), Some(BorderType::Rounded));
        assert_eq!(ThemeConfig::by_name("paper").map(|t| t.border_type()), Some(BorderType::Plain));
        assert!(ThemeConfig::by_name("solarized").is_none());
    }

    #[test]
    fn unknown_name_falls_back() {
        let t = ThemeConfig::load_from(Path::new("/nonexistent/theme.toml"), "solarized").unwrap();
        assert_eq!(t, ThemeConfig::default());
    }

    #[test]
    fn custom_theme_round_trips_through_toml() {
        let text = toml::to_string_pretty(&ThemeConfig::paper()).unwrap();
        let back: ThemeConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, ThemeConfig::paper());
    }
}
