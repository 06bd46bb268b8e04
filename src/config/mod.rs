use std::path::{Path, PathBuf};

use serde::Deserialize;

const APP_DIR: &str = "passport";
const APP_CONFIG_FILE: &str = "admin.json";

/// Tunables for the admin edit view, read from `admin.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Extra width given to growing fields so the caret never clips.
    pub caret_allowance: f64,
    pub header_max_length: usize,
    pub body_max_length: usize,
    pub close_transition_ms: u64,
    pub svg_theme_color: String,
    /// Glyph measured when a field is empty and has no placeholder.
    pub empty_measure_glyph: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            caret_allowance: 10.0,
            header_max_length: 50,
            body_max_length: 150,
            close_transition_ms: 300,
            svg_theme_color: "oklch(87% 0.015 286)".to_string(),
            empty_measure_glyph: "W".to_string(),
        }
    }
}

impl AdminConfig {
    /// Replaces values the resizer cannot work with by their defaults.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.caret_allowance.is_finite() || self.caret_allowance < 0.0 {
            tracing::warn!(value = self.caret_allowance, "ignoring invalid caret_allowance");
            self.caret_allowance = defaults.caret_allowance;
        }
        if self.empty_measure_glyph.is_empty() {
            self.empty_measure_glyph = defaults.empty_measure_glyph;
        }
        self
    }
}

/// `$XDG_CONFIG_HOME/passport/admin.json`, else under `~/.config`. `None`
/// when neither directory is known.
pub fn admin_config_path(xdg_config_home: Option<&Path>, home: Option<&Path>) -> Option<PathBuf> {
    let root = match xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        Some(xdg) => xdg.to_path_buf(),
        None => home?.join(".config"),
    };
    Some(root.join(APP_DIR).join(APP_CONFIG_FILE))
}

pub fn load_admin_config() -> AdminConfig {
    let xdg_config_home = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match admin_config_path(xdg_config_home.as_deref(), home.as_deref()) {
        Some(path) => load_admin_config_from(&path),
        None => {
            tracing::debug!("no config directory; using default admin config");
            AdminConfig::default()
        }
    }
}

/// Reads `path`. A missing, unreadable or malformed file yields defaults.
pub fn load_admin_config_from(path: &Path) -> AdminConfig {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return AdminConfig::default(),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read admin.json; using defaults");
            return AdminConfig::default();
        }
    };
    match serde_json::from_str::<AdminConfig>(&contents) {
        Ok(config) => config.sanitized(),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to parse admin.json; using defaults");
            AdminConfig::default()
        }
    }
}
