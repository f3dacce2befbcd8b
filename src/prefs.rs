//! SQL editor preferences
//!
//! Preferences are owned by the host's preference store. The launcher only
//! holds the receiving end of a watch channel, so a change made while the
//! application runs is picked up the next time a panel or filter dialog is
//! opened.

use serde::Deserialize;
use tokio::sync::watch;

/// Receiving end of the `sqleditor` preference module
pub type PreferenceWatch = watch::Receiver<SqlEditorPreferences>;

/// The subset of `sqleditor` preferences the launcher reads
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SqlEditorPreferences {
    /// Open panels in a new browser tab instead of the docking layout
    pub new_browser_tab: bool,
    pub use_spaces: bool,
    pub tab_size: u32,
    pub wrap_code: bool,
    pub insert_pair_brackets: bool,
    pub brace_matching: bool,
    /// Font size multiplier; 0 means "use the default"
    pub sql_font_size: f64,
}

impl Default for SqlEditorPreferences {
    fn default() -> Self {
        Self {
            new_browser_tab: false,
            use_spaces: false,
            tab_size: 4,
            wrap_code: false,
            insert_pair_brackets: true,
            brace_matching: true,
            sql_font_size: 1.0,
        }
    }
}

/// A preference channel with fixed values, for hosts without a live store
pub fn fixed(prefs: SqlEditorPreferences) -> (watch::Sender<SqlEditorPreferences>, PreferenceWatch) {
    watch::channel(prefs)
}

/// Settings for the filter editor widget
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSettings {
    pub mode: &'static str,
    pub line_numbers: bool,
    pub indent_with_tabs: bool,
    pub indent_unit: u32,
    pub tab_size: u32,
    pub line_wrapping: bool,
    pub auto_close_brackets: bool,
    pub match_brackets: bool,
    /// CSS font size, e.g. `1.25em`
    pub font_size: String,
}

impl From<&SqlEditorPreferences> for EditorSettings {
    fn from(prefs: &SqlEditorPreferences) -> Self {
        Self {
            mode: "text/x-pgsql",
            line_numbers: true,
            indent_with_tabs: !prefs.use_spaces,
            indent_unit: prefs.tab_size,
            tab_size: prefs.tab_size,
            line_wrapping: prefs.wrap_code,
            auto_close_brackets: prefs.insert_pair_brackets,
            match_brackets: prefs.brace_matching,
            font_size: calc_font_size(prefs.sql_font_size),
        }
    }
}

/// Multiplier rounded to two decimals, as an `em` size
pub fn calc_font_size(size: f64) -> String {
    if !size.is_finite() || size <= 0.0 {
        return "1em".to_string();
    }
    let rounded = (size * 100.0).round() / 100.0;
    format!("{}em", rounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_font_size() {
        assert_eq!(calc_font_size(1.0), "1em");
        assert_eq!(calc_font_size(1.256), "1.26em");
        assert_eq!(calc_font_size(0.0), "1em");
        assert_eq!(calc_font_size(f64::NAN), "1em");
    }

    #[test]
    fn test_editor_settings_from_prefs() {
        let prefs = SqlEditorPreferences {
            use_spaces: true,
            tab_size: 2,
            wrap_code: true,
            ..Default::default()
        };
        let settings = EditorSettings::from(&prefs);
        assert!(!settings.indent_with_tabs);
        assert_eq!((settings.indent_unit, settings.tab_size), (2, 2));
        assert!(settings.line_wrapping);
    }

    #[test]
    fn test_changes_visible_through_watch() {
        let (tx, rx) = fixed(SqlEditorPreferences::default());
        assert!(!rx.borrow().new_browser_tab);
        tx.send_modify(|p| p.new_browser_tab = true);
        assert!(rx.borrow().new_browser_tab);
    }

    #[test]
    fn test_deserialize_partial() {
        let prefs: SqlEditorPreferences =
            serde_json::from_str(r#"{"new_browser_tab": true, "sql_font_size": 1.5}"#).unwrap();
        assert!(prefs.new_browser_tab);
        assert_eq!(prefs.tab_size, 4);
    }
}
