//! Panel titles, tooltips and icons
//!
//! Panel chrome depends on what the session is for: an edit grid over a
//! table, a named generated script, or an ad-hoc query tool. The title is
//! also embedded as a path segment in the panel content URL, so
//! [`EscapedTitle`] strips path separators out of it and records where they
//! were, letting the receiving side rebuild the exact title.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::session::Session;

const SEPARATOR: char = '/';

/// Icon shown on the panel tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelIcon {
    Table,
    Document,
    Lightning,
}

impl PanelIcon {
    /// CSS class understood by the docking UI
    pub fn css_class(self) -> &'static str {
        match self {
            PanelIcon::Table => "fa fa-table",
            PanelIcon::Document => "fa fa-file-text-o",
            PanelIcon::Lightning => "fa fa-bolt",
        }
    }
}

/// What kind of panel is being titled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleMode {
    /// View/edit grid over `grid_label` (`schema.table`)
    EditGrid { grid_label: String },
    /// Named generated script, e.g. "select"
    Script { script_label: String },
    /// Ad-hoc query tool
    QueryTool,
}

impl TitleMode {
    pub fn for_session(session: &Session) -> Self {
        if !session.is_query_tool {
            TitleMode::EditGrid {
                grid_label: session.panel_title.clone(),
            }
        } else if !session.panel_title.is_empty() {
            TitleMode::Script {
                script_label: session.panel_title.clone(),
            }
        } else {
            TitleMode::QueryTool
        }
    }
}

/// Title, tooltip and icon of a panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelChrome {
    pub title: String,
    pub tooltip: String,
    pub icon: PanelIcon,
}

impl PanelChrome {
    /// Title wrapped in a span carrying the tooltip
    pub fn title_markup(&self) -> String {
        format!(
            "<span title=\"{}\">{}</span>",
            escape_html(&self.tooltip),
            escape_html(&self.title)
        )
    }
}

pub fn derive_chrome(mode: &TitleMode, base_title: &str) -> PanelChrome {
    match mode {
        TitleMode::EditGrid { grid_label } => {
            let title = format!("{}{}{}", grid_label, SEPARATOR, base_title);
            PanelChrome {
                tooltip: format!("View/Edit Data - {}", title),
                title,
                icon: PanelIcon::Table,
            }
        }
        TitleMode::Script { script_label } => PanelChrome {
            title: base_title.to_string(),
            tooltip: format!("{} Script - {}", script_label.to_uppercase(), base_title),
            icon: PanelIcon::Document,
        },
        TitleMode::QueryTool => PanelChrome {
            title: base_title.to_string(),
            tooltip: format!("Query Tool - {}", base_title),
            icon: PanelIcon::Lightning,
        },
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// A title with its path separators removed, plus where they were.
///
/// Positions are 0-based UTF-16 code unit offsets into the original title,
/// ascending, matching how the panel page indexes the title string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapedTitle {
    pub title: String,
    pub slash_positions: Vec<usize>,
}

impl EscapedTitle {
    pub fn encode(original: &str) -> Self {
        let mut title = String::with_capacity(original.len());
        let mut slash_positions = Vec::new();
        let mut offset = 0;
        for c in original.chars() {
            if c == SEPARATOR {
                slash_positions.push(offset);
            } else {
                title.push(c);
            }
            offset += c.len_utf16();
        }
        Self {
            title,
            slash_positions,
        }
    }

    /// Rebuild the original title
    pub fn decode(&self) -> String {
        let mut out = String::with_capacity(self.title.len() + self.slash_positions.len());
        let mut positions = self.slash_positions.iter().copied().peekable();
        let mut chars = self.title.chars();
        let mut idx = 0;
        loop {
            if positions.peek() == Some(&idx) {
                positions.next();
                out.push(SEPARATOR);
                idx += SEPARATOR.len_utf16();
            } else if let Some(c) = chars.next() {
                out.push(c);
                idx += c.len_utf16();
            } else {
                break;
            }
        }
        // Positions past the end of the text are trailing separators.
        out.extend(positions.map(|_| SEPARATOR));
        out
    }

    /// Comma-joined positions, the `fslashes` query parameter
    pub fn slash_locations(&self) -> String {
        self.slash_positions
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Rebuild from the escaped title and the `fslashes` parameter.
    /// Returns `None` when the location list is malformed.
    pub fn from_wire(title: &str, slash_locations: &str) -> Option<Self> {
        let slash_positions = if slash_locations.is_empty() {
            Vec::new()
        } else {
            slash_locations
                .split(',')
                .map(|p| p.trim().parse::<usize>().ok())
                .collect::<Option<Vec<_>>>()?
        };
        Some(Self {
            title: title.to_string(),
            slash_positions,
        })
    }
}

/// Source of base titles for newly launched panels
pub trait PanelTitleSource: Send + Sync {
    fn next_title(&self) -> String;
}

/// "<prefix> 1", "<prefix> 2", ... one number per launched panel
#[derive(Debug)]
pub struct SequentialPanelTitles {
    prefix: String,
    next: AtomicU64,
}

impl SequentialPanelTitles {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl PanelTitleSource for SequentialPanelTitles {
    fn next_title(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{} {}", self.prefix, n)
    }
}
