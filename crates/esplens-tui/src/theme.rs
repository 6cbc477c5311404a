//! Ember palette and semantic styling for the TUI.

use ratatui::style::{Color, Modifier, Style};

// ── Core Palette ──────────────────────────────────────────────────────

pub const AMBER: Color = Color::Rgb(255, 180, 84); // #ffb454
pub const TEAL: Color = Color::Rgb(92, 207, 230); // #5ccfe6
pub const SPRING_GREEN: Color = Color::Rgb(135, 217, 108); // #87d96c
pub const SIGNAL_RED: Color = Color::Rgb(240, 113, 120); // #f07178
pub const SAND: Color = Color::Rgb(255, 209, 115); // #ffd173

// ── Extended Palette ──────────────────────────────────────────────────

pub const FOG: Color = Color::Rgb(171, 178, 191); // #abb2bf
pub const SLATE: Color = Color::Rgb(92, 103, 115); // #5c6773
pub const BG_PANEL: Color = Color::Rgb(31, 36, 48); // #1f2430
pub const BG_DARK: Color = Color::Rgb(23, 27, 36); // #171b24

// ── Semantic Styles ───────────────────────────────────────────────────

/// Title text for blocks/panels.
pub fn title_style() -> Style {
    Style::default().fg(TEAL).add_modifier(Modifier::BOLD)
}

/// Border for a focused panel.
pub fn border_focused() -> Style {
    Style::default().fg(AMBER)
}

/// Border for an unfocused panel.
pub fn border_default() -> Style {
    Style::default().fg(SLATE)
}

/// Table header row.
pub fn table_header() -> Style {
    Style::default()
        .fg(TEAL)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

/// Normal table row text.
pub fn table_row() -> Style {
    Style::default().fg(FOG)
}

/// Selected / highlighted table row.
pub fn table_selected() -> Style {
    Style::default()
        .fg(AMBER)
        .bg(BG_PANEL)
        .add_modifier(Modifier::BOLD)
}

/// Active tab in the tab bar.
pub fn tab_active() -> Style {
    Style::default().fg(AMBER).add_modifier(Modifier::BOLD)
}

/// Inactive tab in the tab bar.
pub fn tab_inactive() -> Style {
    Style::default().fg(FOG)
}

/// Key hint text (e.g., "q quit  ? help").
pub fn key_hint() -> Style {
    Style::default().fg(SLATE)
}

/// Key hint key character.
pub fn key_hint_key() -> Style {
    Style::default().fg(TEAL).add_modifier(Modifier::BOLD)
}
