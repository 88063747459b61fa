use ratatui::style::Color;

use crate::config::THEME_KEY;
use crate::store::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Colors the view layer draws with.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub high: Color,
    pub low: Color,
    pub overdue: Color,
    pub done: Color,
    pub fresh: Color,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Anything other than `dark` reads as light.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn load(store: &impl KeyValueStore) -> Self {
        match store.get(THEME_KEY) {
            Ok(raw) => Self::parse(raw.as_deref()),
            Err(err) => {
                tracing::error!("Failed to read theme preference: {}", err);
                Theme::Light
            }
        }
    }

    pub fn save(self, store: &impl KeyValueStore) {
        if let Err(err) = store.set(THEME_KEY, self.as_str()) {
            tracing::error!("Failed to save theme preference: {}", err);
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Light => Palette {
                background: Color::White,
                text: Color::Black,
                muted: Color::DarkGray,
                accent: Color::Blue,
                high: Color::Red,
                low: Color::Green,
                overdue: Color::LightRed,
                done: Color::Gray,
                fresh: Color::Magenta,
            },
            Theme::Dark => Palette {
                background: Color::Black,
                text: Color::White,
                muted: Color::Gray,
                accent: Color::Cyan,
                high: Color::LightRed,
                low: Color::LightGreen,
                overdue: Color::Red,
                done: Color::DarkGray,
                fresh: Color::LightMagenta,
            },
        }
    }
}
