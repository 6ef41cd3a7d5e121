//! # Theme Store
//!
//! Three-valued UI preference persisted in the local store.
//!
//! Startup resolution order: a valid stored value, then the OS high-contrast
//! preference, then the OS dark-mode preference, then `light`. Every change
//! is written through to the store and applied to the [`PresentationState`]
//! the store owns. A store that cannot be read or written is logged and
//! otherwise ignored; the in-memory theme still changes.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FormsError;
use crate::storage::{KeyValueStore, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    HighContrast,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Light, Theme::Dark, Theme::HighContrast];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::HighContrast => "high-contrast",
        }
    }

    /// light → dark → high-contrast → light
    pub fn next(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::HighContrast,
            Theme::HighContrast => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = FormsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| FormsError::UnknownTheme(s.to_string()))
    }
}

/// OS appearance preferences consulted when nothing is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OsAppearance {
    pub prefers_high_contrast: bool,
    pub prefers_dark: bool,
}

impl OsAppearance {
    /// Read `TCC_FORMS_PREFERS_CONTRAST` and `TCC_FORMS_PREFERS_DARK`.
    pub fn from_env() -> Self {
        OsAppearance {
            prefers_high_contrast: env_flag("TCC_FORMS_PREFERS_CONTRAST"),
            prefers_dark: env_flag("TCC_FORMS_PREFERS_DARK"),
        }
    }

    pub fn preferred_theme(&self) -> Theme {
        if self.prefers_high_contrast {
            Theme::HighContrast
        } else if self.prefers_dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// The class tokens and `data-theme` attribute of the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentationState {
    classes: BTreeSet<String>,
    data_theme: Option<String>,
}

impl PresentationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap the theme class token and set the attribute. Unrelated class
    /// tokens are left alone.
    pub fn apply(&mut self, theme: Theme) {
        for t in Theme::ALL {
            self.classes.remove(t.as_str());
        }
        self.classes.insert(theme.as_str().to_string());
        self.data_theme = Some(theme.as_str().to_string());
    }

    pub fn add_class(&mut self, class: &str) {
        self.classes.insert(class.to_string());
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    pub fn data_theme(&self) -> Option<&str> {
        self.data_theme.as_deref()
    }
}

pub struct ThemeStore<S: KeyValueStore> {
    store: S,
    theme: Theme,
    presentation: PresentationState,
}

impl<S: KeyValueStore> ThemeStore<S> {
    /// Resolve the initial theme and apply it.
    pub fn init(store: S, os: OsAppearance, presentation: PresentationState) -> Self {
        let theme = match store.get(THEME_KEY) {
            Ok(Some(saved)) => saved.parse().unwrap_or_else(|_| {
                debug!("Ignoring stored theme '{}'", saved);
                os.preferred_theme()
            }),
            Ok(None) => os.preferred_theme(),
            Err(e) => {
                warn!("Error loading theme preference: {}", e);
                Theme::Light
            }
        };

        let mut this = ThemeStore {
            store,
            theme,
            presentation,
        };
        this.commit(theme);
        this
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn presentation(&self) -> &PresentationState {
        &self.presentation
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.commit(theme);
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let next = self.theme.next();
        self.commit(next);
        next
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn commit(&mut self, theme: Theme) {
        self.theme = theme;
        self.presentation.apply(theme);
        if let Err(e) = self.store.set(THEME_KEY, theme.as_str()) {
            warn!("Error saving theme preference: {}", e);
        }
    }
}
