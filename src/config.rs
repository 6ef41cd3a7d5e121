use std::{env, path::PathBuf};

use tracing::{info, warn};

use crate::layout::FormLayoutSettings;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5173";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Where the progress and theme store lives.
    pub data_dir: PathBuf,
    /// Where rendered PDFs are written.
    pub output_dir: PathBuf,
    /// Origin that prefilled links point at.
    pub base_url: String,
    pub institution: String,
    pub center: String,
    pub city: String,
}

impl Config {
    pub fn load() -> Self {
        let layout = FormLayoutSettings::default();
        Self {
            data_dir: load_or("TCC_FORMS_DATA_DIR", ".tcc-forms").into(),
            output_dir: load_or("TCC_FORMS_OUTPUT_DIR", ".").into(),
            base_url: load_or("TCC_FORMS_BASE_URL", DEFAULT_BASE_URL),
            institution: load_or("TCC_FORMS_INSTITUTION", &layout.institution),
            center: load_or("TCC_FORMS_CENTER", &layout.center),
            city: load_or("TCC_FORMS_CITY", &layout.city),
        }
    }

    pub fn layout_settings(&self) -> FormLayoutSettings {
        FormLayoutSettings {
            institution: self.institution.clone(),
            center: self.center.clone(),
            city: self.city.clone(),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => {
            warn!("Environment variable {key} is empty, using default");
            Err(())
        }
        Err(_) => Err(()),
    }
}

fn load_or(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}
