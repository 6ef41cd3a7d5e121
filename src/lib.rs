//! # TCC Forms
//!
//! Evaluation forms for undergraduate thesis defenses: progress and final
//! evaluations for each course, plus the minutes of the defense session.
//!
//! A form is filled as a [`FormDraft`](model::FormDraft), submitted as an
//! [`EvaluationRecord`](model::EvaluationRecord), and rendered once into an
//! A4 PDF. The renderer is page-native: every block is measured before it
//! is placed, and a block that does not fit either moves to the next page
//! whole or is split between rows. Nothing is drawn past the bottom margin
//! and sliced afterwards.
//!
//! ## Architecture
//!
//! ```text
//! Prefilled link ──[prefill]──┐
//!                             ↓
//!   [model]  Draft → record, criteria tables
//!       ↓
//!   [score]  Clamp, sum, normalize, approve
//!       ↓
//!   [layout]  Stage machine + page flow → positioned draw commands
//!       ↓
//!   [pdf]  Serialize to PDF bytes
//! ```
//!
//! Around that pipeline: [`storage`] and [`theme`] keep local state,
//! [`signature`] turns pen strokes or uploads into PNG rasters,
//! [`capture`] pages a screenshot, and [`share`] hands links to the user.

pub mod model;
pub mod score;
pub mod prefill;
pub mod storage;
pub mod theme;
pub mod layout;
pub mod text;
pub mod font;
pub mod dates;
pub mod image_loader;
pub mod pdf;
pub mod signature;
pub mod capture;
pub mod share;
pub mod config;
pub mod error;

#[cfg(feature = "wasm")]
pub mod wasm;

use chrono::Utc;

use error::FormsError;
use layout::{FormLayoutSettings, FormPdfGenerator, RenderedForm};
use model::EvaluationRecord;

/// Render a submitted record with the default institution settings.
///
/// This is the primary entry point.
pub fn render(record: &EvaluationRecord) -> Result<RenderedForm, FormsError> {
    FormPdfGenerator::generate(record, &FormLayoutSettings::default(), Utc::now())
}

/// Render a record described as JSON.
pub fn render_json(json: &str) -> Result<RenderedForm, FormsError> {
    let record = EvaluationRecord::from_json(json)?;
    render(&record)
}
