//! # Evaluation Form Layout
//!
//! Walks one `EvaluationRecord` through the document stages:
//!
//! ```text
//! Header → StudentInfo | SessionInfo → EvaluationTable → Comments? → Signatures → Save
//! ```
//!
//! Each stage builds its block as a list of items with known heights and
//! hands it to the cursor, which decides whether it goes on this page, the
//! next one, or both. Continuation pages get the abbreviated header and the
//! cursor restarts at the reset offset.
//!
//! The table recomputes the score from the raw values instead of trusting
//! the stored final score, so a tampered record still prints a consistent
//! total.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::page_break::{BlockPolicy, BreakDecision, PageFlow};
use super::LayoutDocument;
use crate::dates::display_date;
use crate::error::FormsError;
use crate::font::StandardFont;
use crate::image_loader::{self, EmbeddedImage};
use crate::model::{EvaluationRecord, SignerRole};
use crate::pdf::PdfWriter;
use crate::score::{self, clamp_score, format_points};
use crate::text::TextLayout;

const MARGIN_X: f64 = 20.0;
const RIGHT_X: f64 = 190.0;
const CENTER_X: f64 = 105.0;
const TEXT_WIDTH: f64 = 170.0;

const INFO_LINE_HEIGHT: f64 = 7.0;
const SMALL_LINE_HEIGHT: f64 = 5.0;

const FIRST_CONTENT_Y: f64 = 70.0;
const HEADING_SIZE: f64 = 12.0;
const BODY_SIZE: f64 = 12.0;
const SMALL_SIZE: f64 = 10.0;

const ROW_HEIGHT: f64 = 8.0;
/// (x, width) of description, weight and score columns.
const COLUMNS: [(f64, f64); 3] = [(20.0, 120.0), (140.0, 20.0), (160.0, 20.0)];

const SIGNATURE_LINE_END_X: f64 = 100.0;
const SIGNATURE_WIDTH: f64 = 60.0;
const SIGNATURE_GAP: f64 = 20.0;

/// Institution lines printed in the page headers.
#[derive(Debug, Clone, PartialEq)]
pub struct FormLayoutSettings {
    pub institution: String,
    pub center: String,
    /// Printed before the date under the signatures.
    pub city: String,
}

impl Default for FormLayoutSettings {
    fn default() -> Self {
        Self {
            institution: "UNIVERSIDADE FEDERAL DE SANTA MARIA".to_string(),
            center: "CENTRO DE TECNOLOGIA".to_string(),
            city: "Santa Maria".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Header,
    StudentInfo,
    /// Replaces `StudentInfo` for the minutes variant.
    SessionInfo,
    EvaluationTable,
    Comments,
    Signatures,
    Save,
}

impl RenderStage {
    /// The stage that follows this one for `record`.
    pub fn next(self, record: &EvaluationRecord) -> RenderStage {
        match self {
            RenderStage::Header if record.kind.is_minutes() => RenderStage::SessionInfo,
            RenderStage::Header => RenderStage::StudentInfo,
            RenderStage::StudentInfo | RenderStage::SessionInfo => RenderStage::EvaluationTable,
            RenderStage::EvaluationTable if record.has_comments() => RenderStage::Comments,
            RenderStage::EvaluationTable | RenderStage::Comments => RenderStage::Signatures,
            RenderStage::Signatures | RenderStage::Save => RenderStage::Save,
        }
    }

    /// Every stage `record` goes through, in order.
    pub fn sequence(record: &EvaluationRecord) -> Vec<RenderStage> {
        let mut stages = vec![RenderStage::Header];
        let mut stage = RenderStage::Header;
        while stage != RenderStage::Save {
            stage = stage.next(record);
            stages.push(stage);
        }
        stages
    }
}

/// A rendered PDF ready to be written out.
#[derive(Debug, Clone)]
pub struct RenderedForm {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

impl RenderedForm {
    /// Write the PDF into `dir`, creating it if needed.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, FormsError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        info!(path = %path.display(), pages = self.page_count, bytes = self.bytes.len(), "saved form");
        Ok(path)
    }
}

/// `{kind}_{student name}_{unix ms}.pdf`, whitespace runs in the name
/// collapsed to one underscore.
pub fn file_name_for(record: &EvaluationRecord, timestamp_ms: i64) -> String {
    let mut name = String::with_capacity(record.student_info.name.len());
    let mut in_space = false;
    for ch in record.student_info.name.chars() {
        if ch.is_whitespace() {
            if !in_space {
                name.push('_');
            }
            in_space = true;
        } else {
            name.push(ch);
            in_space = false;
        }
    }
    format!("{}_{}_{}.pdf", record.kind.id(), name, timestamp_ms)
}

/// One vertical slice of a block: how far it moves the cursor and how to
/// draw it with its top at a given `y`.
struct Item<'a> {
    height: f64,
    draw: Box<dyn Fn(&mut LayoutDocument, f64) + 'a>,
}

impl<'a> Item<'a> {
    fn new(height: f64, draw: impl Fn(&mut LayoutDocument, f64) + 'a) -> Self {
        Self {
            height,
            draw: Box::new(draw),
        }
    }

    fn text(text: String, font: StandardFont, size: f64, height: f64) -> Self {
        Self::new(height, move |doc, y| doc.text(&text, MARGIN_X, y, font, size))
    }

    fn heading(text: &'a str, height: f64) -> Self {
        Self::new(height, move |doc, y| {
            doc.text(text, MARGIN_X, y, StandardFont::HelveticaBold, HEADING_SIZE)
        })
    }
}

pub struct FormPdfGenerator<'a> {
    record: &'a EvaluationRecord,
    settings: &'a FormLayoutSettings,
    doc: LayoutDocument,
    flow: PageFlow,
    text: TextLayout,
    stage: RenderStage,
}

impl<'a> FormPdfGenerator<'a> {
    pub fn new(record: &'a EvaluationRecord, settings: &'a FormLayoutSettings) -> Self {
        Self {
            record,
            settings,
            doc: LayoutDocument::new(),
            flow: PageFlow::new(FIRST_CONTENT_Y),
            text: TextLayout::default(),
            stage: RenderStage::Header,
        }
    }

    /// Render `record` to PDF bytes and pick its file name.
    pub fn generate(
        record: &EvaluationRecord,
        settings: &FormLayoutSettings,
        now: DateTime<Utc>,
    ) -> Result<RenderedForm, FormsError> {
        record.validate()?;
        let doc = FormPdfGenerator::new(record, settings).layout();
        let bytes = PdfWriter::new().write(&doc);
        Ok(RenderedForm {
            file_name: file_name_for(record, now.timestamp_millis()),
            bytes,
            page_count: doc.page_count(),
        })
    }

    pub fn stage(&self) -> RenderStage {
        self.stage
    }

    /// Run every stage up to `Save` and return the laid-out pages.
    pub fn layout(mut self) -> LayoutDocument {
        while self.stage != RenderStage::Save {
            self.step();
        }
        self.doc
    }

    /// Run the current stage and advance to the next.
    pub fn step(&mut self) {
        debug!(stage = ?self.stage, y = self.flow.y(), page = self.flow.page_index() + 1, "layout stage");
        match self.stage {
            RenderStage::Header => self.header(),
            RenderStage::StudentInfo => self.student_info(),
            RenderStage::SessionInfo => self.session_info(),
            RenderStage::EvaluationTable => self.evaluation_table(),
            RenderStage::Comments => self.comments(),
            RenderStage::Signatures => self.signatures(),
            RenderStage::Save => return,
        }
        self.stage = self.stage.next(self.record);
    }

    // ── Page furniture ──────────────────────────────────────────

    fn header(&mut self) {
        let (record, settings) = (self.record, self.settings);
        self.centered(&settings.institution, 20.0, 16.0);
        self.centered(&settings.center, 28.0, 14.0);
        self.centered(record.student_info.course.header_line(), 36.0, 12.0);
        self.centered(record.kind.document_title(), 50.0, 14.0);
        self.doc.line(MARGIN_X, 55.0, RIGHT_X, 55.0);

        self.doc.metadata.title = Some(record.kind.document_title().to_string());
        self.doc.metadata.author = non_blank(&record.evaluator_info.name);
        self.doc.metadata.subject = non_blank(&record.student_info.title);
    }

    fn abbreviated_header(&mut self) {
        let (record, settings) = (self.record, self.settings);
        self.centered(&settings.institution, 15.0, 12.0);
        self.centered(&settings.center, 22.0, 10.0);
        self.centered(record.student_info.course.header_line(), 29.0, 10.0);
        self.doc.line(MARGIN_X, 32.0, RIGHT_X, 32.0);
    }

    fn centered(&mut self, text: &str, y: f64, preferred_size: f64) {
        let font = StandardFont::HelveticaBold;
        let size = self
            .doc
            .fit_font_size(text, font, preferred_size, 8.0, TEXT_WIDTH);
        self.doc.text_centered(text, CENTER_X, y, font, size);
    }

    fn new_page(&mut self) {
        self.doc.add_page();
        self.abbreviated_header();
        self.flow.break_page();
    }

    /// Flow a block's items into pages. `continuation` is drawn at the top
    /// of every page the block continues on.
    fn place(
        &mut self,
        items: &[Item<'_>],
        policy: BlockPolicy,
        min_orphan_items: usize,
        continuation: Option<&Item<'_>>,
    ) {
        let heights: Vec<f64> = items.iter().map(|i| i.height).collect();
        let mut next = 0;
        while next < items.len() {
            let orphans = if next == 0 { min_orphan_items } else { 1 };
            let take = match self.flow.plan(&heights[next..], policy, orphans) {
                BreakDecision::Place => items.len() - next,
                BreakDecision::Split {
                    items_on_current_page,
                } => items_on_current_page,
                BreakDecision::MoveToNextPage => {
                    self.continue_on_new_page(next > 0, continuation);
                    continue;
                }
            };
            for item in &items[next..next + take] {
                (item.draw)(&mut self.doc, self.flow.y());
                self.flow.advance(item.height);
            }
            next += take;
            if next < items.len() {
                self.continue_on_new_page(true, continuation);
            }
        }
    }

    fn continue_on_new_page(&mut self, started: bool, continuation: Option<&Item<'_>>) {
        self.new_page();
        if let (true, Some(repeat)) = (started, continuation) {
            (repeat.draw)(&mut self.doc, self.flow.y());
            self.flow.skip(repeat.height);
        }
    }

    fn wrap(&self, text: &str, font: StandardFont, size: f64) -> Vec<String> {
        self.text.split_to_width(text, TEXT_WIDTH, font, size)
    }

    /// One item per wrapped line.
    fn line_items(&self, text: &str, font: StandardFont, size: f64, line_height: f64) -> Vec<Item<'a>> {
        self.wrap(text, font, size)
            .into_iter()
            .map(|line| Item::text(line, font, size, line_height))
            .collect()
    }

    /// All wrapped lines of `text` as a single item of `lines × line_height
    /// + extra`.
    fn paragraph_item(&self, text: &str, size: f64, extra: f64) -> Item<'a> {
        let lines = self.wrap(text, StandardFont::Helvetica, size);
        let height = lines.len() as f64 * SMALL_LINE_HEIGHT + extra;
        Item::new(height, move |doc, y| {
            for (i, line) in lines.iter().enumerate() {
                doc.text(
                    line,
                    MARGIN_X,
                    y + i as f64 * SMALL_LINE_HEIGHT,
                    StandardFont::Helvetica,
                    size,
                );
            }
        })
    }

    // ── Stages ──────────────────────────────────────────────────

    fn student_info(&mut self) {
        let student = &self.record.student_info;
        let mut fields = vec![format!("Aluno: {}", student.name)];
        if let Some(registration) = student.registration.as_deref().filter(|r| !r.trim().is_empty()) {
            fields.push(format!("Matrícula: {}", registration));
        }
        fields.push(format!("Título: {}", student.title));
        fields.push(format!("Orientador: {}", student.advisor));
        if let Some(coadvisor) = student.coadvisor.as_deref().filter(|c| !c.trim().is_empty()) {
            fields.push(format!("Coorientador: {}", coadvisor));
        }
        fields.push(format!("Ano/Semestre: {}", term(&student.year, &student.semester)));
        fields.push(format!(
            "Data da Avaliação: {}",
            display_date(&self.record.evaluation_date)
        ));

        self.info_block("DADOS DO TRABALHO", &fields);
    }

    fn session_info(&mut self) {
        let record = self.record;
        let mut fields = vec![format!("Data: {}", display_date(&record.evaluation_date))];
        if let Some(time) = record.presentation_time.as_deref().filter(|t| !t.trim().is_empty()) {
            fields.push(format!("Horário: {}", time));
        }
        if let Some(room) = record.room.as_deref().filter(|r| !r.trim().is_empty()) {
            fields.push(format!("Local: {}", room));
        }
        if let Some(delivery) = record
            .final_delivery_date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
        {
            fields.push(format!("Entrega da Versão Final: {}", display_date(delivery)));
        }

        self.info_block("DADOS DA APRESENTAÇÃO", &fields);
    }

    /// Heading plus labelled fields at the info line height. The cursor
    /// ends 15mm below the last baseline.
    fn info_block(&mut self, heading: &'static str, fields: &[String]) {
        let mut items = vec![Item::heading(heading, 10.0)];
        for field in fields {
            items.extend(self.line_items(field, StandardFont::Helvetica, BODY_SIZE, INFO_LINE_HEIGHT));
        }
        self.place(&items, BlockPolicy::Splittable, 2, None);
        self.flow.advance(15.0 - INFO_LINE_HEIGHT);
    }

    fn evaluation_table(&mut self) {
        let record = self.record;
        let criteria = record.kind.criteria();
        let outcome = record.recompute_score();

        let mut items = vec![Item::heading("AVALIAÇÃO", 10.0), table_row(["Critério", "Peso", "Nota"], true)];
        for criterion in criteria {
            let shown = clamp_score(record.raw_score(criterion.id).unwrap_or(0.0), criterion.max_score);
            items.push(table_row_owned(
                [
                    criterion.description.to_string(),
                    format_points(criterion.weight),
                    format_points(shown),
                ],
                false,
            ));
        }
        items.push(table_row_owned(
            ["NOTA FINAL".to_string(), String::new(), score::display_score(outcome.final_score)],
            true,
        ));

        let repeat = table_row(["Critério", "Peso", "Nota"], true);
        self.place(&items, BlockPolicy::Splittable, 3, Some(&repeat));
        self.flow.advance(15.0 - ROW_HEIGHT);
    }

    fn comments(&mut self) {
        let comments = self.record.general_comments.as_deref().unwrap_or_default();
        let mut items = vec![Item::heading("OBSERVAÇÕES", 10.0)];
        items.extend(self.line_items(comments, StandardFont::Helvetica, SMALL_SIZE, SMALL_LINE_HEIGHT));
        self.place(&items, BlockPolicy::Atomic, 2, None);
        self.flow.advance(10.0);
    }

    fn signatures(&mut self) {
        self.flow.advance(SIGNATURE_GAP);
        if self.record.kind.is_minutes() {
            self.minutes_signatures();
        } else {
            self.evaluator_signature();
        }
    }

    fn evaluator_signature(&mut self) {
        let record = self.record;
        let placeholder = SignerRole::Evaluator.placeholder_name();
        let name = non_blank(&record.evaluator_info.name).unwrap_or_else(|| placeholder.to_string());
        let institution =
            non_blank(&record.evaluator_info.institution).unwrap_or_else(|| placeholder.to_string());

        let mut items = vec![Item::heading("ASSINATURA DO AVALIADOR", 15.0)];
        items.push(match self.signature_image(SignerRole::Evaluator) {
            Some(image) => image_item(image, 20.0, 25.0),
            None => blank_line_item(15.0, 20.0),
        });
        items.push(self.paragraph_item(&name, SMALL_SIZE, 0.0));
        items.push(self.paragraph_item(&institution, SMALL_SIZE, 0.0));
        items.push(self.date_item(15.0));

        self.place(&items, BlockPolicy::Atomic, 1, None);
    }

    fn minutes_signatures(&mut self) {
        let record = self.record;
        for (index, role) in SignerRole::MINUTES.into_iter().enumerate() {
            let mut items = Vec::new();
            if index == 0 {
                items.push(Item::heading("ASSINATURAS", 15.0));
            }
            items.push(self.paragraph_item(role.label(), SMALL_SIZE, 3.0));
            items.push(match self.signature_image(role) {
                Some(image) => image_item(image, 15.0, 20.0),
                None => blank_line_item(10.0, 15.0),
            });
            let name = record.signer_name(role).unwrap_or(role.placeholder_name());
            items.push(self.paragraph_item(name, SMALL_SIZE, 15.0));

            self.place(&items, BlockPolicy::Atomic, 1, None);
        }
        let date = [self.date_item(10.0)];
        self.place(&date, BlockPolicy::Atomic, 1, None);
    }

    /// `{city}, DD/MM/YYYY` with its baseline `offset` below the item top.
    fn date_item(&self, offset: f64) -> Item<'a> {
        let line = format!(
            "{}, {}",
            self.settings.city,
            display_date(&self.record.evaluation_date)
        );
        Item::new(offset, move |doc, y| {
            doc.text(&line, MARGIN_X, y + offset, StandardFont::Helvetica, SMALL_SIZE)
        })
    }

    /// The signer's raster, if it is an image data URI that decodes. A
    /// broken image is logged and the caller draws a blank line instead.
    fn signature_image(&self, role: SignerRole) -> Option<EmbeddedImage> {
        let value = self.record.signature_for(role)?;
        if !image_loader::is_image_data_uri(value) {
            return None;
        }
        match image_loader::load_data_uri(value) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(signer = ?role, error = %e, "could not embed signature, drawing a blank line");
                None
            }
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// `2025/1` from year and semester; either alone when the other is blank.
fn term(year: &str, semester: &str) -> String {
    match (year.trim(), semester.trim()) {
        ("", s) => s.to_string(),
        (y, "") => y.to_string(),
        (y, s) => format!("{}/{}", y, s),
    }
}

fn table_row(cells: [&'static str; 3], bold: bool) -> Item<'static> {
    table_row_owned(cells.map(str::to_string), bold)
}

fn table_row_owned(cells: [String; 3], bold: bool) -> Item<'static> {
    let font = if bold {
        StandardFont::HelveticaBold
    } else {
        StandardFont::Helvetica
    };
    Item::new(ROW_HEIGHT, move |doc, y| {
        for ((x, width), cell) in COLUMNS.iter().zip(cells.iter()) {
            doc.rect(*x, y, *width, ROW_HEIGHT);
            let size = doc.fit_font_size(cell, font, SMALL_SIZE, 6.0, width - 4.0);
            doc.text(cell, x + 2.0, y + 5.0, font, size);
        }
    })
}

fn image_item(image: EmbeddedImage, image_height: f64, advance: f64) -> Item<'static> {
    Item::new(advance, move |doc, y| {
        doc.image(image.clone(), MARGIN_X, y, SIGNATURE_WIDTH, image_height)
    })
}

fn blank_line_item(line_offset: f64, advance: f64) -> Item<'static> {
    Item::new(advance, move |doc, y| {
        doc.line(MARGIN_X, y + line_offset, SIGNATURE_LINE_END_X, y + line_offset)
    })
}
