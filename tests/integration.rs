//! Integration tests for the tcc-forms pipeline.
//!
//! These tests exercise the public API end to end:
//! - draft → record → laid-out pages → PDF bytes
//! - page breaks and the abbreviated header on continuation pages
//! - signatures embedded from pen strokes, and broken ones degrading
//! - prefilled links, local progress and theme state
//! - raster capture paging

use chrono::{NaiveDate, TimeZone, Utc};

use tcc_forms::capture;
use tcc_forms::dates::{display_date, format_iso_date, BLANK_DATE};
use tcc_forms::layout::page_break::{CONTENT_BOTTOM, RESET_Y};
use tcc_forms::layout::{DrawCommand, FormLayoutSettings, FormPdfGenerator, LayoutDocument, LayoutPage};
use tcc_forms::model::criteria::{CriterionDefinition, ANDAMENTO_CC};
use tcc_forms::model::{EvaluationRecord, FormDraft, FormKind, SignerRole};
use tcc_forms::prefill::{self, PrefillPayload};
use tcc_forms::score;
use tcc_forms::signature::{PenStroke, SignatureSource};
use tcc_forms::storage::{self, MemoryStore, SaveStatus};
use tcc_forms::theme::{OsAppearance, PresentationState, Theme, ThemeStore};

// ─── Helpers ────────────────────────────────────────────────────

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 20).unwrap()
}

fn filled_draft(kind: FormKind) -> FormDraft {
    let mut draft = FormDraft::new(kind, today());
    draft.student_info.name = "Lucas Pereira".to_string();
    draft.student_info.title = "Verificação formal de contratos inteligentes".to_string();
    draft.student_info.advisor = "Prof. Dr. Marcos Teixeira".to_string();
    draft.student_info.semester = "2".to_string();
    draft.student_info.year = "2025".to_string();
    draft.evaluator_info.name = "Profa. Dra. Júlia Ramos".to_string();
    for criterion in kind.criteria() {
        draft.set_score(criterion.id, criterion.max_score);
    }
    draft
}

fn submit(draft: &FormDraft) -> EvaluationRecord {
    draft.submit(Utc.with_ymd_and_hms(2025, 11, 20, 15, 30, 0).unwrap())
}

fn layout(record: &EvaluationRecord) -> LayoutDocument {
    FormPdfGenerator::new(record, &FormLayoutSettings::default()).layout()
}

/// Lowest point an element reaches: the baseline for text, the bottom
/// edge for boxes and images.
fn lowest_point(element: &DrawCommand) -> f64 {
    match element {
        DrawCommand::Text { y, .. } => *y,
        DrawCommand::Line { y1, y2, .. } => y1.max(*y2),
        DrawCommand::Rect { y, height, .. } | DrawCommand::Image { y, height, .. } => y + height,
    }
}

fn assert_within_content_area(doc: &LayoutDocument) {
    for (index, page) in doc.pages.iter().enumerate() {
        for element in &page.elements {
            let bottom = lowest_point(element);
            assert!(
                bottom <= CONTENT_BOTTOM + 1e-9,
                "page {} has content down to {}mm",
                index + 1,
                bottom
            );
        }
    }
}

fn has_text(page: &LayoutPage, text: &str) -> bool {
    page.texts().any(|(t, _)| t == text)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.starts_with(b"%PDF-1.7"), "missing PDF header");
    assert!(contains(bytes, b"%%EOF"), "missing EOF marker");
    assert!(contains(bytes, b"startxref"), "missing xref pointer");
}

// ─── Scoring ────────────────────────────────────────────────────

#[test]
fn test_progress_form_scores_eight_and_approves() {
    let mut draft = FormDraft::new(FormKind::AndamentoCc, today());
    draft.set_score("apresentacao", 4.0);
    draft.set_score("qualidade_conteudo", 3.0);
    draft.set_score("relevancia_originalidade", 1.0);

    let record = submit(&draft);
    assert!((record.final_score - 8.0).abs() < 1e-9);
    assert!(record.approved);
    assert_eq!(record.recompute_score().display(), "8.0");
}

#[test]
fn test_empty_criteria_scores_zero() {
    let empty: &[CriterionDefinition] = &[];
    let outcome = score::compute(empty, &Default::default());
    assert_eq!(outcome.final_score, 0.0);
    assert!(!outcome.approved);
}

#[test]
fn test_out_of_range_scores_are_clamped() {
    let mut scores = std::collections::BTreeMap::new();
    scores.insert("apresentacao".to_string(), 50.0);
    scores.insert("qualidade_conteudo".to_string(), -2.0);
    let outcome = score::compute(ANDAMENTO_CC, &scores);
    assert_eq!(outcome.total_score, 5.0);
    assert!((outcome.final_score - 5.0).abs() < 1e-9);
    assert!(!outcome.approved);
}

// ─── Rendering ──────────────────────────────────────────────────

#[test]
fn test_every_kind_renders_a_valid_pdf() {
    for kind in FormKind::ALL {
        let record = submit(&filled_draft(kind));
        let rendered = tcc_forms::render(&record).unwrap();
        assert_valid_pdf(&rendered.bytes);
        assert!(rendered.page_count >= 1);
        assert!(rendered.file_name.starts_with(kind.id()));
        assert!(rendered.file_name.ends_with(".pdf"));
    }
}

#[test]
fn test_render_json_round_trip() {
    let record = submit(&filled_draft(FormKind::FinalSi));
    let json = serde_json::to_string(&record).unwrap();
    let rendered = tcc_forms::render_json(&json).unwrap();
    assert_valid_pdf(&rendered.bytes);
    assert!(tcc_forms::render_json("{\"type\": \"avaliacao_x\"}").is_err());
}

#[test]
fn test_long_form_breaks_with_abbreviated_header() {
    let mut draft = filled_draft(FormKind::FinalCc);
    draft.general_comments = "A metodologia precisa ser detalhada com mais cuidado. ".repeat(150);
    let doc = layout(&submit(&draft));

    assert!(doc.page_count() > 1, "expected more than one page");
    for page in &doc.pages[1..] {
        let header: Vec<(&str, f64)> = page.texts().filter(|(_, y)| *y < 32.0).collect();
        assert_eq!(header.len(), 3, "abbreviated header has three lines");
        assert!(!page.contains_text("FICHA DE AVALIAÇÃO FINAL DE TCC - CIÊNCIA DA COMPUTAÇÃO"));
        let first_body = page
            .texts()
            .map(|(_, y)| y)
            .filter(|y| *y > 32.0)
            .fold(f64::MAX, f64::min);
        assert_eq!(first_body, RESET_Y);
    }
    assert_within_content_area(&doc);
}

#[test]
fn test_evaluation_table_splits_between_rows_and_repeats_header() {
    let descriptions: Vec<&str> = FormKind::FinalSi.criteria().iter().map(|c| c.description).collect();
    let rows_on = |page: &LayoutPage| descriptions.iter().filter(|d| has_text(page, d)).count();

    // Lengthen the title until the table straddles a page boundary with
    // criterion rows on both sides.
    let mut straddling = None;
    for words in 1..=200 {
        let mut draft = filled_draft(FormKind::FinalSi);
        draft.student_info.title = "Sistemas distribuídos ".repeat(words).trim_end().to_string();
        let doc = layout(&submit(&draft));
        let header_pages: Vec<usize> = (0..doc.page_count())
            .filter(|i| has_text(&doc.pages[*i], "Critério"))
            .collect();
        if header_pages.len() == 2
            && rows_on(&doc.pages[header_pages[0]]) > 0
            && rows_on(&doc.pages[header_pages[1]]) > 0
        {
            straddling = Some((doc, header_pages));
            break;
        }
    }
    let (doc, header_pages) = straddling.expect("no title length split the evaluation table");

    assert_eq!(header_pages[1], header_pages[0] + 1, "table continues on the next page");
    let (here, next) = (&doc.pages[header_pages[0]], &doc.pages[header_pages[1]]);
    assert_eq!(rows_on(here) + rows_on(next), descriptions.len());
    assert!(has_text(here, "AVALIAÇÃO"));
    assert!(!has_text(next, "AVALIAÇÃO"), "the heading is not repeated");
    assert!(has_text(next, "NOTA FINAL"));

    // The repeated header row sits right under the abbreviated header.
    let (_, header_y) = next.texts().find(|(t, _)| *t == "Critério").unwrap();
    assert_eq!(header_y, RESET_Y + 5.0);
    assert!(next.elements.iter().any(|el| matches!(
        el,
        DrawCommand::Rect { y, .. } if *y == RESET_Y
    )));

    assert_within_content_area(&doc);
}

#[test]
fn test_minutes_signers_break_page_by_page() {
    let labels: Vec<&str> = SignerRole::MINUTES.iter().map(|role| role.label()).collect();
    let labels_on = |page: &LayoutPage| labels.iter().filter(|l| has_text(page, l)).count();

    let mut straddling = None;
    for sentences in 0..=120 {
        let mut draft = filled_draft(FormKind::Ata);
        draft.general_comments = "Discussão sobre os resultados obtidos. ".repeat(sentences);
        let doc = layout(&submit(&draft));
        let per_page: Vec<usize> = doc.pages.iter().map(&labels_on).collect();
        if per_page.iter().filter(|n| **n > 0).count() > 1 {
            straddling = Some((doc, per_page));
            break;
        }
    }
    let (doc, per_page) = straddling.expect("signers never spanned two pages");

    assert_eq!(per_page.iter().sum::<usize>(), SignerRole::MINUTES.len());
    let first = per_page.iter().position(|n| *n > 0).unwrap();
    assert!(per_page[first] < SignerRole::MINUTES.len());
    for (page, count) in doc.pages.iter().zip(&per_page).skip(first + 1) {
        if *count == 0 {
            continue;
        }
        let first_body = page
            .texts()
            .map(|(_, y)| y)
            .filter(|y| *y > 32.0)
            .fold(f64::MAX, f64::min);
        assert_eq!(first_body, RESET_Y);
    }
    assert!(doc.pages.last().unwrap().contains_text("Santa Maria, 20/11/2025"));
    assert_within_content_area(&doc);
}

#[test]
fn test_minutes_never_print_student_block() {
    let mut draft = filled_draft(FormKind::Ata);
    draft.presentation_time = "09:30".to_string();
    draft.room = "Auditório do CT".to_string();
    let doc = layout(&submit(&draft));

    assert!(doc.pages.iter().all(|p| !p.contains_text("DADOS DO TRABALHO")));
    assert!(doc.pages[0].contains_text("DADOS DA APRESENTAÇÃO"));
    assert!(doc.pages[0].contains_text("Horário: 09:30"));
    assert!(doc.pages.iter().any(|p| p.contains_text("ASSINATURAS")));
}

#[test]
fn test_drawn_signature_is_embedded() {
    let uri = SignatureSource::Drawn(vec![PenStroke::new([
        (20.0, 100.0),
        (80.0, 40.0),
        (150.0, 110.0),
        (260.0, 50.0),
    ])])
    .rasterize()
    .unwrap();

    let mut draft = filled_draft(FormKind::FinalCc);
    draft.set_signature(SignerRole::Evaluator, Some(uri));
    let record = submit(&draft);

    let doc = layout(&record);
    let images: usize = doc.pages.iter().map(|p| p.images().count()).sum();
    assert_eq!(images, 1);

    let rendered = tcc_forms::render(&record).unwrap();
    assert!(contains(&rendered.bytes, b"/SMask"));
}

#[test]
fn test_corrupt_signature_still_renders() {
    let mut draft = filled_draft(FormKind::Ata);
    draft.set_signature(
        SignerRole::Advisor,
        Some("data:image/png;base64,bm90IGEgcG5n".to_string()),
    );
    let record = submit(&draft);

    let doc = layout(&record);
    assert_eq!(doc.pages.iter().map(|p| p.images().count()).sum::<usize>(), 0);
    assert_valid_pdf(&tcc_forms::render(&record).unwrap().bytes);
}

// ─── Capture ────────────────────────────────────────────────────

#[test]
fn test_tall_capture_spans_several_pages() {
    let screenshot = image::RgbaImage::from_pixel(300, 1500, image::Rgba([240, 240, 240, 255]));
    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(screenshot)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageOutputFormat::Png)
        .unwrap();

    let rendered = capture::capture_to_pdf(&png, "captura.pdf").unwrap();
    // 300 px across 210 mm: 424 rows per page.
    assert_eq!(rendered.page_count, 4);
    assert_valid_pdf(&rendered.bytes);
    assert!(contains(&rendered.bytes, b"/Count 4"));
}

// ─── Links, progress and theme ──────────────────────────────────

#[test]
fn test_prefill_link_round_trip_into_draft() {
    let payload = PrefillPayload {
        student_name: Some("Maria da Conceição".to_string()),
        course: Some("SI".to_string()),
        year: Some("2025".to_string()),
        evaluator_name: Some("Prof. André & Cia".to_string()),
        ..Default::default()
    };
    let url = prefill::encode("https://tcc.example.org/", FormKind::FinalSi, &payload);
    assert!(url.starts_with("https://tcc.example.org/forms/avaliacao_final_si?"));
    assert_eq!(prefill::form_kind_from_path(&url), Some(FormKind::FinalSi));

    let decoded = prefill::decode(&url);
    assert_eq!(decoded, payload);

    let mut draft = FormDraft::new(FormKind::FinalSi, today());
    decoded.apply_to(&mut draft);
    assert_eq!(draft.student_info.name, "Maria da Conceição");
    assert_eq!(draft.student_info.year, "2025");
    assert_eq!(draft.evaluator_info.name, "Prof. André & Cia");
}

#[test]
fn test_progress_round_trip_and_missing_snapshot() {
    let mut store = MemoryStore::new();
    let draft = filled_draft(FormKind::Ata);
    assert_eq!(storage::save_progress(&mut store, &draft), SaveStatus::Saved);

    let (status, loaded) = storage::load_progress(&store, FormKind::Ata);
    assert_eq!(status, SaveStatus::Saved);
    assert_eq!(loaded, Some(draft));

    let (status, loaded) = storage::load_progress(&store, FormKind::FinalCc);
    assert_eq!(status, SaveStatus::Error);
    assert!(loaded.is_none());
}

#[test]
fn test_theme_cycles_and_persists() {
    let mut themes = ThemeStore::init(
        MemoryStore::new(),
        OsAppearance::default(),
        PresentationState::new(),
    );
    assert_eq!(themes.theme(), Theme::Light);
    assert_eq!(themes.toggle_theme(), Theme::Dark);
    assert_eq!(themes.toggle_theme(), Theme::HighContrast);
    assert_eq!(themes.toggle_theme(), Theme::Light);
    themes.set_theme(Theme::Dark);

    let reopened = ThemeStore::init(
        themes.into_inner(),
        OsAppearance {
            prefers_high_contrast: true,
            prefers_dark: false,
        },
        PresentationState::new(),
    );
    assert_eq!(reopened.theme(), Theme::Dark);
    assert_eq!(reopened.presentation().data_theme(), Some("dark"));
}

#[test]
fn test_dates_print_day_first() {
    assert_eq!(format_iso_date("2025-03-05").as_deref(), Some("05/03/2025"));
    assert_eq!(display_date(""), BLANK_DATE);
    assert_eq!(display_date("amanhã"), "amanhã");
}
