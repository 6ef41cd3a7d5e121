//! # tcc-forms CLI
//!
//! Usage:
//!   tcc-forms example avaliacao_final_cc > record.json
//!   tcc-forms render record.json -o out/
//!   tcc-forms link ata_apresentacao --field studentName=Ana --copy

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use tcc_forms::capture;
use tcc_forms::config::Config;
use tcc_forms::layout::FormPdfGenerator;
use tcc_forms::model::{EvaluationRecord, FormDraft, FormKind};
use tcc_forms::prefill::{self, PrefillPayload};
use tcc_forms::score;
use tcc_forms::share::{self, NoShareSheet, SystemClipboard};
use tcc_forms::signature::{PenStroke, SignatureSource};
use tcc_forms::storage::{self, FileStore, SaveStatus};
use tcc_forms::theme::{OsAppearance, PresentationState, Theme, ThemeStore};

#[derive(Parser)]
#[command(name = "tcc-forms")]
#[command(about = "Thesis-defense evaluation forms", long_about = None)]
struct Cli {
    /// Overrides TCC_FORMS_DATA_DIR
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a submitted record (JSON file or stdin) to PDF
    Render {
        input: Option<PathBuf>,
        /// Output directory; overrides TCC_FORMS_OUTPUT_DIR
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print a filled-in example record
    Example {
        #[arg(default_value = "avaliacao_final_cc")]
        kind: String,
    },
    /// Build a prefilled link
    Link {
        kind: String,
        /// Query field as key=value, repeatable
        #[arg(long = "field", value_parser = parse_key_val)]
        fields: Vec<(String, String)>,
        /// Overrides TCC_FORMS_BASE_URL
        #[arg(long)]
        base_url: Option<String>,
        /// Copy the link to the clipboard instead of printing only
        #[arg(long)]
        copy: bool,
    },
    /// Show the form kind and fields carried by a prefilled link
    ParseLink { url: String },
    /// Compute the final score from criterion=value pairs
    Score {
        kind: String,
        #[arg(value_parser = parse_score)]
        scores: Vec<(String, f64)>,
    },
    /// Show, set or cycle the stored theme
    Theme {
        /// light, dark or high-contrast
        set: Option<String>,
        #[arg(long, conflicts_with = "set")]
        toggle: bool,
    },
    /// Save or load the progress snapshot of a form
    Progress {
        #[command(subcommand)]
        action: ProgressAction,
    },
    /// Rasterize a signature into a PNG data URI
    Signature {
        /// JSON array of strokes, each an array of [x, y] points
        #[arg(long, conflicts_with = "upload", required_unless_present = "upload")]
        strokes: Option<PathBuf>,
        /// PNG or JPEG image of a signature
        #[arg(long)]
        upload: Option<PathBuf>,
    },
    /// Page a tall screenshot into an A4 PDF
    Capture {
        image: PathBuf,
        #[arg(short, long, default_value = "captura.pdf")]
        out: PathBuf,
    },
    /// List the form kinds
    Kinds,
}

#[derive(Subcommand)]
enum ProgressAction {
    /// Store a draft (JSON file) as the progress of its kind
    Save { draft: PathBuf },
    /// Print the stored progress of a kind
    Load { kind: String },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    Ok((key.to_string(), value.to_string()))
}

fn parse_score(s: &str) -> Result<(String, f64), String> {
    let (key, value) = parse_key_val(s)?;
    let value = value
        .parse()
        .map_err(|e| format!("invalid score for {key}: {e}"))?;
    Ok((key, value))
}

fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    match cli.command {
        Commands::Render { input, out } => {
            let json = read_input(input.as_deref())?;
            let record = EvaluationRecord::from_json(&json)
                .context("input is not a valid evaluation record")?;
            let rendered =
                FormPdfGenerator::generate(&record, &config.layout_settings(), Utc::now())?;
            let dir = out.unwrap_or(config.output_dir);
            let path = rendered
                .save(&dir)
                .with_context(|| format!("failed to write PDF into {}", dir.display()))?;
            eprintln!(
                "Written {} pages ({} bytes) to {}",
                rendered.page_count,
                rendered.bytes.len(),
                path.display()
            );
        }
        Commands::Example { kind } => {
            let kind: FormKind = kind.parse()?;
            let record = example_draft(kind).submit(Utc::now());
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Link {
            kind,
            fields,
            base_url,
            copy,
        } => {
            let kind: FormKind = kind.parse()?;
            let mut payload = PrefillPayload::default();
            for (key, value) in fields {
                if !payload.set(&key, value) {
                    bail!(
                        "unknown field '{}', expected one of: {}",
                        key,
                        prefill::PREFILL_FIELDS.join(", ")
                    );
                }
            }
            let url = prefill::encode(
                base_url.as_deref().unwrap_or(&config.base_url),
                kind,
                &payload,
            );
            println!("{}", url);
            if copy
                && !share::share_url(&mut NoShareSheet, &mut SystemClipboard, &url, kind.title())
            {
                bail!("could not copy the link to the clipboard");
            }
        }
        Commands::ParseLink { url } => {
            match prefill::form_kind_from_path(&url) {
                Some(kind) => println!("kind: {}", kind),
                None => println!("kind: (none)"),
            }
            println!("{}", serde_json::to_string_pretty(&prefill::decode(&url))?);
        }
        Commands::Score { kind, scores } => {
            let kind: FormKind = kind.parse()?;
            let scores: BTreeMap<String, f64> = scores.into_iter().collect();
            let outcome = score::compute(kind.criteria(), &scores);
            println!(
                "{} / {} -> {} ({})",
                score::format_points(outcome.total_score),
                score::format_points(outcome.total_max_score),
                outcome.display(),
                if outcome.approved { "APROVADO" } else { "REPROVADO" }
            );
        }
        Commands::Theme { set, toggle } => {
            let store = FileStore::in_dir(&config.data_dir);
            let mut themes = ThemeStore::init(store, OsAppearance::from_env(), PresentationState::new());
            if let Some(value) = set {
                let theme: Theme = value.parse()?;
                themes.set_theme(theme);
            } else if toggle {
                themes.toggle_theme();
            }
            println!("{}", themes.theme());
        }
        Commands::Progress { action } => {
            let mut store = FileStore::in_dir(&config.data_dir);
            match action {
                ProgressAction::Save { draft } => {
                    let json = read_input(Some(&draft))?;
                    let draft: FormDraft =
                        serde_json::from_str(&json).context("input is not a valid draft")?;
                    if storage::save_progress(&mut store, &draft) != SaveStatus::Saved {
                        bail!("could not save progress to {}", store.path().display());
                    }
                    eprintln!("Progress saved for {}", draft.kind);
                }
                ProgressAction::Load { kind } => {
                    let kind: FormKind = kind.parse()?;
                    match storage::load_progress(&store, kind) {
                        (SaveStatus::Saved, Some(draft)) => {
                            println!("{}", serde_json::to_string_pretty(&draft)?)
                        }
                        _ => bail!("no saved progress for {}", kind),
                    }
                }
            }
        }
        Commands::Signature { strokes, upload } => {
            let source = match (strokes, upload) {
                (Some(path), _) => {
                    let json = read_input(Some(&path))?;
                    let points: Vec<Vec<(f32, f32)>> =
                        serde_json::from_str(&json).context("strokes must be [[[x, y], ...], ...]")?;
                    SignatureSource::Drawn(points.into_iter().map(PenStroke::new).collect())
                }
                (None, Some(path)) => SignatureSource::Uploaded(
                    fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?,
                ),
                (None, None) => bail!("pass --strokes or --upload"),
            };
            println!("{}", source.rasterize()?);
        }
        Commands::Capture { image, out } => {
            let bytes =
                fs::read(&image).with_context(|| format!("failed to read {}", image.display()))?;
            let file_name = out
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "captura.pdf".to_string());
            let rendered = capture::capture_to_pdf(&bytes, &file_name)?;
            fs::write(&out, &rendered.bytes)
                .with_context(|| format!("failed to write {}", out.display()))?;
            eprintln!("Written {} pages to {}", rendered.page_count, out.display());
        }
        Commands::Kinds => {
            for kind in FormKind::ALL {
                println!("{:<24} {}", kind.id(), kind.title());
            }
        }
    }

    Ok(())
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn example_draft(kind: FormKind) -> FormDraft {
    let mut draft = FormDraft::new(kind, Utc::now().date_naive());
    draft.student_info.name = "Ana Beatriz Souza".to_string();
    draft.student_info.registration = Some("202012345".to_string());
    draft.student_info.advisor = "Prof. Dr. Carlos Lima".to_string();
    draft.student_info.title =
        "Análise estática de programas concorrentes com tipos de sessão".to_string();
    draft.student_info.semester = "2".to_string();
    draft.student_info.year = "2025".to_string();
    draft.evaluator_info.name = "Profa. Dra. Helena Prado".to_string();

    for criterion in kind.criteria() {
        draft.set_score(criterion.id, criterion.max_score * 0.8);
    }
    if kind.is_minutes() {
        draft.presentation_time = "14:00".to_string();
        draft.room = "Sala 334, Prédio 07".to_string();
        if let Some(e) = draft.evaluator_info2.as_mut() {
            e.name = "Prof. Dr. Rafael Nunes".to_string();
        }
        if let Some(e) = draft.evaluator_info3.as_mut() {
            e.name = "Profa. Dra. Marina Alves".to_string();
        }
    } else {
        draft.general_comments =
            "Trabalho bem estruturado. Revisar a seção de trabalhos relacionados.".to_string();
    }
    draft
}
