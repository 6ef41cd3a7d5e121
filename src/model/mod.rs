//! # Form Model
//!
//! The records this crate works with. A [`FormDraft`] is the mutable state
//! of a form being filled; submitting it yields an [`EvaluationRecord`],
//! which is immutable and consumed once by the PDF generator.
//!
//! Field names on the wire are the camelCase names used by the browser
//! application, so records exported from there deserialize unchanged.

pub mod criteria;
pub mod draft;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FormsError;
use crate::score::{self, ScoreOutcome};

pub use criteria::{criteria_for, CriterionDefinition};
pub use draft::FormDraft;

/// The four form variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormKind {
    #[serde(rename = "avaliacao_andamento_cc")]
    AndamentoCc,
    #[serde(rename = "avaliacao_final_cc")]
    FinalCc,
    #[serde(rename = "avaliacao_final_si")]
    FinalSi,
    /// The minutes of the defense session itself.
    #[serde(rename = "ata_apresentacao")]
    Ata,
}

impl FormKind {
    pub const ALL: [FormKind; 4] = [
        FormKind::AndamentoCc,
        FormKind::FinalCc,
        FormKind::FinalSi,
        FormKind::Ata,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            FormKind::AndamentoCc => "avaliacao_andamento_cc",
            FormKind::FinalCc => "avaliacao_final_cc",
            FormKind::FinalSi => "avaliacao_final_si",
            FormKind::Ata => "ata_apresentacao",
        }
    }

    pub fn is_minutes(&self) -> bool {
        matches!(self, FormKind::Ata)
    }

    /// Course preselected when a draft is opened.
    pub fn default_course(&self) -> Course {
        if self.id().contains("cc") {
            Course::Cc
        } else {
            Course::Si
        }
    }

    /// Title shown in listings and share sheets.
    pub fn title(&self) -> &'static str {
        match self {
            FormKind::AndamentoCc => "Avaliação de Andamento - Ciência da Computação",
            FormKind::FinalCc => "Avaliação Final - Ciência da Computação",
            FormKind::FinalSi => "Avaliação Final - Sistemas de Informação",
            FormKind::Ata => "Ata de Apresentação de TCC",
        }
    }

    /// Title printed under the PDF header.
    pub fn document_title(&self) -> &'static str {
        match self {
            FormKind::AndamentoCc => {
                "FICHA DE AVALIAÇÃO DE ANDAMENTO DE TCC - CIÊNCIA DA COMPUTAÇÃO"
            }
            FormKind::FinalCc => "FICHA DE AVALIAÇÃO FINAL DE TCC - CIÊNCIA DA COMPUTAÇÃO",
            FormKind::FinalSi => "FICHA DE AVALIAÇÃO FINAL DE TCC - SISTEMAS DE INFORMAÇÃO",
            FormKind::Ata => "ATA DE APRESENTAÇÃO DE TCC",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FormKind::AndamentoCc => "Formulário para avaliação do andamento do Trabalho de Conclusão de Curso do curso de Ciência da Computação",
            FormKind::FinalCc => "Formulário para avaliação final do Trabalho de Conclusão de Curso do curso de Ciência da Computação",
            FormKind::FinalSi => "Formulário para avaliação final do Trabalho de Conclusão de Curso do curso de Sistemas de Informação",
            FormKind::Ata => "Ata para registro da apresentação do Trabalho de Conclusão de Curso",
        }
    }

    pub fn criteria(&self) -> &'static [CriterionDefinition] {
        criteria_for(*self)
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FormKind {
    type Err = FormsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormKind::ALL
            .into_iter()
            .find(|k| k.id() == s)
            .ok_or_else(|| FormsError::UnknownFormKind(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Course {
    #[serde(rename = "CC")]
    Cc,
    #[serde(rename = "SI")]
    Si,
}

impl Course {
    pub fn code(&self) -> &'static str {
        match self {
            Course::Cc => "CC",
            Course::Si => "SI",
        }
    }

    /// Third line of the page header.
    pub fn header_line(&self) -> &'static str {
        match self {
            Course::Cc => "CURSO DE CIÊNCIA DA COMPUTAÇÃO",
            Course::Si => "CURSO DE SISTEMAS DE INFORMAÇÃO",
        }
    }

    pub fn from_code(code: &str) -> Option<Course> {
        match code {
            "CC" => Some(Course::Cc),
            "SI" => Some(Course::Si),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluatorRole {
    Orientador,
    Coorientador,
    #[default]
    Banca,
    Coordenador,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<String>,
    pub course: Course,
    pub advisor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coadvisor: Option<String>,
    pub title: String,
    #[serde(default)]
    pub semester: String,
    #[serde(default)]
    pub year: String,
}

impl StudentInfo {
    pub fn empty(course: Course) -> Self {
        StudentInfo {
            name: String::new(),
            registration: None,
            course,
            advisor: String::new(),
            coadvisor: None,
            title: String::new(),
            semester: String::new(),
            year: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatorInfo {
    pub name: String,
    pub institution: String,
    #[serde(default)]
    pub role: EvaluatorRole,
}

impl Default for EvaluatorInfo {
    fn default() -> Self {
        EvaluatorInfo {
            name: String::new(),
            institution: "UFSM".to_string(),
            role: EvaluatorRole::Banca,
        }
    }
}

/// Raw score given for one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionScore {
    pub criteria_id: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

/// Who signs a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerRole {
    /// The single evaluator of an evaluation form.
    Evaluator,
    Advisor,
    Evaluator1,
    Evaluator2,
    Student,
}

impl SignerRole {
    /// Signers of the minutes variant, in print order.
    pub const MINUTES: [SignerRole; 4] = [
        SignerRole::Advisor,
        SignerRole::Evaluator1,
        SignerRole::Evaluator2,
        SignerRole::Student,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SignerRole::Evaluator => "Assinatura do Avaliador",
            SignerRole::Advisor => "Assinatura do(a) Orientador(a)",
            SignerRole::Evaluator1 => "Assinatura do(a) Avaliador(a) 1",
            SignerRole::Evaluator2 => "Assinatura do(a) Avaliador(a) 2",
            SignerRole::Student => "Assinatura do Estudante",
        }
    }

    /// Printed under the signature line when no name was filled in.
    pub fn placeholder_name(&self) -> &'static str {
        match self {
            SignerRole::Evaluator => "_________________________________",
            SignerRole::Advisor => "Orientador",
            SignerRole::Evaluator1 => "Avaliador 1",
            SignerRole::Evaluator2 => "Avaliador 2",
            SignerRole::Student => "Estudante",
        }
    }
}

/// One raster (data URI) per signer role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignatureSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientador: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avaliador1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avaliador2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estudante: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avaliador: Option<String>,
}

impl SignatureSet {
    pub fn get(&self, role: SignerRole) -> Option<&str> {
        match role {
            SignerRole::Evaluator => self.avaliador.as_deref(),
            SignerRole::Advisor => self.orientador.as_deref(),
            SignerRole::Evaluator1 => self.avaliador1.as_deref(),
            SignerRole::Evaluator2 => self.avaliador2.as_deref(),
            SignerRole::Student => self.estudante.as_deref(),
        }
    }

    pub fn set(&mut self, role: SignerRole, value: Option<String>) {
        let slot = match role {
            SignerRole::Evaluator => &mut self.avaliador,
            SignerRole::Advisor => &mut self.orientador,
            SignerRole::Evaluator1 => &mut self.avaliador1,
            SignerRole::Evaluator2 => &mut self.avaliador2,
            SignerRole::Student => &mut self.estudante,
        };
        *slot = value;
    }
}

/// A submitted form. Built once from a draft, rendered once, discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FormKind,
    pub student_info: StudentInfo,
    pub evaluator_info: EvaluatorInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluator_info2: Option<EvaluatorInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluator_info3: Option<EvaluatorInfo>,
    #[serde(default)]
    pub evaluation_date: String,
    #[serde(default)]
    pub scores: Vec<CriterionScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_comments: Option<String>,
    #[serde(default)]
    pub final_score: f64,
    #[serde(default)]
    pub approved: bool,
    /// Single-signature field kept for records exported by older versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default)]
    pub signatures: SignatureSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_delivery_date: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl EvaluationRecord {
    /// Parse a record from JSON and check its invariants.
    pub fn from_json(json: &str) -> Result<Self, FormsError> {
        let record: EvaluationRecord = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }

    pub fn validate(&self) -> Result<(), FormsError> {
        if !self.kind.is_minutes()
            && (self.evaluator_info2.is_some() || self.evaluator_info3.is_some())
        {
            return Err(FormsError::InvalidRecord(format!(
                "{} takes exactly one evaluator",
                self.kind
            )));
        }
        Ok(())
    }

    pub fn raw_score(&self, criterion_id: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|s| s.criteria_id == criterion_id)
            .map(|s| s.score)
    }

    /// Recompute the score from the raw per-criterion values.
    pub fn recompute_score(&self) -> ScoreOutcome {
        score::compute_with(self.kind.criteria(), |id| self.raw_score(id))
    }

    /// Signature raster for a role. The single evaluator falls back to the
    /// legacy `signature` field.
    pub fn signature_for(&self, role: SignerRole) -> Option<&str> {
        match role {
            SignerRole::Evaluator => self
                .signatures
                .get(role)
                .or(self.signature.as_deref()),
            _ => self.signatures.get(role),
        }
    }

    /// Name printed under a signer's line, if one was filled in.
    pub fn signer_name(&self, role: SignerRole) -> Option<&str> {
        let name = match role {
            SignerRole::Evaluator | SignerRole::Advisor => Some(self.evaluator_info.name.as_str()),
            SignerRole::Evaluator1 => self.evaluator_info2.as_ref().map(|e| e.name.as_str()),
            SignerRole::Evaluator2 => self.evaluator_info3.as_ref().map(|e| e.name.as_str()),
            SignerRole::Student => Some(self.student_info.name.as_str()),
        };
        name.filter(|n| !n.trim().is_empty())
    }

    pub fn has_comments(&self) -> bool {
        self.general_comments
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty())
    }
}
