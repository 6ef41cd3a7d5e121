//! In-memory state of a form being filled.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{
    CriterionScore, EvaluationRecord, EvaluatorInfo, FormKind, SignatureSet, SignerRole,
    StudentInfo,
};
use crate::score;

/// Mutable form state. This is also the opaque progress snapshot written
/// to the local store, so field names follow the browser form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDraft {
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
    pub presentation_time: String,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub final_delivery_date: String,
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,
    #[serde(default)]
    pub comments: BTreeMap<String, String>,
    #[serde(default)]
    pub general_comments: String,
    #[serde(default)]
    pub signatures: SignatureSet,
}

impl FormDraft {
    /// A blank draft with the defaults the form opens with.
    pub fn new(kind: FormKind, today: NaiveDate) -> Self {
        let extra_evaluator = kind.is_minutes().then(EvaluatorInfo::default);
        FormDraft {
            kind,
            student_info: StudentInfo::empty(kind.default_course()),
            evaluator_info: EvaluatorInfo::default(),
            evaluator_info2: extra_evaluator.clone(),
            evaluator_info3: extra_evaluator,
            evaluation_date: today.format("%Y-%m-%d").to_string(),
            presentation_time: String::new(),
            room: String::new(),
            final_delivery_date: String::new(),
            scores: BTreeMap::new(),
            comments: BTreeMap::new(),
            general_comments: String::new(),
            signatures: SignatureSet::default(),
        }
    }

    pub fn set_score(&mut self, criterion_id: &str, value: f64) {
        self.scores.insert(criterion_id.to_string(), value);
    }

    pub fn set_comment(&mut self, criterion_id: &str, comment: &str) {
        self.comments
            .insert(criterion_id.to_string(), comment.to_string());
    }

    pub fn set_signature(&mut self, role: SignerRole, data_uri: Option<String>) {
        self.signatures.set(role, data_uri);
    }

    /// Live score, as shown next to the table while the form is filled.
    pub fn current_score(&self) -> score::ScoreOutcome {
        score::compute(self.kind.criteria(), &self.scores)
    }

    /// Freeze the draft into a record, deriving score and verdict.
    pub fn submit(&self, now: DateTime<Utc>) -> EvaluationRecord {
        let outcome = self.current_score();
        let criteria = self.kind.criteria();

        let mut ids: Vec<&str> = criteria
            .iter()
            .map(|c| c.id)
            .filter(|id| self.scores.contains_key(*id))
            .collect();
        ids.extend(
            self.scores
                .keys()
                .map(String::as_str)
                .filter(|id| !criteria.iter().any(|c| c.id == *id)),
        );

        let scores = ids
            .into_iter()
            .map(|id| CriterionScore {
                criteria_id: id.to_string(),
                score: self.scores[id],
                comments: self.comments.get(id).filter(|c| !c.is_empty()).cloned(),
            })
            .collect();

        EvaluationRecord {
            id: format!("{}_{}", self.kind, now.timestamp_millis()),
            kind: self.kind,
            student_info: self.student_info.clone(),
            evaluator_info: self.evaluator_info.clone(),
            evaluator_info2: self.evaluator_info2.clone(),
            evaluator_info3: self.evaluator_info3.clone(),
            evaluation_date: self.evaluation_date.clone(),
            scores,
            general_comments: non_empty(&self.general_comments),
            final_score: outcome.final_score,
            approved: outcome.approved,
            signature: None,
            signatures: self.signatures.clone(),
            presentation_time: non_empty(&self.presentation_time),
            room: non_empty(&self.room),
            final_delivery_date: non_empty(&self.final_delivery_date),
            created_at: now,
            updated_at: now,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
