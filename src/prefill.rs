//! # Prefilled Links
//!
//! A generator view builds a link carrying some student/evaluator fields in
//! its query string; opening the link pre-populates the form. Everything
//! travels as a string: a numeric year comes back as `"2025"`.
//!
//! Decoding reads a fixed allow-list and ignores everything else. It never
//! fails; a malformed query simply yields fewer fields.

use serde::{Deserialize, Serialize};
use url::{form_urlencoded, Url};

use crate::model::{Course, FormDraft, FormKind};

/// Query keys understood by [`decode`], in encoding order.
pub const PREFILL_FIELDS: [&str; 11] = [
    "studentName",
    "registration",
    "course",
    "advisor",
    "coadvisor",
    "title",
    "semester",
    "year",
    "evaluatorName",
    "evaluatorInstitution",
    "evaluationDate",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefillPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coadvisor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluator_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluator_institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_date: Option<String>,
}

impl PrefillPayload {
    /// Field value by query key.
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "studentName" => &self.student_name,
            "registration" => &self.registration,
            "course" => &self.course,
            "advisor" => &self.advisor,
            "coadvisor" => &self.coadvisor,
            "title" => &self.title,
            "semester" => &self.semester,
            "year" => &self.year,
            "evaluatorName" => &self.evaluator_name,
            "evaluatorInstitution" => &self.evaluator_institution,
            "evaluationDate" => &self.evaluation_date,
            _ => return None,
        };
        value.as_deref()
    }

    /// Set a field by query key. Returns false for keys off the allow-list.
    pub fn set(&mut self, key: &str, value: String) -> bool {
        let slot = match key {
            "studentName" => &mut self.student_name,
            "registration" => &mut self.registration,
            "course" => &mut self.course,
            "advisor" => &mut self.advisor,
            "coadvisor" => &mut self.coadvisor,
            "title" => &mut self.title,
            "semester" => &mut self.semester,
            "year" => &mut self.year,
            "evaluatorName" => &mut self.evaluator_name,
            "evaluatorInstitution" => &mut self.evaluator_institution,
            "evaluationDate" => &mut self.evaluation_date,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Present, non-empty fields in allow-list order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        PREFILL_FIELDS
            .into_iter()
            .filter_map(move |key| self.get(key).filter(|v| !v.is_empty()).map(|v| (key, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.fields().next().is_none()
    }

    /// Copy present fields into a draft. A course that is neither `CC` nor
    /// `SI` is ignored.
    pub fn apply_to(&self, draft: &mut FormDraft) {
        let student = &mut draft.student_info;
        if let Some(v) = self.nonempty(&self.student_name) {
            student.name = v;
        }
        if let Some(v) = self.nonempty(&self.registration) {
            student.registration = Some(v);
        }
        if let Some(course) = self.course.as_deref().and_then(Course::from_code) {
            student.course = course;
        }
        if let Some(v) = self.nonempty(&self.advisor) {
            student.advisor = v;
        }
        if let Some(v) = self.nonempty(&self.coadvisor) {
            student.coadvisor = Some(v);
        }
        if let Some(v) = self.nonempty(&self.title) {
            student.title = v;
        }
        if let Some(v) = self.nonempty(&self.semester) {
            student.semester = v;
        }
        if let Some(v) = self.nonempty(&self.year) {
            student.year = v;
        }
        if let Some(v) = self.nonempty(&self.evaluator_name) {
            draft.evaluator_info.name = v;
        }
        if let Some(v) = self.nonempty(&self.evaluator_institution) {
            draft.evaluator_info.institution = v;
        }
        if let Some(v) = self.nonempty(&self.evaluation_date) {
            draft.evaluation_date = v;
        }
    }

    fn nonempty(&self, value: &Option<String>) -> Option<String> {
        value.as_ref().filter(|v| !v.is_empty()).cloned()
    }
}

/// Build `{base}/forms/{kind}?{query}` carrying the non-empty fields.
pub fn encode(base_url: &str, kind: FormKind, payload: &PrefillPayload) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in payload.fields() {
        serializer.append_pair(key, value);
    }
    format!(
        "{}/forms/{}?{}",
        base_url.trim_end_matches('/'),
        kind,
        serializer.finish()
    )
}

/// Read the allow-listed fields from a query string, a relative link or an
/// absolute link.
pub fn decode(input: &str) -> PrefillPayload {
    let absolute = Url::parse(input).ok();
    let query = match &absolute {
        Some(url) => url.query().unwrap_or_default(),
        None => {
            let query = input.find('?').map_or(input, |pos| &input[pos + 1..]);
            query.split('#').next().unwrap_or_default()
        }
    };

    let mut payload = PrefillPayload::default();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if value.is_empty() || payload.get(&key).is_some() {
            continue;
        }
        payload.set(&key, value.into_owned());
    }
    payload
}

/// Extract the form kind from a `/forms/{kind}` path.
pub fn form_kind_from_path(path: &str) -> Option<FormKind> {
    let rest = &path[path.find("/forms/")? + "/forms/".len()..];
    let segment = rest.split(['?', '#', '/']).next()?;
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> PrefillPayload {
        PrefillPayload {
            student_name: Some("João da Silva".to_string()),
            course: Some("CC".to_string()),
            title: Some("Análise & Síntese: 100% = sucesso?".to_string()),
            year: Some("2025".to_string()),
            evaluation_date: Some("2025-03-05".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_encode_shape() {
        let url = encode("https://forms.example/", FormKind::FinalCc, &sample());
        assert!(url.starts_with("https://forms.example/forms/avaliacao_final_cc?studentName="));
        assert!(url.contains("studentName=Jo%C3%A3o+da+Silva"));
        assert!(!url.contains("advisor="));
    }

    #[test]
    fn test_empty_fields_not_encoded() {
        let payload = PrefillPayload {
            advisor: Some(String::new()),
            semester: Some("1".to_string()),
            ..Default::default()
        };
        let url = encode("http://x", FormKind::Ata, &payload);
        assert_eq!(url, "http://x/forms/ata_apresentacao?semester=1");
    }

    #[test]
    fn test_round_trip_restores_fields() {
        let payload = sample();
        let url = encode("https://forms.example", FormKind::FinalSi, &payload);
        assert_eq!(decode(&url), payload);
    }

    #[test]
    fn test_unknown_and_empty_params_ignored() {
        let decoded = decode("?studentName=Ana&utm_source=mail&advisor=&evil=1");
        assert_eq!(
            decoded,
            PrefillPayload {
                student_name: Some("Ana".to_string()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_malformed_query_never_fails() {
        assert!(decode("").is_empty());
        assert!(decode("%%%&&==").is_empty());
        assert!(decode("https://forms.example/forms/ata_apresentacao").is_empty());
        let decoded = decode("year=%E0%A4%A&title=ok");
        assert_eq!(decoded.title.as_deref(), Some("ok"));
    }

    #[test]
    fn test_bare_query_with_literal_url_value() {
        let decoded = decode("title=http://repositorio.ufsm.br/tcc&studentName=Ana");
        assert_eq!(decoded.title.as_deref(), Some("http://repositorio.ufsm.br/tcc"));
        assert_eq!(decoded.student_name.as_deref(), Some("Ana"));

        let relative = decode("/forms/avaliacao_final_cc?studentName=Ana#top");
        assert_eq!(relative.student_name.as_deref(), Some("Ana"));

        let absolute = decode("https://forms.example/forms/avaliacao_final_cc?studentName=J%C3%BAlia#x");
        assert_eq!(absolute.student_name.as_deref(), Some("Júlia"));
    }

    #[test]
    fn test_form_kind_from_path() {
        assert_eq!(
            form_kind_from_path("/forms/avaliacao_final_si"),
            Some(FormKind::FinalSi)
        );
        assert_eq!(
            form_kind_from_path("https://x/forms/ata_apresentacao?year=1"),
            Some(FormKind::Ata)
        );
        assert_eq!(form_kind_from_path("/forms/unknown"), None);
        assert_eq!(form_kind_from_path("/about"), None);
    }

    #[test]
    fn test_apply_to_draft() {
        let mut draft = FormDraft::new(
            FormKind::FinalSi,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );
        let mut payload = sample();
        payload.evaluator_institution = Some("UFRGS".to_string());
        payload.apply_to(&mut draft);

        assert_eq!(draft.student_info.name, "João da Silva");
        assert_eq!(draft.student_info.course, crate::model::Course::Cc);
        assert_eq!(draft.student_info.year, "2025");
        assert_eq!(draft.evaluator_info.institution, "UFRGS");
        assert_eq!(draft.evaluation_date, "2025-03-05");

        let bogus = PrefillPayload {
            course: Some("XX".to_string()),
            ..Default::default()
        };
        bogus.apply_to(&mut draft);
        assert_eq!(draft.student_info.course, crate::model::Course::Cc);
    }
}
