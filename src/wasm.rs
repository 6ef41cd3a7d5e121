use chrono::DateTime;
use wasm_bindgen::prelude::*;

use crate::layout::{FormLayoutSettings, FormPdfGenerator};
use crate::model::{EvaluationRecord, FormKind};
use crate::prefill::{self, PrefillPayload};

#[wasm_bindgen]
pub fn render_pdf(json: &str) -> Result<Vec<u8>, JsValue> {
    let record = EvaluationRecord::from_json(json)
        .map_err(|e| JsValue::from_str(&format!("Invalid record: {}", e)))?;
    let now = DateTime::from_timestamp_millis(js_sys::Date::now() as i64).unwrap_or_default();
    FormPdfGenerator::generate(&record, &FormLayoutSettings::default(), now)
        .map(|rendered| rendered.bytes)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Build a prefilled link. `payload` is an object keyed by query field name.
#[wasm_bindgen]
pub fn prefill_url(base_url: &str, kind: &str, payload: JsValue) -> Result<String, JsValue> {
    let kind = kind
        .parse::<FormKind>()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let payload: PrefillPayload = serde_wasm_bindgen::from_value(payload)?;
    Ok(prefill::encode(base_url, kind, &payload))
}

#[wasm_bindgen]
pub fn parse_prefill(query: &str) -> Result<JsValue, JsValue> {
    Ok(serde_wasm_bindgen::to_value(&prefill::decode(query))?)
}
