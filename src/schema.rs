//! The six-field output contract the generation service is asked to honour,
//! and the validation step that turns its reply into [`FlashcardRecord`]s.

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::GenerationError;
use crate::models::FlashcardRecord;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub description: &'static str,
}

// 顺序与 FlashcardRecord 字段一致
pub const FIELDS: [FieldSpec; 6] = [
    FieldSpec { key: "english", description: "English meaning" },
    FieldSpec { key: "burmese", description: "Burmese script" },
    FieldSpec { key: "burmesePronunciation", description: "Burmese romanized pronunciation" },
    FieldSpec { key: "chinese", description: "Chinese Simplified characters" },
    FieldSpec { key: "chinesePinyin", description: "Chinese Pinyin with tone marks" },
    FieldSpec {
        key: "category",
        description: "The specific sub-category (e.g., Noun, Verb, Idiom)",
    },
];

pub fn schema_name() -> String {
    format!("flashcard_deck_v{}", SCHEMA_VERSION)
}

/// JSON schema sent as the structured-output constraint.
pub fn response_schema() -> Value {
    let properties: Map<String, Value> = FIELDS
        .iter()
        .map(|f| {
            (
                f.key.to_string(),
                json!({ "type": "string", "description": f.description }),
            )
        })
        .collect();
    let required: Vec<&str> = FIELDS.iter().map(|f| f.key).collect();

    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        }
    })
}

/// Validates a completion body and maps it onto records, keeping the
/// service's order.
pub fn parse_cards(text: &str) -> Result<Vec<FlashcardRecord>, GenerationError> {
    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    let parsed = parse_reply(text)?;

    let Value::Array(items) = parsed else {
        return Err(GenerationError::MalformedResponse(
            "expected a JSON array of cards".to_string(),
        ));
    };

    if items.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| record_from_value(i + 1, item))
        .collect()
}

fn record_from_value(index: usize, item: &Value) -> Result<FlashcardRecord, GenerationError> {
    let Value::Object(object) = item else {
        return Err(GenerationError::MalformedResponse(format!(
            "item {}: expected an object",
            index
        )));
    };

    for key in object.keys() {
        if !FIELDS.iter().any(|f| f.key == key) {
            debug!(index, key = %key, "ignoring unknown card field");
        }
    }

    let field = |key: &str| -> Result<String, GenerationError> {
        match object.get(key) {
            None | Some(Value::Null) => Err(GenerationError::MalformedResponse(format!(
                "item {}: missing field \"{}\"",
                index, key
            ))),
            Some(Value::String(s)) if s.trim().is_empty() => {
                Err(GenerationError::MalformedResponse(format!(
                    "item {}: field \"{}\" is empty",
                    index, key
                )))
            }
            Some(Value::String(s)) => Ok(s.trim().to_string()),
            Some(_) => Err(GenerationError::MalformedResponse(format!(
                "item {}: field \"{}\" is not a string",
                index, key
            ))),
        }
    };

    Ok(FlashcardRecord {
        term: field(FIELDS[0].key)?,
        translation_primary: field(FIELDS[1].key)?,
        translation_primary_pronunciation: field(FIELDS[2].key)?,
        translation_secondary: field(FIELDS[3].key)?,
        translation_secondary_phonetic: field(FIELDS[4].key)?,
        category: field(FIELDS[5].key)?,
    })
}

// 去掉 ```json 代码块
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```").trim())
        .unwrap_or(trimmed)
}

// 整体先按 JSON 解析；失败时才截取 [ ... ] 部分，且 [ 必须出现在任何 { 之前
fn parse_reply(content: &str) -> Result<Value, GenerationError> {
    let unfenced = strip_code_fence(content);
    let whole_error = match serde_json::from_str::<Value>(unfenced) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let json_start = unfenced.find('[');
    let object_start = unfenced.find('{');
    let json_end = unfenced.rfind(']').map(|i| i + 1);
    match (json_start, json_end) {
        (Some(start), Some(end)) if end > start && object_start.is_none_or(|o| start < o) => {
            serde_json::from_str(&unfenced[start..end])
                .map_err(|e| GenerationError::MalformedResponse(format!("not valid JSON: {}", e)))
        }
        _ => Err(GenerationError::MalformedResponse(format!("not valid JSON: {}", whole_error))),
    }
}
