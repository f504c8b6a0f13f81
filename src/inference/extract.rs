use serde_json::{Map, Value};

use super::InferenceError;
use crate::nutrition::NutritionEstimate;

const FENCE_OPEN: &str = "```json\n";
const FENCE_CLOSE: &str = "\n```";

/// Locates the JSON candidate inside a model reply.
///
/// A fenced json block wins; otherwise the first `{` up to the first `}`
/// after it. The brace fallback does not balance nested braces.
pub fn extract_json_block(reply: &str) -> Option<&str> {
    if let Some(start) = reply.find(FENCE_OPEN) {
        let body = &reply[start + FENCE_OPEN.len()..];
        if let Some(end) = body.find(FENCE_CLOSE) {
            return Some(&body[..end]);
        }
    }

    let open = reply.find('{')?;
    let close = reply[open..].find('}')?;
    Some(&reply[open..=open + close])
}

/// Extracts and validates a [`NutritionEstimate`] from a model reply.
pub fn parse_estimate(reply: &str) -> Result<NutritionEstimate, InferenceError> {
    let candidate = extract_json_block(reply)
        .ok_or_else(|| InferenceError::ResponseParse("no JSON object in reply".into()))?;

    let value: Value = serde_json::from_str(candidate)
        .map_err(|err| InferenceError::ResponseParse(format!("invalid JSON: {err}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| InferenceError::ResponseParse("reply JSON is not an object".into()))?;

    let food = match object.get("food") {
        Some(Value::String(food)) => food.clone(),
        Some(_) => return Err(InferenceError::ResponseParse("`food` is not a string".into())),
        None => return Err(missing("food")),
    };

    NutritionEstimate::new(
        food,
        number(object, "calories")?,
        number(object, "protein")?,
        number(object, "carbs")?,
        number(object, "fat")?,
    )
    .map_err(|err| InferenceError::ResponseParse(err.to_string()))
}

fn number(object: &Map<String, Value>, field: &'static str) -> Result<f64, InferenceError> {
    match object.get(field) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| InferenceError::ResponseParse(format!("`{field}` is out of range"))),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
            InferenceError::ResponseParse(format!("`{field}` is not numeric: {s:?}"))
        }),
        Some(other) => Err(InferenceError::ResponseParse(format!(
            "`{field}` is not numeric: {other}"
        ))),
        None => Err(missing(field)),
    }
}

fn missing(field: &str) -> InferenceError {
    InferenceError::ResponseParse(format!("missing field `{field}`"))
}
