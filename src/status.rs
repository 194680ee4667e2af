use serde_json::Value as JsonValue;

use crate::error::{BotError, json_type_name};
use crate::verdict::HomeworkStatus;

/// Renders the chat message for a single homework entry.
///
/// # Errors
/// * the entry is not an object, or `homework_name` is not a string
/// * `homework_name` is missing
/// * `status` is missing or not one of the known codes
pub fn parse_status(homework: &JsonValue) -> Result<String, BotError> {
    let JsonValue::Object(map) = homework else {
        return Err(BotError::WrongType {
            what: "homework",
            found: json_type_name(homework),
        });
    };

    let name = map
        .get("homework_name")
        .ok_or(BotError::MissingField("homework_name"))?;
    let name = name.as_str().ok_or_else(|| BotError::WrongType {
        what: "homework_name",
        found: json_type_name(name),
    })?;

    let status = match map.get("status") {
        None => return Err(BotError::UnknownStatus(String::from("<отсутствует>"))),
        Some(JsonValue::String(code)) => {
            HomeworkStatus::from_code(code).ok_or_else(|| BotError::UnknownStatus(code.clone()))?
        }
        Some(other) => return Err(BotError::UnknownStatus(other.to_string())),
    };

    log::debug!("Homework {name:?} has status {}", status.code());
    Ok(format!(
        "Изменился статус проверки работы \"{name}\". {}",
        status.verdict()
    ))
}
