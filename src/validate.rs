use serde_json::Value as JsonValue;

use crate::error::{BotError, json_type_name};

/// A response body that passed [`check_response`].
/// Borrows from the original body; nothing is normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckedResponse<'a> {
    pub homeworks: &'a [JsonValue],
    pub current_date: i64,
}

impl<'a> CheckedResponse<'a> {
    /// The most recent homework, if any. Older entries are ignored.
    #[must_use]
    pub fn latest(&self) -> Option<&'a JsonValue> {
        self.homeworks.first()
    }
}

/// Checks that the API body has the documented shape.
///
/// # Errors
/// The checks run in this order and the first failing one is returned:
/// * body is not an object ([`BotError::WrongType`])
/// * `homeworks` is absent ([`BotError::MissingKey`])
/// * `homeworks` is not an array ([`BotError::WrongType`])
/// * `current_date` is absent ([`BotError::MissingKey`])
/// * `current_date` is not an integer ([`BotError::WrongType`])
pub fn check_response(response: &JsonValue) -> Result<CheckedResponse<'_>, BotError> {
    let JsonValue::Object(map) = response else {
        return Err(wrong_type("response", response));
    };

    let homeworks = map
        .get("homeworks")
        .ok_or(BotError::MissingKey("homeworks"))?;
    let JsonValue::Array(homeworks) = homeworks else {
        return Err(wrong_type("homeworks", homeworks));
    };

    let current_date = map
        .get("current_date")
        .ok_or(BotError::MissingKey("current_date"))?;
    let current_date = current_date
        .as_i64()
        .ok_or_else(|| wrong_type("current_date", current_date))?;

    Ok(CheckedResponse {
        homeworks,
        current_date,
    })
}

fn wrong_type(what: &'static str, value: &JsonValue) -> BotError {
    BotError::WrongType {
        what,
        found: json_type_name(value),
    }
}
