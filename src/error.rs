use thiserror::Error;

/// Everything that can go wrong inside a single polling cycle.
///
/// The `Display` texts end up verbatim in the chat failure message,
/// which is why they are written in Russian.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BotError {
    /// Transport failure or any HTTP status other than 200.
    /// The detail is only meant for the log.
    #[error("Сбой при запросе к эндпоинту")]
    ApiUnavailable { detail: String },

    #[error("Неверный тип данных ({found}) для {what}")]
    WrongType {
        what: &'static str,
        found: &'static str,
    },

    #[error("Отсутствует ключ \"{0}\"")]
    MissingKey(&'static str),

    #[error("Отсутствует переменная \"{0}\"")]
    MissingField(&'static str),

    #[error("Неожиданный статус домашней работы: {0}")]
    UnknownStatus(String),

    #[error("Ошибка при отправке сообщения: {0}")]
    Telegram(String),
}

impl BotError {
    pub(crate) fn api_unavailable(detail: impl Into<String>) -> Self {
        Self::ApiUnavailable {
            detail: detail.into(),
        }
    }

    /// Whether this error should be forwarded to the chat.
    /// A failed delivery is never reported through the channel that just failed.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        !matches!(self, Self::Telegram(_))
    }
}

/// Name of a JSON value's type, as shown in shape errors.
pub(crate) const fn json_type_name(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
