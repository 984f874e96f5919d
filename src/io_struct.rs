use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RelayError, RelayResult};

pub const NO_VALID_RESPONSE: &str = "No valid response from AI";
pub const MALFORMED_UPSTREAM: &str = "Malformed response from inference service";
pub const UPSTREAM_ERROR_WITHOUT_MESSAGE: &str = "Inference service returned an error";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistoryInputs {
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistoryOutputs {
    pub answer: String,
}

/// One prior turn in the shape the inference service expects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistoryItem {
    pub inputs: HistoryInputs,
    pub outputs: HistoryOutputs,
}

impl HistoryItem {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        HistoryItem {
            inputs: HistoryInputs {
                question: question.into(),
            },
            outputs: HistoryOutputs {
                answer: answer.into(),
            },
        }
    }
}

/// Request sent by the chat view to `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatRequest {
    pub question: String,
    pub chat_history: Vec<HistoryItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatReply {
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Validated inbound request as the relay sees it.
///
/// History elements are not inspected and are forwarded as received.
#[derive(Debug, Clone, Serialize)]
pub struct RelayPayload {
    pub question: String,
    pub chat_history: Vec<Value>,
}

impl RelayPayload {
    pub fn from_slice(body: &[u8]) -> RelayResult<Self> {
        let value: Value = serde_json::from_slice(body)?;
        let Value::Object(mut fields) = value else {
            return Err(RelayError::InvalidInput);
        };
        let question = match fields.remove("question") {
            Some(Value::String(question)) if !question.is_empty() => question,
            _ => return Err(RelayError::InvalidInput),
        };
        let chat_history = match fields.remove("chat_history") {
            Some(Value::Array(history)) => history,
            _ => return Err(RelayError::InvalidInput),
        };
        Ok(RelayPayload {
            question,
            chat_history,
        })
    }
}

/// Decoded JSON body of the inference service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamReply {
    Answer(String),
    Failure(String),
}

impl UpstreamReply {
    pub fn from_slice(body: &[u8]) -> RelayResult<Self> {
        let value: Value = serde_json::from_slice(body).map_err(|_| malformed())?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> RelayResult<Self> {
        let Value::Object(fields) = value else {
            return Err(malformed());
        };
        if let Some(error) = fields.get("error").filter(|error| is_truthy(error)) {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or(UPSTREAM_ERROR_WITHOUT_MESSAGE);
            return Ok(UpstreamReply::Failure(message.to_string()));
        }
        match fields.get("answer") {
            Some(Value::String(answer)) if !answer.is_empty() => {
                Ok(UpstreamReply::Answer(answer.clone()))
            }
            None | Some(Value::Null) | Some(Value::String(_)) => {
                Ok(UpstreamReply::Answer(NO_VALID_RESPONSE.to_string()))
            }
            Some(_) => Err(malformed()),
        }
    }
}

/// `null`, `false`, `""` and zero do not mark a reply as failed.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn malformed() -> RelayError {
    RelayError::UpstreamError {
        status: 500,
        message: MALFORMED_UPSTREAM.to_string(),
    }
}
