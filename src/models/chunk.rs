use serde::{Deserialize, Serialize};

/// Constant model-build token repeated on every chunk of a stream.
pub const SYSTEM_FINGERPRINT: &str = "fp_44709d6fcb";

/// Incremental portion of the assistant message carried by one frame.
/// Role appears only on the opening chunk, content only on content chunks.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DeltaMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub index: u64,
    pub delta: DeltaMessage,
    /// Always serialized as null; present to match the OpenAI wire schema.
    #[serde(default)]
    pub logprobs: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub system_fingerprint: String,
    pub choices: Vec<ChunkChoice>,
}

impl ChatCompletionChunk {
    /// Opening chunk: announces the assistant role before any content.
    pub fn role_opening(id: &str, created: i64, model: &str) -> Self {
        Self::with_delta(
            id,
            created,
            model,
            DeltaMessage {
                role: Some("assistant".to_string()),
                content: None,
            },
            None,
        )
    }

    pub fn content(id: &str, created: i64, model: &str, content: String) -> Self {
        Self::with_delta(
            id,
            created,
            model,
            DeltaMessage {
                role: None,
                content: Some(content),
            },
            None,
        )
    }

    /// Terminal chunk: empty delta, finish_reason "stop".
    pub fn stop(id: &str, created: i64, model: &str) -> Self {
        Self::with_delta(
            id,
            created,
            model,
            DeltaMessage::default(),
            Some("stop".to_string()),
        )
    }

    fn with_delta(
        id: &str,
        created: i64,
        model: &str,
        delta: DeltaMessage,
        finish_reason: Option<String>,
    ) -> Self {
        ChatCompletionChunk {
            id: id.to_string(),
            object: "chat.completion.chunk".to_string(),
            created,
            model: model.to_string(),
            system_fingerprint: SYSTEM_FINGERPRINT.to_string(),
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                logprobs: None,
                finish_reason,
            }],
        }
    }
}
