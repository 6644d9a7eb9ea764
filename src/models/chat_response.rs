use serde::{Deserialize, Serialize};

use super::Message;

#[derive(Debug, Serialize, Deserialize)]
pub struct Choice {
    pub index: u64,
    pub message: Message,
}

/// Complete (non-streaming) response envelope, serialized once per request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
}

impl ChatCompletionResponse {
    pub fn new(id: String, created: i64, model: String, reply: &str) -> Self {
        ChatCompletionResponse {
            id,
            object: "chat.completion".to_string(),
            created,
            model,
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(reply),
            }],
        }
    }
}
