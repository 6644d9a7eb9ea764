use crate::models::Message;

pub const FIXED_REPLY: &str =
    "who are you? and what are you doing here? and what is your purpose?";

/// Stand-in for a real model: ignores the conversation and returns the same
/// sentence every time. Takes the full history so a real generator can slot
/// in without touching callers.
pub fn generate(_messages: &[Message]) -> &'static str {
    FIXED_REPLY
}
