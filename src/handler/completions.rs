use bytes::Bytes;
use chrono::Utc;
use http::header::{HeaderMap, CONTENT_ENCODING, CONTENT_TYPE};
use http::HeaderValue;
use hyper::{Method, Response};
use tracing::info;

use crate::decode;
use crate::error::ApiError;
use crate::handler::streaming;
use crate::models::chat_request::ChatRequest;
use crate::models::chat_response::ChatCompletionResponse;
use crate::reply;
use crate::server::{full, ResponseBody};
use crate::utils;

/// Completion endpoint entry point, shared by all four routes once fault
/// injection has let the request through. Only POST is accepted; the body is
/// decoded (inflating gzip first) and the stream flag picks the responder.
pub async fn handle_completion(
    method: &Method,
    headers: &HeaderMap,
    whole_body: Bytes,
) -> Result<Response<ResponseBody>, ApiError> {
    if method != Method::POST {
        return Err(ApiError::MethodNotAllowed);
    }

    let gzipped = headers
        .get(CONTENT_ENCODING)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| value.eq_ignore_ascii_case("gzip"));

    let request = decode::decode_chat_request(&whole_body, gzipped)?;
    info!(
        "chat completion request: model={} messages={} stream={}",
        request.model,
        request.messages.len(),
        request.stream
    );

    if request.stream {
        Ok(streaming::respond(request))
    } else {
        Ok(respond(request))
    }
}

/// Non-streaming responder: one envelope, serialized once, single write.
fn respond(request: ChatRequest) -> Response<ResponseBody> {
    let reply = reply::generate(&request.messages);
    let envelope = ChatCompletionResponse::new(
        utils::completion_id(),
        Utc::now().timestamp(),
        request.model,
        reply,
    );
    let body = serde_json::to_vec(&envelope).expect("completion envelope serializes");
    let mut response = Response::new(full(body));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
