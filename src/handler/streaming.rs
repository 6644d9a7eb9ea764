use std::convert::Infallible;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use http::HeaderValue;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::Response;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info};

use crate::models::chat_request::ChatRequest;
use crate::models::chunk::ChatCompletionChunk;
use crate::reply;
use crate::server::ResponseBody;
use crate::utils;

/// Pause after each content frame, so clients observe gradual arrival.
pub const STREAM_INTERVAL: Duration = Duration::from_millis(50);

/// Reply characters carried per content frame. The final frame carries a
/// single character when the reply length is odd.
const CHARS_PER_FRAME: usize = 2;

const DONE_FRAME: &[u8] = b"data: [DONE]\n\n";

type FrameSender = mpsc::Sender<Result<Frame<Bytes>, Infallible>>;

/// Build the SSE response for a streamed completion. The frame sequence is
/// produced by a spawned task feeding the body channel; hyper writes each
/// frame as it arrives, so the inter-frame pacing on the emitter side is
/// exactly what the client observes on the wire. If the client disconnects
/// the receiver closes, the next send fails and the emitter stops.
pub fn respond(request: ChatRequest) -> Response<ResponseBody> {
    let reply = reply::generate(&request.messages).to_string();
    let (tx, rx) = mpsc::channel(8);
    tokio::task::spawn(emit_stream(
        tx,
        utils::completion_id(),
        Utc::now().timestamp(),
        request.model,
        reply,
        STREAM_INTERVAL,
    ));

    let body = StreamBody::new(ReceiverStream::new(rx)).boxed();
    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    response
}

/// The stream state machine: one role-only chunk, then the reply two
/// characters at a time in order, then a terminal stop chunk, then the
/// literal `[DONE]` sentinel. Every chunk repeats the same id, created
/// timestamp, model and fingerprint.
async fn emit_stream(
    tx: FrameSender,
    id: String,
    created: i64,
    model: String,
    reply: String,
    interval: Duration,
) {
    let opening = ChatCompletionChunk::role_opening(&id, created, &model);
    if write_chunk(&tx, &opening).await.is_err() {
        return;
    }

    for piece in content_pieces(&reply) {
        let chunk = ChatCompletionChunk::content(&id, created, &model, piece);
        if write_chunk(&tx, &chunk).await.is_err() {
            return;
        }
        tokio::time::sleep(interval).await;
    }

    let stop = ChatCompletionChunk::stop(&id, created, &model);
    if write_chunk(&tx, &stop).await.is_err() {
        return;
    }
    let _ = tx.send(Ok(Frame::data(Bytes::from_static(DONE_FRAME)))).await;
}

/// Split a reply into frame-sized pieces, grouping by Unicode code point so
/// a multi-byte character is never split across frames.
fn content_pieces(reply: &str) -> Vec<String> {
    let chars: Vec<char> = reply.chars().collect();
    chars
        .chunks(CHARS_PER_FRAME)
        .map(|piece| piece.iter().collect())
        .collect()
}

async fn write_chunk(tx: &FrameSender, chunk: &ChatCompletionChunk) -> Result<(), ()> {
    let json = match serde_json::to_string(chunk) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize stream chunk: {}", e);
            return Err(());
        }
    };
    info!("stream chunk: {}", json);
    let frame = Frame::data(Bytes::from(format!("data: {}\n\n", json)));
    tx.send(Ok(frame)).await.map_err(|_| ())
}
