use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::get_port;
use crate::error::ApiError;
use crate::faults::{self, RandomSource, ThreadRngSource};
use crate::handler::completions::handle_completion;
use crate::router::Router;

/// Unified body type so one handler can return both buffered JSON responses
/// and streamed event-stream bodies.
pub type ResponseBody = BoxBody<Bytes, Infallible>;

pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into()).boxed()
}

pub struct ServerState {
    pub router: Router,
    pub random: Arc<dyn RandomSource>,
}

impl ServerState {
    pub fn new() -> Self {
        Self::with_random(Arc::new(ThreadRngSource))
    }

    pub fn with_random(random: Arc<dyn RandomSource>) -> Self {
        ServerState {
            router: Router::new(),
            random,
        }
    }
}

/// Top-level request handler: resolve the route, run its fault policy, then
/// hand the collected body to the completion handler. Generic over the body
/// type so tests can drive it with `Full<Bytes>` instead of a live socket.
pub async fn handle<B>(
    state: Arc<ServerState>,
    req: Request<B>,
) -> Result<Response<ResponseBody>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    info!("Received request: {} {}", req.method(), req.uri().path());

    let Some(policy) = state.router.resolve(req.uri().path()) else {
        let mut not_found = Response::new(full("Not Found"));
        *not_found.status_mut() = StatusCode::NOT_FOUND;
        return Ok(not_found);
    };

    // Non-POST is rejected before fault injection, so the verb check stays
    // deterministic on every route.
    if req.method() != hyper::Method::POST {
        return Ok(error_response(ApiError::MethodNotAllowed));
    }

    if let Err(err) = faults::apply(policy, state.random.as_ref()).await {
        return Ok(error_response(err));
    }

    let (parts, body) = req.into_parts();
    let whole_body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            error!("Error reading request body: {}", e);
            return Ok(error_response(ApiError::BodyRead));
        }
    };

    match handle_completion(&parts.method, &parts.headers, whole_body).await {
        Ok(response) => Ok(response),
        Err(err) => {
            error!("Error handling request: {}", err);
            Ok(error_response(err))
        }
    }
}

fn error_response(err: ApiError) -> Response<ResponseBody> {
    let mut response = Response::new(full(err.to_string()));
    *response.status_mut() = err.status();
    response
}

pub async fn start_server(state: Arc<ServerState>) -> Result<(), Error> {
    let port = get_port();
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let state = state.clone();
        tokio::task::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .serve_connection(io, service_fn(move |req| handle(state.clone(), req)))
                .await
            {
                error!("Error serving connection: {:?}", err);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use http::header::{CONTENT_ENCODING, CONTENT_TYPE};
    use hyper::Method;

    use super::*;
    use crate::reply;

    const BODY: &str = r#"{"model":"gpt-4","messages":[{"role":"user","content":"hi"}],"stream":false}"#;

    struct ScriptedSource {
        values: Mutex<VecDeque<u64>>,
    }

    impl RandomSource for ScriptedSource {
        fn below(&self, _upper: u64) -> u64 {
            self.values
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted source exhausted")
        }
    }

    fn scripted_state(values: &[u64]) -> Arc<ServerState> {
        Arc::new(ServerState::with_random(Arc::new(ScriptedSource {
            values: Mutex::new(values.iter().copied().collect()),
        })))
    }

    fn request(method: Method, path: &str, body: &[u8]) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::copy_from_slice(body)))
            .unwrap()
    }

    async fn body_string(response: Response<ResponseBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let state = Arc::new(ServerState::new());
        let response = handle(state, request(Method::POST, "/v2/chat", BODY.as_bytes()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_is_method_not_allowed() {
        let state = Arc::new(ServerState::new());
        let response = handle(
            state,
            request(Method::GET, "/v1/chat/completions", BODY.as_bytes()),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_string(response).await, "Method not allowed");
    }

    #[tokio::test]
    async fn test_get_on_fault_route_is_405_without_randomness() {
        // Empty script: resolving the verb must not reach the fault policy.
        let state = scripted_state(&[]);
        let response = handle(
            state,
            request(Method::GET, "/rand_fail/v1/chat/completions", &[]),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let state = Arc::new(ServerState::new());
        let response = handle(
            state,
            request(Method::POST, "/v1/chat/completions", b"{oops"),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Invalid request body");
    }

    #[tokio::test]
    async fn test_plain_completion_round_trip() {
        let state = Arc::new(ServerState::new());
        let response = handle(
            state,
            request(Method::POST, "/v1/chat/completions", BODY.as_bytes()),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(value["choices"][0]["message"]["content"], reply::FIXED_REPLY);
    }

    #[tokio::test]
    async fn test_gzip_body_decodes_like_plain() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(BODY.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let state = Arc::new(ServerState::new());
        let req = Request::builder()
            .method(Method::POST)
            .uri("/v1/chat/completions")
            .header(CONTENT_ENCODING, "gzip")
            .body(Full::new(Bytes::from(compressed)))
            .unwrap();
        let response = handle(state, req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(value["choices"][0]["message"]["content"], reply::FIXED_REPLY);
    }

    #[tokio::test]
    async fn test_rand_fail_route_returns_injected_error() {
        let state = scripted_state(&[2]);
        let response = handle(
            state,
            request(Method::POST, "/rand_fail/v1/chat/completions", BODY.as_bytes()),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "Random error");
    }

    #[tokio::test]
    async fn test_rand_fail_route_can_delegate() {
        let state = scripted_state(&[8]);
        let response = handle(
            state,
            request(Method::POST, "/rand_fail/v1/chat/completions", BODY.as_bytes()),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_streamed_completion_over_handle() {
        let body = BODY.replace("\"stream\":false", "\"stream\":true");
        let state = Arc::new(ServerState::new());
        let response = handle(
            state,
            request(Method::POST, "/v1/chat/completions", body.as_bytes()),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );
        let text = body_string(response).await;
        assert!(text.starts_with("data: "));
        assert!(text.contains("\"role\":\"assistant\""));
        assert!(text.contains("\"finish_reason\":\"stop\""));
        assert!(text.ends_with("data: [DONE]\n\n"));
    }
}
