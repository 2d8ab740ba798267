//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{
        HeaderMap, HeaderName, HeaderValue, StatusCode,
        header::{AUTHORIZATION, COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::error_response;

/// The number of characters of a body to log at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// JSON fields whose values never appear in the logs.
const REDACTED_FIELDS: [&str; 3] = ["password", "accessToken", "refreshToken"];

/// Headers whose values never appear in the logs.
const REDACTED_HEADERS: [HeaderName; 3] = [AUTHORIZATION, COOKIE, SET_COOKIE];

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords and tokens in JSON bodies, and credential headers, are redacted
/// in both cases.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!("Could not read request body: {error}");
            return error_response(StatusCode::BAD_REQUEST, "could not read request body");
        }
    };

    let description = format!(
        "{} {} {:?}\nheaders: {:#?}",
        parts.method,
        parts.uri,
        parts.version,
        redact_headers(&parts.headers)
    );
    log_body("Received request", &description, &redact(&body_bytes));

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    };

    let description = format!(
        "{} {:?}\nheaders: {:#?}",
        parts.status,
        parts.version,
        redact_headers(&parts.headers)
    );
    log_body("Sending response", &description, &redact(&body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

async fn read_body(body: Body) -> Result<Bytes, axum::Error> {
    axum::body::to_bytes(body, usize::MAX).await
}

/// Get the body as text with the values of [REDACTED_FIELDS] replaced.
///
/// Bodies that are not JSON are returned unchanged.
fn redact(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(mut json) => {
            redact_value(&mut json);
            json.to_string()
        }
        Err(_) => String::from_utf8_lossy(body).to_string(),
    }
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *field = Value::String(REDACTED.to_owned());
                } else {
                    redact_value(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_value),
        _ => {}
    }
}

/// Copy `headers`, replacing the values of [REDACTED_HEADERS].
fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    for name in REDACTED_HEADERS {
        if headers.contains_key(&name) {
            headers.insert(name, HeaderValue::from_static(REDACTED));
        }
    }

    headers
}

fn log_body(message: &str, description: &str, body: &str) {
    if body.chars().count() > LOG_BODY_LENGTH_LIMIT {
        let truncated: String = body.chars().take(LOG_BODY_LENGTH_LIMIT).collect();
        tracing::info!("{message}: {description}\nbody: {truncated}...");
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{message}: {description}\nbody: {body:?}");
    }
}

#[cfg(test)]
mod logging_tests {
    use std::{
        io,
        sync::{Arc, Mutex},
    };

    use axum::{
        Json, Router,
        http::{
            HeaderMap, HeaderValue,
            header::{AUTHORIZATION, CONTENT_TYPE, COOKIE},
        },
        middleware,
        routing::{get, post},
    };
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use super::{logging_middleware, redact, redact_headers};

    /// Collects formatted log lines in memory.
    #[derive(Debug, Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn redacts_credential_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        headers.insert(COOKIE, HeaderValue::from_static("session=abc"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let redacted = redact_headers(&headers);

        assert_eq!(redacted[AUTHORIZATION], "********");
        assert_eq!(redacted[COOKIE], "********");
        assert_eq!(redacted[CONTENT_TYPE], "application/json");
        assert_eq!(headers[AUTHORIZATION], "Bearer abc.def.ghi");
    }

    #[tokio::test]
    async fn bearer_token_does_not_reach_the_logs() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = Router::new()
            .route("/x", get(|| async { "ok" }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::new(app);

        server
            .get("/x")
            .authorization_bearer("SECRET.ACCESS.TOKEN")
            .await
            .assert_status_ok();

        let output = logs.contents();
        assert!(
            output.contains("Received request: GET"),
            "request was not logged: {output}"
        );
        assert!(output.contains("********"));
        assert!(!output.contains("SECRET.ACCESS.TOKEN"));
    }

    #[test]
    fn redacts_passwords_and_tokens() {
        let body = json!({
            "email": "foo@bar.baz",
            "password": "hunter22",
            "nested": {"refreshToken": "abc"},
            "accessToken": "xyz",
        })
        .to_string();

        let redacted: Value = serde_json::from_str(&redact(body.as_bytes())).unwrap();

        assert_eq!(
            redacted,
            json!({
                "email": "foo@bar.baz",
                "password": "********",
                "nested": {"refreshToken": "********"},
                "accessToken": "********",
            })
        );
    }

    #[test]
    fn leaves_other_bodies_alone() {
        assert_eq!(redact(b"password=hunter2"), "password=hunter2");
        assert_eq!(redact(b""), "");
    }

    #[tokio::test]
    async fn passes_bodies_through_unchanged() {
        let app = Router::new()
            .route("/echo", post(|Json(body): Json<Value>| async move { Json(body) }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::new(app);
        let body = json!({"password": "hunter22", "title": "x".repeat(100)});

        let response = server.post("/echo").json(&body).await;

        response.assert_status_ok();
        response.assert_json(&body);
    }
}
