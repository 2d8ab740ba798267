//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::{
        HeaderName, HeaderValue, Method, StatusCode,
        header::{
            AUTHORIZATION, CONTENT_TYPE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware,
    response::Response,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
};

use crate::{
    AppState,
    auth::{auth_guard, post_log_in, post_refresh},
    endpoints, error_response,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_summary_endpoint,
        get_transaction_endpoint, get_transactions_endpoint, replace_transaction_endpoint,
        update_transaction_endpoint,
    },
    user::{
        delete_profile_endpoint, get_profile_endpoint, register_user_endpoint,
        update_profile_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::USERS, post(register_user_endpoint))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::REFRESH, post(post_refresh));

    let protected_routes = Router::new()
        .route(
            endpoints::PROFILE,
            get(get_profile_endpoint)
                .patch(update_profile_endpoint)
                .delete(delete_profile_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            post(create_transaction_endpoint).get(get_transactions_endpoint),
        )
        .route(endpoints::TRANSACTION_SUMMARY, get(get_summary_endpoint))
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .patch(update_transaction_endpoint)
                .put(replace_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let router = protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state);

    add_security_layers(router)
}

/// Allow browser clients on any origin and set headers that stop responses
/// from being sniffed, framed or leaking the referrer.
fn add_security_layers(router: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let security_headers: [(HeaderName, &'static str); 3] = [
        (X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (X_FRAME_OPTIONS, "DENY"),
        (REFERRER_POLICY, "no-referrer"),
    ];

    security_headers
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(
                name,
                HeaderValue::from_static(value),
            ))
        })
        .layer(cors)
}

async fn get_404_not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "not found")
}

#[cfg(test)]
mod routing_tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::{endpoints, test_utils::get_test_server};

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let server = get_test_server();

        let response = server.get("/api/v1/budgets").await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({"status": "error", "message": "not found"}));
    }

    #[tokio::test]
    async fn registration_and_log_in_are_public() {
        let server = get_test_server();

        // Rejected by validation rather than by the auth middleware.
        server
            .post(endpoints::USERS)
            .json(&json!({}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        server
            .post(endpoints::LOG_IN)
            .json(&json!({}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        server
            .post(endpoints::REFRESH)
            .json(&json!({}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn transaction_routes_require_token() {
        let server = get_test_server();

        for response in [
            server.get(endpoints::TRANSACTIONS).await,
            server.get(endpoints::TRANSACTION_SUMMARY).await,
            server.get("/api/v1/transactions/1").await,
            server.delete("/api/v1/transactions/1").await,
        ] {
            response.assert_status(StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn responses_carry_security_headers() {
        let server = get_test_server();

        let response = server.get(endpoints::TRANSACTIONS).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_header("x-content-type-options", "nosniff");
        response.assert_header("x-frame-options", "DENY");
        response.assert_header("referrer-policy", "no-referrer");
    }

    #[tokio::test]
    async fn cross_origin_preflight_is_allowed() {
        let server = get_test_server();

        let response = server
            .method(Method::OPTIONS, endpoints::TRANSACTIONS)
            .add_header("origin", "http://localhost:5173")
            .add_header("access-control-request-method", "POST")
            .add_header("access-control-request-headers", "authorization,content-type")
            .await;

        response.assert_status_ok();
        response.assert_header("access-control-allow-origin", "*");
        let allowed_methods = response.header("access-control-allow-methods");
        assert!(allowed_methods.to_str().unwrap().contains("PATCH"));
    }

    #[tokio::test]
    async fn cross_origin_requests_get_allow_origin() {
        let server = get_test_server();

        let response = server
            .get("/api/v1/budgets")
            .add_header("origin", "http://localhost:5173")
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_header("access-control-allow-origin", "*");
    }
}
