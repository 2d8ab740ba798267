//! Fixtures shared by the tests: an in-memory database, a test server and a registered user.

#![allow(missing_docs)]

use std::sync::{Arc, Mutex};

use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{AppState, AuthConfig, build_router, db::initialize, endpoints};

/// The password of every user created by [register_test_user].
pub(crate) const TEST_PASSWORD: &str = "averysafeandsecurepassword";

/// The lowest cost bcrypt accepts, so that tests do not spend their time hashing.
const TEST_PASSWORD_COST: u32 = 4;

pub(crate) fn get_test_connection() -> Arc<Mutex<Connection>> {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    Arc::new(Mutex::new(connection))
}

pub(crate) fn get_test_app_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");
    let auth_config = AuthConfig::new("test-access-secret", "test-refresh-secret")
        .password_cost(TEST_PASSWORD_COST);

    AppState::new(connection, auth_config).expect("Could not create app state")
}

pub(crate) fn get_test_server() -> TestServer {
    TestServer::new(build_router(get_test_app_state()))
}

/// Register a user named "Test User" with `email` and [TEST_PASSWORD].
pub(crate) async fn register_test_user(server: &TestServer, email: &str) {
    server
        .post(endpoints::USERS)
        .json(&json!({
            "name": "Test User",
            "email": email,
            "password": TEST_PASSWORD,
        }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);
}

/// Log in as the user registered with `email` and get their access token.
pub(crate) async fn log_in_test_user(server: &TestServer, email: &str) -> String {
    let response = server
        .post(endpoints::LOG_IN)
        .json(&json!({"email": email, "password": TEST_PASSWORD}))
        .await;

    response.assert_status_ok();
    response.json::<Value>()["accessToken"]
        .as_str()
        .expect("log in response should contain an access token")
        .to_owned()
}
