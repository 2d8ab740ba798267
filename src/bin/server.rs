use std::{
    error::Error,
    fs::OpenOptions,
    net::SocketAddr,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use fintrack_rs::{
    AppState, AuthConfig, DEFAULT_ACCESS_TOKEN_DURATION, DEFAULT_PASSWORD_COST,
    DEFAULT_REFRESH_TOKEN_DURATION, build_router, graceful_shutdown, logging_middleware,
};

/// The REST API server for fintrack_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DATABASE_PATH")]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// The secret for signing access tokens.
    #[arg(long, env = "JWT_ACCESS_SECRET", hide_env_values = true)]
    access_secret: String,

    /// The secret for signing refresh tokens. Must differ from the access token secret.
    #[arg(long, env = "JWT_REFRESH_SECRET", hide_env_values = true)]
    refresh_secret: String,

    /// How many minutes an access token stays valid.
    #[arg(long, env = "ACCESS_TOKEN_MINUTES", default_value_t = DEFAULT_ACCESS_TOKEN_DURATION.whole_minutes())]
    access_token_minutes: i64,

    /// How many days a refresh token stays valid.
    #[arg(long, env = "REFRESH_TOKEN_DAYS", default_value_t = DEFAULT_REFRESH_TOKEN_DURATION.whole_days())]
    refresh_token_days: i64,

    /// The bcrypt cost for hashing passwords.
    #[arg(long, env = "BCRYPT_COST", default_value_t = DEFAULT_PASSWORD_COST)]
    bcrypt_cost: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    setup_logging()?;

    let args = Args::parse();

    if args.access_secret == args.refresh_secret {
        tracing::warn!("Access and refresh tokens are signed with the same secret");
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let auth_config = AuthConfig::new(&args.access_secret, &args.refresh_secret)
        .access_token_duration(Duration::minutes(args.access_token_minutes))
        .refresh_token_duration(Duration::days(args.refresh_token_days))
        .password_cost(args.bcrypt_cost);

    let conn = Connection::open(&args.db_path)?;
    let state = AppState::new(conn, auth_config)?;

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

fn setup_logging() -> Result<(), std::io::Error> {
    let stdout_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(stdout_filter);

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
