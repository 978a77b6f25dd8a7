use std::{fs::OpenOptions, net::SocketAddr, process::ExitCode, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{
    EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt,
};

use fintrack::{
    AppState, BalancePolicy, FirebaseVerifier, IdentityVerifier, SharedSecretVerifier,
    ZEN_QUOTES_URL, ZenQuotesSource, build_router, graceful_shutdown, load_tls_config,
    logging_middleware,
};

/// The REST API server for FinTrack.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// How user balances are computed.
    #[arg(long, value_enum, default_value_t = BalancePolicy::FullScan)]
    balance_policy: BalancePolicy,

    /// Verify identity tokens issued by this Firebase project.
    ///
    /// If not set, tokens are verified with the secret in the `SECRET`
    /// environment variable.
    #[arg(long, env = "FIREBASE_PROJECT_ID")]
    firebase_project_id: Option<String>,

    /// The URL of the upstream random quote API.
    #[arg(long, default_value = ZEN_QUOTES_URL)]
    quote_url: String,

    /// File path for the debug log.
    #[arg(long, default_value = "debug.log")]
    log_path: String,

    /// Directory containing an SSL certificate `cert.pem` and key `key.pem`.
    ///
    /// The server uses plain HTTP if not set.
    #[arg(long)]
    cert_path: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    setup_logging(&args.log_path);

    let identity_verifier: Arc<dyn IdentityVerifier> = match args.firebase_project_id {
        Some(project_id) => {
            tracing::info!("Verifying identity tokens for Firebase project {project_id}");
            Arc::new(FirebaseVerifier::new(&project_id))
        }
        None => match std::env::var("SECRET") {
            Ok(secret) => Arc::new(SharedSecretVerifier::new(&secret)),
            Err(_) => {
                tracing::error!(
                    "Either --firebase-project-id or the environment variable 'SECRET' must be set"
                );
                return ExitCode::FAILURE;
            }
        },
    };

    let conn = match Connection::open(&args.db_path) {
        Ok(conn) => conn,
        Err(error) => {
            tracing::error!("Could not open database file {}: {error}", args.db_path);
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::new(
        conn,
        args.balance_policy,
        identity_verifier,
        Arc::new(ZenQuotesSource::new(args.quote_url)),
    ) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("Could not initialize database: {error}");
            return ExitCode::FAILURE;
        }
    };

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(state).layer(middleware::from_fn(logging_middleware)),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    let result = match args.cert_path {
        Some(cert_path) => {
            let tls_config = match load_tls_config(&cert_path).await {
                Ok(tls_config) => tls_config,
                Err(error) => {
                    tracing::error!("Could not open TLS certificates: {error}");
                    return ExitCode::FAILURE;
                }
            };

            tracing::info!(
                "HTTPS server listening on {} with balance policy {:?}",
                addr,
                args.balance_policy
            );
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(router.into_make_service())
                .await
        }
        None => {
            tracing::info!(
                "Fin Track listening on port {} with balance policy {:?}",
                args.port,
                args.balance_policy
            );
            axum_server::bind(addr)
                .handle(handle)
                .serve(router.into_make_service())
                .await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("Server error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(log_path: &str) {
    let stdout_log = tracing_subscriber::fmt::layer().pretty().with_filter(
        EnvFilter::builder()
            .with_default_directive(filter::LevelFilter::INFO.into())
            .from_env_lossy(),
    );

    let debug_log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|error| eprintln!("Could not open log file {log_path}: {error}"))
        .ok()
        .map(|log_file| {
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_ansi(false)
                .with_writer(Arc::new(log_file))
                .with_filter(filter::LevelFilter::DEBUG)
        });

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();
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
