use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use fabric_cutter::config::{DEFAULT_FABRIC_WIDTH_CM, SearchConfig};
use fabric_cutter::demand::normalize;
use fabric_cutter::types::{
    CalculationResult, FabricSize, PriorityClass, default_fabric_sizes, deserialize_length,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateRequest {
    #[serde(default = "missing_length", deserialize_with = "deserialize_length")]
    total_length: f64,
    #[serde(default)]
    sizes: Option<Vec<FabricSize>>,
    #[serde(default = "default_fabric_width")]
    fabric_width_cm: u32,
}

fn missing_length() -> f64 {
    f64::NAN
}

fn default_fabric_width() -> u32 {
    DEFAULT_FABRIC_WIDTH_CM
}

#[derive(Deserialize, Serialize)]
struct NormalizeRequest {
    sizes: Vec<FabricSize>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogueEntry {
    #[serde(flatten)]
    size: FabricSize,
    class: PriorityClass,
}

fn classify_all(sizes: &[FabricSize]) -> Result<Vec<CatalogueEntry>, (StatusCode, String)> {
    let threshold = SearchConfig::default().priority_threshold;
    let normalized = normalize(sizes).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(normalized
        .into_iter()
        .map(|size| CatalogueEntry {
            class: size.class(threshold),
            size,
        })
        .collect())
}

async fn calculate(
    Json(req): Json<CalculateRequest>,
) -> Result<Json<CalculationResult>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /calculate"
    );

    // The search is CPU-bound; keep it off the async workers.
    let result = tokio::task::spawn_blocking(move || {
        fabric_cutter::calculate_optimal_cuts_with(
            req.total_length,
            req.sizes.as_deref(),
            req.fabric_width_cm,
            SearchConfig::default(),
        )
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    tracing::info!(
        leftover = result.leftover,
        pieces = result.total_pieces(),
        "calculated cuts"
    );
    Ok(Json(result))
}

async fn normalize_catalogue(
    Json(req): Json<NormalizeRequest>,
) -> Result<Json<Vec<CatalogueEntry>>, (StatusCode, String)> {
    classify_all(&req.sizes).map(Json)
}

async fn catalogue() -> Result<Json<Vec<CatalogueEntry>>, (StatusCode, String)> {
    classify_all(&default_fabric_sizes()).map(Json)
}

fn app() -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/catalogue", get(catalogue))
        .route("/normalize", post(normalize_catalogue))
        .route("/calculate", post(calculate))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

fn main() {
    // Crash reporting is opt-in; the guard must outlive the runtime.
    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
        .block_on(serve());
}

async fn serve() {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    eprintln!("Listening on {addr}");
    axum::serve(listener, app()).await.unwrap();
}
