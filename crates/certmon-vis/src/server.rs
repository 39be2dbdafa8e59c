//! Axum web server for the round dashboard and vote route views.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use certmon_route::GraphStyle;
use certmon_telemetry::stats::{self, AuthDistribution, AuthenticatorHistory, RelayAuthMatrix, RoundRelay};
use certmon_telemetry::{
    resolve_route, MemoryStore, RoundInfo, RouteRequest, RouteView, StoreCounts, TelemetryError,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::config::VisConfig;
use crate::error::Result;

/// Shared application state.
pub struct AppState {
    store: RwLock<MemoryStore>,
    telemetry_path: Option<PathBuf>,
}

/// Dashboard server.
pub struct VisServer {
    state: Arc<AppState>,
}

impl VisServer {
    /// Create a server over an already loaded store.
    ///
    /// `telemetry_path` is where `POST /api/reload` reads from.
    pub fn new(store: MemoryStore, telemetry_path: Option<PathBuf>) -> Self {
        Self {
            state: Arc::new(AppState {
                store: RwLock::new(store),
                telemetry_path,
            }),
        }
    }

    /// Create a server from config, loading the telemetry document if one is set.
    pub fn from_config(config: &VisConfig) -> Result<Self> {
        let store = match &config.telemetry_path {
            Some(path) => MemoryStore::from_json_file(path)?,
            None => {
                warn!("no telemetry document configured, serving an empty store");
                MemoryStore::new()
            }
        };
        Ok(Self::new(store, config.telemetry_path.clone()))
    }

    /// Build the router for the server.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(index_handler))
            // Dashboard
            .route("/api/status", get(status_handler))
            .route("/api/rounds", get(rounds_handler))
            .route("/api/rounds/{round}/authenticators", get(round_authenticators_handler))
            .route("/api/rounds/{round}/relays", get(round_relays_handler))
            .route("/api/rounds/{round}/matrix", get(round_matrix_handler))
            .route("/api/authenticators/{auth}", get(authenticator_handler))
            // Vote routes
            .route("/api/route", get(route_handler))
            .route("/api/reload", post(reload_handler))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server on the given address.
    pub async fn serve(self, addr: SocketAddr) -> std::result::Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Dashboard running on http://{}", addr);
        axum::serve(listener, self.router()).await
    }
}

async fn index_handler() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

fn internal(err: TelemetryError) -> StatusCode {
    warn!(error = %err, "telemetry query failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

// --- Status ---

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    telemetry_path: Option<String>,
    counts: StoreCounts,
}

impl StatusResponse {
    fn ok(state: &AppState, counts: StoreCounts) -> Self {
        Self {
            status: "ok",
            telemetry_path: state.telemetry_path.as_ref().map(|p| p.display().to_string()),
            counts,
        }
    }
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let counts = state.store.read().await.counts();
    Json(StatusResponse::ok(&state, counts))
}

async fn reload_handler(
    State(state): State<Arc<AppState>>,
) -> std::result::Result<Json<StatusResponse>, StatusCode> {
    let Some(path) = state.telemetry_path.clone() else {
        warn!("reload requested without a telemetry document");
        return Err(StatusCode::CONFLICT);
    };

    let fresh = tokio::task::spawn_blocking(move || MemoryStore::from_json_file(path))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .map_err(internal)?;

    let counts = fresh.counts();
    *state.store.write().await = fresh;
    Ok(Json(StatusResponse::ok(&state, counts)))
}

// --- Rounds ---

async fn rounds_handler(
    State(state): State<Arc<AppState>>,
) -> std::result::Result<Json<Vec<RoundInfo>>, StatusCode> {
    let store = state.store.read().await;
    stats::recent_rounds(&*store, stats::DASHBOARD_ROUNDS)
        .map(Json)
        .map_err(internal)
}

async fn round_authenticators_handler(
    State(state): State<Arc<AppState>>,
    Path(round): Path<u64>,
) -> std::result::Result<Json<Vec<AuthDistribution>>, StatusCode> {
    let store = state.store.read().await;
    stats::round_authenticators(&*store, round)
        .map(Json)
        .map_err(internal)
}

async fn round_relays_handler(
    State(state): State<Arc<AppState>>,
    Path(round): Path<u64>,
) -> std::result::Result<Json<Vec<RoundRelay>>, StatusCode> {
    let store = state.store.read().await;
    stats::round_relay_listing(&*store, round)
        .map(Json)
        .map_err(internal)
}

async fn round_matrix_handler(
    State(state): State<Arc<AppState>>,
    Path(round): Path<u64>,
) -> std::result::Result<Json<RelayAuthMatrix>, StatusCode> {
    let store = state.store.read().await;
    stats::round_matrix(&*store, round).map(Json).map_err(internal)
}

async fn authenticator_handler(
    State(state): State<Arc<AppState>>,
    Path(auth): Path<String>,
) -> std::result::Result<Json<AuthenticatorHistory>, StatusCode> {
    let store = state.store.read().await;
    stats::authenticator_history(&*store, &auth)
        .map(Json)
        .map_err(internal)
}

// --- Vote route ---

/// Query string of `GET /api/route`.
#[derive(Debug, Default, Deserialize)]
struct RouteParams {
    round: Option<String>,
    auth: Option<String>,
    sourcehost: Option<String>,
    graphstyle: Option<String>,
}

impl RouteParams {
    fn into_request(self) -> std::result::Result<RouteRequest, String> {
        let round = self.round.ok_or_else(|| "missing round".to_string())?;
        let round: u64 = round
            .trim()
            .parse()
            .map_err(|_| format!("invalid round: {round}"))?;
        let style: GraphStyle = self
            .graphstyle
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(|e: certmon_route::RouteError| e.to_string())?;

        let mut request = RouteRequest::new(round).style(style);
        if let Some(auth) = self.auth {
            request = request.auth(auth);
        }
        if let Some(host) = self.sourcehost.as_deref() {
            request = request.source_host(host);
        }
        Ok(request)
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum RouteResponse {
    Ok { route: RouteView },
    NoData { reason: String },
}

async fn route_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RouteParams>,
) -> std::result::Result<Json<RouteResponse>, (StatusCode, String)> {
    let request = params
        .into_request()
        .map_err(|reason| (StatusCode::BAD_REQUEST, reason))?;

    let store = state.store.read().await;
    match resolve_route(&*store, &request) {
        Ok(route) => Ok(Json(RouteResponse::Ok { route })),
        Err(err) if err.is_no_data() => Ok(Json(RouteResponse::NoData {
            reason: err.to_string(),
        })),
        Err(err) => Err((internal(err), "telemetry query failed".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certmon_route::{ConnectionEdge, Projection};
    use certmon_telemetry::{AuthenticatorSighting, Vote};
    use std::io::Write;

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.push_vote(Vote {
            sender_telemetry_id: "tel-v1".into(),
            sender: "AUTH".into(),
            round: 12,
            step: 2,
            timestamp: 10_000,
            ..Vote::default()
        });
        store.push_connection(9_900, ConnectionEdge::new("v1", "r1"));
        store.push_relay_connection(9_950, ConnectionEdge::new("r1", "r2").with_relays("r1", "r2"));
        store.push_sighting(AuthenticatorSighting::new("r2", 12, "AUTH"));
        store.push_sighting(AuthenticatorSighting::new("r1", 12, "OTHER"));
        store
    }

    fn state() -> Arc<AppState> {
        VisServer::new(store(), None).state
    }

    fn params(round: &str) -> RouteParams {
        RouteParams {
            round: Some(round.to_string()),
            ..RouteParams::default()
        }
    }

    #[test]
    fn router_builds() {
        let _router = VisServer::new(MemoryStore::new(), None).router();
    }

    #[tokio::test]
    async fn status_reports_counts() {
        let Json(status) = status_handler(State(state())).await;
        assert_eq!(status.status, "ok");
        assert_eq!(status.counts.votes, 1);
        assert_eq!(status.counts.sightings, 2);
        assert!(status.telemetry_path.is_none());
    }

    #[tokio::test]
    async fn round_views_come_from_sightings() {
        let Json(rounds) = rounds_handler(State(state())).await.unwrap();
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].relay_count, 2);

        let Json(auths) = round_authenticators_handler(State(state()), Path(12)).await.unwrap();
        assert_eq!(auths.len(), 2);
        assert_eq!(auths[0].dist, 0.5);

        let Json(relays) = round_relays_handler(State(state()), Path(12)).await.unwrap();
        assert_eq!(relays.len(), 2);

        let Json(matrix) = round_matrix_handler(State(state()), Path(12)).await.unwrap();
        assert_eq!(matrix.relays, vec!["r1", "r2"]);

        let Json(history) = authenticator_handler(State(state()), Path("AUTH".to_string()))
            .await
            .unwrap();
        assert_eq!(history.rounds.len(), 1);
    }

    #[tokio::test]
    async fn route_resolves_requested_style() {
        let request = RouteParams {
            auth: Some("AUTH".into()),
            sourcehost: Some("v1:r1".into()),
            graphstyle: Some("1".into()),
            ..params("12")
        };
        let Json(response) = route_handler(State(state()), Query(request)).await.unwrap();
        let RouteResponse::Ok { route } = response else {
            panic!("expected a route");
        };
        let Projection::Flow(edges) = route.projection else {
            panic!("expected flow projection");
        };
        assert_eq!(edges.len(), 2);
    }

    #[tokio::test]
    async fn unknown_round_is_no_data() {
        let Json(response) = route_handler(State(state()), Query(params("99"))).await.unwrap();
        assert!(matches!(response, RouteResponse::NoData { .. }));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "no_data");
    }

    #[tokio::test]
    async fn bad_parameters_are_rejected() {
        let (status, _) = route_handler(State(state()), Query(params("twelve")))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = route_handler(State(state()), Query(RouteParams::default()))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let bad_style = RouteParams {
            graphstyle: Some("pie".into()),
            ..params("12")
        };
        let (status, _) = route_handler(State(state()), Query(bad_style)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reload_reads_document_again() {
        let status = reload_handler(State(state())).await.unwrap_err();
        assert_eq!(status, StatusCode::CONFLICT);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"authenticators": [{{"relay": "r9", "round": 1, "auth": "Z"}}]}}"#).unwrap();

        let server = VisServer::new(store(), Some(file.path().to_path_buf()));
        let Json(status) = reload_handler(State(server.state.clone())).await.unwrap();
        assert_eq!(status.counts.sightings, 1);
        assert_eq!(status.counts.votes, 0);
        assert_eq!(server.state.store.read().await.counts().sightings, 1);
    }
}
