//! Grid HTTP API.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::ws::Message;
use axum::extract::ws::WebSocket;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::StatusCode;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use place_domain::Color;
use place_domain::GRID_SIZE;
use place_domain::GridError;
use std::net::SocketAddr;
use std::net::ToSocketAddrs;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::sync::watch;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::adapters::grid_dto::ErrorResponse;
use crate::adapters::grid_dto::GridResponse;
use crate::adapters::grid_dto::INVALID_COORDINATES;
use crate::adapters::grid_dto::INVALID_REQUEST;
use crate::adapters::grid_dto::PaintRequest;
use crate::adapters::grid_dto::PaintResponse;
use crate::adapters::grid_dto::StreamEvent;
use crate::app::daemon::usecase_container::GridUseCases;
use crate::infra::ServerConfig;
use crate::usecases::PaintInput;

mod error;
pub(crate) use error::ApiServerError;

const API_VERSION: &str = "1";
const API_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(200);
const UI_INDEX_HTML: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/web/index.html"
));
const UI_APP_JS: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/web/app.js"));
const UI_STYLES_CSS: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/web/styles.css"
));

pub(crate) struct ApiServerHandle {
    shutdown_tx: Option<watch::Sender<bool>>,
    join: Option<thread::JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl ApiServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn http_url(&self) -> String {
        format_http_url(&self.local_addr)
    }

    /// Blocks until the server thread exits (after the shutdown flag is raised).
    pub fn join(mut self) {
        let Some(join) = self.join.take() else {
            return;
        };
        if join.join().is_err() {
            error!("API server thread panicked");
        }
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(join) = self.join.take() {
            let (done_tx, done_rx) = std_mpsc::channel();
            let _ = thread::Builder::new()
                .name("api-shutdown".to_string())
                .spawn(move || {
                    let _ = join.join();
                    let _ = done_tx.send(());
                });
            if done_rx.recv_timeout(API_SHUTDOWN_TIMEOUT * 2).is_err() {
                warn!("API server did not stop within shutdown timeout");
            }
        }
    }
}

#[derive(Clone)]
struct ApiState {
    usecases: GridUseCases,
    server_version: &'static str,
    ws_limits: Arc<Semaphore>,
    shutdown_rx: watch::Receiver<bool>,
}

pub(crate) fn start_api_server(
    usecases: GridUseCases,
    shutdown_flag: Arc<AtomicBool>,
    config: &ServerConfig,
) -> Result<ApiServerHandle, ApiServerError> {
    let (listener, local_addr) = bind_listener(config)?;
    let http_url = format_http_url(&local_addr);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let state = Arc::new(ApiState {
        usecases,
        server_version: env!("PLACE_VERSION"),
        ws_limits: Arc::new(Semaphore::new(config.max_ws_connections())),
        shutdown_rx: shutdown_rx.clone(),
    });

    let shutdown_tx_for_thread = shutdown_tx.clone();

    let join = thread::Builder::new()
        .name("place-api".to_string())
        .spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .thread_name("place-api-worker")
                .enable_all()
                .build();
            let runtime = match runtime {
                Ok(rt) => rt,
                Err(err) => {
                    error!(error = %err, "Failed to build API runtime");
                    return;
                }
            };

            runtime.block_on(async move {
                let app = build_router(state);
                let listener = match TcpListener::from_std(listener) {
                    Ok(l) => l,
                    Err(err) => {
                        error!(error = %err, "Failed to create async listener");
                        return;
                    }
                };
                info!(url = %http_url, "API server listening");
                let mut shutdown_rx_server = shutdown_rx.clone();
                let mut shutdown_rx_wait = shutdown_rx.clone();
                let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                    let _ = shutdown_rx_server.changed().await;
                });
                let mut server_task = tokio::spawn(async move { server.await });

                let shutdown_task = tokio::spawn(async move {
                    while !shutdown_flag.load(Ordering::Relaxed) {
                        tokio::time::sleep(SHUTDOWN_POLL_INTERVAL).await;
                    }
                    let _ = shutdown_tx_for_thread.send(true);
                });

                tokio::select! {
                    join_result = &mut server_task => {
                        match join_result {
                            Ok(Err(err)) => error!(error = %err, "API server failed"),
                            Err(err) => error!(error = %err, "API server task failed"),
                            Ok(Ok(())) => {}
                        }
                    }
                    changed = shutdown_rx_wait.changed() => {
                        if changed.is_err() {
                            warn!("API shutdown channel closed");
                        }
                        match tokio::time::timeout(API_SHUTDOWN_TIMEOUT, &mut server_task).await {
                            Ok(Err(err)) => error!(error = %err, "API server task failed"),
                            Ok(Ok(_)) => {}
                            Err(_) => {
                                warn!(
                                    timeout_ms = API_SHUTDOWN_TIMEOUT.as_millis(),
                                    "API server shutdown timed out; aborting"
                                );
                                server_task.abort();
                            }
                        }
                    }
                }
                shutdown_task.abort();
                info!("API server stopped");
            });
        })
        .map_err(|e| ApiServerError::Io {
            operation: "spawn api thread",
            source: e,
        })?;

    Ok(ApiServerHandle {
        shutdown_tx: Some(shutdown_tx),
        join: Some(join),
        local_addr,
    })
}

fn build_router(state: Arc<ApiState>) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    axum::Router::new()
        .route("/", get(ui_index_handler))
        .route("/app.js", get(ui_app_js_handler))
        .route("/styles.css", get(ui_styles_handler))
        .route("/grid", get(grid_handler).post(paint_handler))
        .route("/api/grid", get(grid_handler).post(paint_handler))
        .route("/grid/stream", get(stream_handler))
        .layer(cors)
        .with_state(state)
}

async fn ui_index_handler() -> Response {
    Html(UI_INDEX_HTML).into_response()
}

async fn ui_app_js_handler() -> Response {
    (
        [("content-type", "application/javascript; charset=utf-8")],
        UI_APP_JS,
    )
        .into_response()
}

async fn ui_styles_handler() -> Response {
    ([("content-type", "text/css; charset=utf-8")], UI_STYLES_CSS).into_response()
}

async fn grid_handler(State(state): State<Arc<ApiState>>) -> Response {
    let snapshot = state.usecases.read_grid.execute();
    Json(GridResponse {
        grid: snapshot.grid,
    })
    .into_response()
}

/// Parses the body by hand so that any malformed input, whatever its
/// content type, maps to the same "Invalid request" answer.
async fn paint_handler(State(state): State<Arc<ApiState>>, body: Bytes) -> Response {
    let request = match PaintRequest::from_json_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            debug!(error = %err, body_len = body.len(), "Rejecting malformed paint request");
            return error_response(StatusCode::BAD_REQUEST, INVALID_REQUEST);
        }
    };

    let input = PaintInput {
        row: request.row,
        col: request.col,
        color: Color::new(request.color),
    };
    match state.usecases.paint_cell.execute(input) {
        Ok(snapshot) => Json(PaintResponse {
            success: true,
            grid: snapshot.grid,
        })
        .into_response(),
        Err(GridError::InvalidCoordinates { row, col }) => {
            debug!(row, col, "Rejecting out-of-range paint request");
            error_response(StatusCode::BAD_REQUEST, INVALID_COORDINATES)
        }
        Err(err) => {
            warn!(error = %err, "Unexpected grid error");
            error_response(StatusCode::BAD_REQUEST, INVALID_REQUEST)
        }
    }
}

async fn stream_handler(State(state): State<Arc<ApiState>>, ws: WebSocketUpgrade) -> Response {
    let permit = match state.ws_limits.clone().try_acquire_owned() {
        Ok(permit) => permit,
        Err(_) => return error_response(StatusCode::SERVICE_UNAVAILABLE, "too many connections"),
    };
    ws.on_upgrade(move |socket| async move {
        handle_stream(socket, state).await;
        drop(permit);
    })
    .into_response()
}

async fn handle_stream(mut socket: WebSocket, state: Arc<ApiState>) {
    let mut shutdown_rx = state.shutdown_rx.clone();
    if *shutdown_rx.borrow() {
        let _ = socket.send(Message::Close(None)).await;
        return;
    }

    let hello = StreamEvent::Hello {
        api_version: API_VERSION.to_string(),
        server_version: state.server_version.to_string(),
        size: GRID_SIZE,
    };
    if socket
        .send(Message::Text(serialize_event(&hello)))
        .await
        .is_err()
    {
        return;
    }

    // Subscribe before the first read so no write between the two is missed.
    let mut subscription = state.usecases.watch_grid.execute();
    let mut last_sent = None;

    loop {
        let snapshot = state.usecases.read_grid.execute();
        if last_sent.is_none_or(|sent| snapshot.revision > sent) {
            let event = StreamEvent::Grid {
                revision: snapshot.revision,
                grid: snapshot.grid,
            };
            if socket
                .send(Message::Text(serialize_event(&event)))
                .await
                .is_err()
            {
                break;
            }
            last_sent = Some(snapshot.revision);
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    warn!("API shutdown channel closed");
                }
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
            alive = subscription.changed() => {
                if !alive {
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
    debug!(last_revision = ?last_sent, "Grid stream closed");
}

fn serialize_event(event: &StreamEvent) -> String {
    serde_json::to_string(event).unwrap_or_else(|err| {
        error!(error = %err, "Failed to serialize stream event");
        "{\"event\":\"error\",\"message\":\"serialization failed\"}".to_string()
    })
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn bind_listener(
    config: &ServerConfig,
) -> Result<(std::net::TcpListener, SocketAddr), ApiServerError> {
    let mut addrs = config
        .listen()
        .to_socket_addrs()
        .map_err(|e| ApiServerError::InvalidListen {
            message: e.to_string(),
        })?;
    let addr = addrs.next().ok_or_else(|| ApiServerError::InvalidListen {
        message: "no resolved address".to_string(),
    })?;

    if !config.allow_remote() && !addr.ip().is_loopback() {
        return Err(ApiServerError::InvalidListen {
            message: format!(
                "refusing to bind non-loopback address {addr}; pass --allow-remote or set PLACE_ALLOW_REMOTE=1"
            ),
        });
    }

    let listener = std::net::TcpListener::bind(addr).map_err(|e| ApiServerError::Io {
        operation: "bind",
        source: e,
    })?;
    listener
        .set_nonblocking(true)
        .map_err(|e| ApiServerError::Io {
            operation: "set non-blocking",
            source: e,
        })?;
    let local_addr = listener.local_addr().map_err(|e| ApiServerError::Io {
        operation: "read local address",
        source: e,
    })?;
    Ok((listener, local_addr))
}

fn format_http_url(addr: &SocketAddr) -> String {
    let host = match addr.ip() {
        std::net::IpAddr::V4(ip) => ip.to_string(),
        std::net::IpAddr::V6(ip) => format!("[{ip}]"),
    };
    format!("http://{}:{}/", host, addr.port())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::GridClient;
    use crate::infra::GridStream;
    use crate::infra::InMemoryCanvas;
    use crate::infra::stream::StreamUpdate;
    use place_domain::CellCoord;
    use place_domain::Grid;
    use std::time::Instant;
    use serde_json::Value;
    use serde_json::json;

    struct TestApi {
        state: Arc<ApiState>,
        _shutdown_tx: watch::Sender<bool>,
    }

    impl TestApi {
        fn new() -> Self {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let state = Arc::new(ApiState {
                usecases: GridUseCases::new(Arc::new(InMemoryCanvas::new())),
                server_version: "test",
                ws_limits: Arc::new(Semaphore::new(1)),
                shutdown_rx,
            });
            Self {
                state,
                _shutdown_tx: shutdown_tx,
            }
        }

        async fn get(&self) -> (StatusCode, Value) {
            read_json(grid_handler(State(Arc::clone(&self.state))).await).await
        }

        async fn post(&self, body: impl Into<Bytes>) -> (StatusCode, Value) {
            read_json(paint_handler(State(Arc::clone(&self.state)), body.into()).await).await
        }

        async fn post_json(&self, body: Value) -> (StatusCode, Value) {
            self.post(serde_json::to_vec(&body).unwrap()).await
        }
    }

    async fn read_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn white_grid() -> Value {
        serde_json::to_value(Grid::new()).unwrap()
    }

    #[tokio::test]
    async fn test_get_fresh_grid_is_all_white() {
        let api = TestApi::new();
        let (status, body) = api.get().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "grid": white_grid() }));
    }

    #[tokio::test]
    async fn test_post_valid_write_returns_updated_grid() {
        let api = TestApi::new();
        let (status, body) = api
            .post_json(json!({"row": 3, "col": 7, "color": "#ffa500"}))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["grid"][3][7], "#ffa500");
        assert_eq!(body["grid"][7][3], "#ffffff");

        let (_, read) = api.get().await;
        assert_eq!(read["grid"], body["grid"]);
    }

    #[tokio::test]
    async fn test_post_last_write_wins() {
        let api = TestApi::new();
        api.post_json(json!({"row": 0, "col": 0, "color": "#ff0000"}))
            .await;
        api.post_json(json!({"row": 0, "col": 0, "color": "#00ff00"}))
            .await;
        let (_, body) = api.get().await;
        assert_eq!(body["grid"][0][0], "#00ff00");
    }

    #[tokio::test]
    async fn test_post_out_of_range_leaves_grid_unchanged() {
        let api = TestApi::new();
        let (status, _) = api
            .post_json(json!({"row": 9, "col": 9, "color": "#0000ff"}))
            .await;
        assert_eq!(status, StatusCode::OK);
        let (_, before) = api.get().await;

        for (row, col) in [(10, 0), (0, 10), (-1, 0), (0, -1)] {
            let (status, body) = api
                .post_json(json!({"row": row, "col": col, "color": "#0000ff"}))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({ "error": "Invalid coordinates" }));
        }

        let (_, after) = api.get().await;
        assert_eq!(after, before);
        assert_eq!(after["grid"][9][9], "#0000ff");
    }

    #[tokio::test]
    async fn test_post_malformed_body_is_invalid_request() {
        let api = TestApi::new();
        let bodies: Vec<Bytes> = vec![
            Bytes::new(),
            Bytes::from_static(b"not json"),
            Bytes::from_static(b"{\"row\": 1"),
            Bytes::from_static(b"{}"),
            Bytes::from_static(b"{\"row\": 1, \"col\": 1}"),
            Bytes::from_static(b"{\"row\": \"a\", \"col\": 1, \"color\": \"#000000\"}"),
        ];
        for body in bodies {
            let (status, json) = api.post(body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json, json!({ "error": "Invalid request" }));
        }

        let (_, after) = api.get().await;
        assert_eq!(after, json!({ "grid": white_grid() }));
        assert_eq!(api.state.usecases.read_grid.execute().revision, 0);
    }

    #[tokio::test]
    async fn test_post_non_object_body_is_invalid_request() {
        let api = TestApi::new();
        for body in [json!([3, 4, "#000000"]), json!("#000000"), json!(null), json!(7)] {
            let (status, json) = api.post_json(body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json, json!({ "error": "Invalid request" }));
        }
        let (status, json) = api
            .post_json(json!({"row": 3.5, "col": 4, "color": "#000000"}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({ "error": "Invalid request" }));

        assert_eq!(api.state.usecases.read_grid.execute().revision, 0);
    }

    #[tokio::test]
    async fn test_post_integral_out_of_range_numbers_are_invalid_coordinates() {
        let api = TestApi::new();
        let bodies = [
            Bytes::from_static(br##"{"row":10.0,"col":0,"color":"#000000"}"##),
            Bytes::from_static(br##"{"row":0,"col":100000000000000000000,"color":"#000000"}"##),
            Bytes::from_static(br##"{"row":-100000000000000000000,"col":0,"color":"#000000"}"##),
            Bytes::from_static(br##"{"row":18446744073709551615,"col":0,"color":"#000000"}"##),
            Bytes::from_static(br##"{"row":1e3,"col":0,"color":"#000000"}"##),
        ];
        for body in bodies {
            let (status, json) = api.post(body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json, json!({ "error": "Invalid coordinates" }));
        }
        assert_eq!(api.state.usecases.read_grid.execute().revision, 0);

        let (status, body) = api
            .post(Bytes::from_static(br##"{"row":2.0,"col":4,"color":"#000000"}"##))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["grid"][2][4], "#000000");
    }

    #[tokio::test]
    async fn test_post_accepts_arbitrary_color_strings() {
        let api = TestApi::new();
        let (status, body) = api
            .post_json(json!({"row": 5, "col": 5, "color": "rebeccapurple"}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["grid"][5][5], "rebeccapurple");
    }

    #[test]
    fn test_bind_refuses_remote_without_opt_in() {
        let config = ServerConfig::default()
            .with_listen("0.0.0.0:0")
            .with_allow_remote(false);
        let err = bind_listener(&config).unwrap_err();
        assert!(matches!(err, ApiServerError::InvalidListen { .. }));
    }

    #[test]
    fn test_format_http_url() {
        let v4: SocketAddr = "127.0.0.1:3000".parse().unwrap();
        let v6: SocketAddr = "[::1]:8080".parse().unwrap();
        assert_eq!(format_http_url(&v4), "http://127.0.0.1:3000/");
        assert_eq!(format_http_url(&v6), "http://[::1]:8080/");
    }

    #[test]
    fn test_live_server_roundtrip() {
        let config = ServerConfig::default().with_listen("127.0.0.1:0");
        let canvas = Arc::new(InMemoryCanvas::new());
        let handle = start_api_server(
            GridUseCases::new(Arc::clone(&canvas)),
            Arc::new(AtomicBool::new(false)),
            &config,
        )
        .unwrap();
        let base = handle.http_url();
        let client = reqwest::blocking::Client::new();

        let paint = client
            .post(format!("{base}grid"))
            .body(r##"{"row":9,"col":9,"color":"#0000ff"}"##)
            .send()
            .unwrap();
        assert_eq!(paint.status().as_u16(), 200);

        let rejected = client
            .post(format!("{base}api/grid"))
            .header("content-type", "application/json")
            .body(r##"{"row":10,"col":0,"color":"#0000ff"}"##)
            .send()
            .unwrap();
        assert_eq!(rejected.status().as_u16(), 400);
        let rejected: Value = rejected.json().unwrap();
        assert_eq!(rejected["error"], "Invalid coordinates");

        let read: Value = client
            .get(format!("{base}grid"))
            .send()
            .unwrap()
            .json()
            .unwrap();
        assert_eq!(read["grid"][9][9], "#0000ff");

        let page = client.get(base.clone()).send().unwrap().text().unwrap();
        assert!(page.contains("<html"));

        handle.shutdown();
    }

    fn next_grid(stream: &mut GridStream) -> (u64, Grid) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            match stream.poll().unwrap() {
                StreamUpdate::Grid { revision, grid } => return (revision, grid),
                StreamUpdate::Idle => {}
                StreamUpdate::Closed => panic!("stream closed before a grid frame"),
            }
        }
        panic!("no grid frame within 5s");
    }

    #[test]
    fn test_live_stream_pushes_writes_and_limits_connections() {
        let config = ServerConfig::default()
            .with_listen("127.0.0.1:0")
            .with_max_ws_connections(1);
        let handle = start_api_server(
            GridUseCases::new(Arc::new(InMemoryCanvas::new())),
            Arc::new(AtomicBool::new(false)),
            &config,
        )
        .unwrap();
        let server = url::Url::parse(&handle.http_url()).unwrap();
        let client = GridClient::new(&server).unwrap();

        let mut stream =
            GridStream::connect(client.stream_url(), Duration::from_millis(100)).unwrap();
        let (revision, grid) = next_grid(&mut stream);
        assert_eq!(revision, 0);
        assert_eq!(grid, Grid::new());

        client.paint(4, 6, &Color::new("#008000")).unwrap();
        let (revision, grid) = next_grid(&mut stream);
        assert_eq!(revision, 1);
        let cell = CellCoord::try_new(4, 6).unwrap();
        assert_eq!(grid.get(cell).as_str(), "#008000");

        let refused = GridStream::connect(client.stream_url(), Duration::from_millis(100))
            .err()
            .unwrap();
        assert!(refused.is_unavailable());
        assert!(refused.to_string().contains("503"), "{refused}");

        handle.shutdown();
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match stream.poll() {
                Ok(StreamUpdate::Closed) | Err(_) => break,
                Ok(StreamUpdate::Idle) => assert!(Instant::now() < deadline, "stream stayed open"),
                Ok(StreamUpdate::Grid { revision, .. }) => panic!("unexpected frame {revision}"),
            }
        }
    }
}
