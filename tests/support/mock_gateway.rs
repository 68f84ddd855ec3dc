use std::convert::Infallible;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use anyhow::{Context, Result};
use hyper::service::{make_service_fn, service_fn};
use hyper::{body, Body, Method, Request, Response, Server, StatusCode};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// One request as the storage node saw it.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub body: Vec<u8>,
}

/// How the node answers `POST /upload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayBehavior {
    Accept,
    /// Reject the first `n` uploads with 503, then accept.
    RejectFirst(usize),
    EmptyReceipt,
}

#[derive(Clone)]
struct GatewayState {
    behavior: GatewayBehavior,
    requests: Arc<AtomicUsize>,
    stored: Arc<Mutex<Vec<StoredUpload>>>,
}

pub struct MockGatewayServer {
    url: String,
    requests: Arc<AtomicUsize>,
    stored: Arc<Mutex<Vec<StoredUpload>>>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MockGatewayServer {
    pub async fn start(behavior: GatewayBehavior) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind mock gateway listener")?;
        let addr = listener
            .local_addr()
            .context("failed to read mock listener address")?;
        let std_listener = listener
            .into_std()
            .context("failed to convert mock listener")?;
        std_listener
            .set_nonblocking(true)
            .context("failed to set mock listener non-blocking")?;

        let state = GatewayState {
            behavior,
            requests: Arc::new(AtomicUsize::new(0)),
            stored: Arc::new(Mutex::new(Vec::new())),
        };
        let requests = state.requests.clone();
        let stored = state.stored.clone();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let make_service = make_service_fn(move |_| {
            let state = state.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req| serve_upload(state.clone(), req)))
            }
        });

        let server = Server::from_tcp(std_listener)
            .context("failed to build mock HTTP server")?
            .serve(make_service);
        let graceful = server.with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });

        let handle = tokio::spawn(async move {
            if let Err(err) = graceful.await {
                eprintln!("mock gateway stopped: {err}");
            }
        });

        Ok(Self {
            url: format!("http://{}", addr),
            requests,
            stored,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn upload_url(&self) -> String {
        format!("{}/upload", self.url)
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Vec<StoredUpload> {
        self.stored.lock().expect("mock gateway poisoned").clone()
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

async fn serve_upload(
    state: GatewayState,
    req: Request<Body>,
) -> Result<Response<Body>, Infallible> {
    if req.method() != Method::POST || req.uri().path() != "/upload" {
        return Ok(status(StatusCode::NOT_FOUND, "no such route"));
    }

    let seen = state.requests.fetch_add(1, Ordering::SeqCst) + 1;
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    };
    let content_type = header("content-type");
    let file_name = header("x-file-name");

    let bytes = match body::to_bytes(req.into_body()).await {
        Ok(bytes) => bytes,
        Err(err) => {
            return Ok(status(
                StatusCode::BAD_REQUEST,
                &format!("failed to read body: {err}"),
            ))
        }
    };

    match state.behavior {
        GatewayBehavior::RejectFirst(limit) if seen <= limit => {
            return Ok(status(StatusCode::SERVICE_UNAVAILABLE, "node is syncing"));
        }
        GatewayBehavior::EmptyReceipt => {
            return Ok(json_response(json!({ "id": "" })));
        }
        _ => {}
    }

    let mut stored = state.stored.lock().expect("mock gateway poisoned");
    stored.push(StoredUpload {
        content_type,
        file_name,
        body: bytes.to_vec(),
    });
    let id = format!("content-{}", stored.len());
    Ok(json_response(json!({ "id": id, "timestamp": 0 })))
}

fn status(code: StatusCode, message: &str) -> Response<Body> {
    let mut response = Response::new(Body::from(message.to_owned()));
    *response.status_mut() = code;
    response
}

fn json_response(value: serde_json::Value) -> Response<Body> {
    let mut response = Response::new(Body::from(value.to_string()));
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    response
}
