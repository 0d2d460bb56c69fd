//! Line-delimited JSON request/response loop over stdio.
//!
//! Each input line is a request `{"id": 1, "method": "scanFolder", "params": {...}}`.
//! Each output line is either a response `{"id": 1, "result": {...}}` or a
//! progress event `{"event": "scan:progress", "data": {...}}`. Requests are
//! handled one at a time, so every progress event of a scan is written
//! before that scan's response.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::coordinator::{Coordinator, Response};
use crate::error::{DirscanError, Result};
use crate::scan::{ProgressSink, ScanProgress};

/// Name of the progress event.
pub const PROGRESS_EVENT: &str = "scan:progress";

/// An incoming request line.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Deserialize)]
struct PathParams {
    path: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChildrenParams {
    #[serde(default)]
    parent_id: Option<i64>,
}

/// One outgoing line.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Outgoing {
    Reply { id: Value, result: Value },
    Event { event: &'static str, data: ScanProgress },
}

impl Outgoing {
    fn reply<T: Serialize>(id: Value, response: &Response<T>) -> Self {
        let result = serde_json::to_value(response).unwrap_or_else(|e| {
            serde_json::json!({ "success": false, "message": e.to_string() })
        });
        Self::Reply { id, result }
    }
}

/// Forwards scan progress as events on the outgoing channel.
struct EventForwarder {
    tx: mpsc::UnboundedSender<Outgoing>,
}

impl ProgressSink for EventForwarder {
    fn on_progress(&mut self, progress: ScanProgress) {
        let _ = self.tx.send(Outgoing::Event {
            event: PROGRESS_EVENT,
            data: progress,
        });
    }
}

/// Serve requests from stdin until EOF.
pub async fn run_stdio(config: Config) -> Result<()> {
    let coordinator = Coordinator::open(config)?;
    tracing::info!("serving requests on stdio");
    serve(coordinator, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serve requests from `input`, writing responses and events to `output`.
pub async fn serve<R, W>(coordinator: Coordinator, input: R, output: W) -> Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let coordinator = Arc::new(Mutex::new(coordinator));
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_lines(out_rx, output));

    let mut lines = BufReader::new(input).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle(&coordinator, request, &out_tx).await,
            Err(e) => {
                tracing::warn!(error = %e, "malformed request");
                Outgoing::reply(
                    Value::Null,
                    &Response::<()>::failure(format!("malformed request: {e}")),
                )
            }
        };
        if out_tx.send(reply).is_err() {
            break;
        }
    }

    drop(out_tx);
    writer
        .await
        .map_err(|e| DirscanError::Other(format!("writer task failed: {e}")))??;
    Ok(())
}

async fn write_lines<W>(mut rx: mpsc::UnboundedReceiver<Outgoing>, mut output: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        let mut line = serde_json::to_string(&message)?;
        line.push('\n');
        output.write_all(line.as_bytes()).await?;
        output.flush().await?;
    }
    Ok(())
}

async fn handle(
    coordinator: &Arc<Mutex<Coordinator>>,
    request: Request,
    out_tx: &mpsc::UnboundedSender<Outgoing>,
) -> Outgoing {
    let id = request.id.clone();
    match request.method.as_str() {
        "scanFolder" => {
            let params: PathParams = match serde_json::from_value(request.params) {
                Ok(p) => p,
                Err(e) => return invalid_params(id, &e),
            };
            let coordinator = Arc::clone(coordinator);
            let mut forwarder = EventForwarder { tx: out_tx.clone() };
            let joined = tokio::task::spawn_blocking(move || match coordinator.lock() {
                Ok(c) => c.scan_folder(&params.path, &mut forwarder),
                Err(_) => Response::failure("coordinator lock poisoned"),
            })
            .await;
            match joined {
                Ok(response) => Outgoing::reply(id, &response),
                Err(e) => Outgoing::reply(id, &Response::<()>::failure(e)),
            }
        }
        "getHierarchy" => with_coordinator(coordinator, id, Coordinator::get_hierarchy),
        "getChildren" => {
            let params: ChildrenParams = if request.params.is_null() {
                ChildrenParams::default()
            } else {
                match serde_json::from_value(request.params) {
                    Ok(p) => p,
                    Err(e) => return invalid_params(id, &e),
                }
            };
            with_coordinator(coordinator, id, |c| c.get_children(params.parent_id))
        }
        "findByPath" => {
            let params: PathParams = match serde_json::from_value(request.params) {
                Ok(p) => p,
                Err(e) => return invalid_params(id, &e),
            };
            with_coordinator(coordinator, id, |c| c.find_by_path(&params.path))
        }
        "getState" => with_coordinator(coordinator, id, Coordinator::get_app_state),
        "clearState" => with_coordinator(coordinator, id, Coordinator::clear_app_state),
        other => Outgoing::reply(
            id,
            &Response::<()>::failure(format!("unknown method: {other}")),
        ),
    }
}

fn with_coordinator<T, F>(coordinator: &Arc<Mutex<Coordinator>>, id: Value, op: F) -> Outgoing
where
    T: Serialize,
    F: FnOnce(&Coordinator) -> Response<T>,
{
    match coordinator.lock() {
        Ok(c) => Outgoing::reply(id, &op(&*c)),
        Err(_) => Outgoing::reply(id, &Response::<()>::failure("coordinator lock poisoned")),
    }
}

fn invalid_params(id: Value, err: &serde_json::Error) -> Outgoing {
    Outgoing::reply(id, &Response::<()>::failure(format!("invalid params: {err}")))
}
