//! Line-delimited JSON-RPC server over an async reader/writer pair.

use seek_core::{Classify, ErrorKind, embed::Embedder, repository::KnowledgeRepository};
use seek_service::{
  KnowledgeService, ServiceError, ingest::IngestRequest, search::SearchRequest,
  update::UpdateRequest,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, AsyncWrite, AsyncWriteExt as _};
use tracing::{debug, info, warn};

use crate::{
  protocol::{self, Incoming, JSONRPC_VERSION, Response, RpcError, ToolCall},
  tools::{self, Tool},
};

/// Serves the knowledge tools to one client.
pub struct McpServer<R, E> {
  service: KnowledgeService<R, E>,
}

impl<R, E> McpServer<R, E>
where
  R: KnowledgeRepository,
  E: Embedder,
{
  pub fn new(service: KnowledgeService<R, E>) -> Self { Self { service } }

  /// Answer requests from `input` until it reaches EOF.
  ///
  /// Requests are handled one at a time, in order; each response is written
  /// as a single line and flushed.
  pub async fn run<I, O>(&self, input: I, mut output: O) -> std::io::Result<()>
  where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
  {
    info!("server started, waiting for requests");
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
      let Some(response) = self.handle_line(&line).await else {
        continue;
      };
      let mut buf = serde_json::to_vec(&response)?;
      buf.push(b'\n');
      output.write_all(&buf).await?;
      output.flush().await?;
    }
    info!("input closed, shutting down");
    Ok(())
  }

  /// Handle one line of input. Blank lines and notifications produce no
  /// response.
  pub async fn handle_line(&self, line: &str) -> Option<Response> {
    let line = line.trim();
    if line.is_empty() {
      return None;
    }

    let value: Value = match serde_json::from_str(line) {
      Ok(v) => v,
      Err(e) => {
        warn!(error = %e, "unparseable request");
        return Some(Response::failure(
          Value::Null,
          RpcError::new(RpcError::PARSE_ERROR, "Parse error").with_data(json!(e.to_string())),
        ));
      }
    };

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let incoming: Incoming = match serde_json::from_value(value) {
      Ok(m) => m,
      Err(e) => {
        return Some(Response::failure(
          id,
          RpcError::new(RpcError::INVALID_REQUEST, format!("Invalid Request: {e}")),
        ));
      }
    };

    match (incoming.method, incoming.id) {
      (Some(method), Some(id)) => {
        if incoming.jsonrpc.as_deref().is_some_and(|v| v != JSONRPC_VERSION) {
          return Some(Response::failure(
            id,
            RpcError::new(RpcError::INVALID_REQUEST, "Invalid Request: jsonrpc must be \"2.0\""),
          ));
        }
        debug!(method = %method, "request received");
        Some(match self.dispatch(&method, incoming.params).await {
          Ok(result) => Response::success(id, result),
          Err(error) => Response::failure(id, error),
        })
      }
      (Some(method), None) => {
        debug!(method = %method, "notification received");
        None
      }
      (None, id) => Some(Response::failure(
        id.unwrap_or(Value::Null),
        RpcError::new(RpcError::INVALID_REQUEST, "Invalid Request: missing method"),
      )),
    }
  }

  async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, RpcError> {
    match method {
      "initialize" => {
        info!("client initialised");
        Ok(protocol::initialize_result())
      }
      "ping" => Ok(json!({})),
      "tools/list" => Ok(tools::list()),
      "tools/call" => self.call_tool(params).await,
      other => Err(RpcError::new(
        RpcError::METHOD_NOT_FOUND,
        format!("method not found: {other}"),
      )),
    }
  }

  async fn call_tool(&self, params: Option<Value>) -> Result<Value, RpcError> {
    let call: ToolCall = serde_json::from_value(params.unwrap_or(Value::Null)).map_err(|e| {
      RpcError::new(RpcError::INVALID_PARAMS, format!("invalid tools/call params: {e}"))
    })?;
    let tool = Tool::from_name(&call.name).ok_or_else(|| {
      RpcError::new(RpcError::METHOD_NOT_FOUND, format!("tool not found: {}", call.name))
    })?;
    info!(tool = tool.name(), "tool call");

    let result = match tool {
      Tool::Ingest => {
        let req: IngestRequest = arguments(tool, call.arguments)?;
        self.service.ingest(req).await.map(tool_output)
      }
      Tool::Update => {
        let req: UpdateRequest = arguments(tool, call.arguments)?;
        self.service.update(req).await.map(tool_output)
      }
      Tool::Search => {
        let req: SearchRequest = arguments(tool, call.arguments)?;
        self.service.search(req).await.map(tool_output)
      }
    };

    match result {
      Ok(output) => output,
      Err(err) => {
        warn!(tool = tool.name(), kind = ?err.kind(), error = %err, "tool call failed");
        Err(service_error(&err))
      }
    }
  }
}

/// Deserialize tool arguments; absent arguments are treated as `{}` so the
/// missing-field message names the field.
fn arguments<T: DeserializeOwned>(tool: Tool, args: Option<Value>) -> Result<T, RpcError> {
  let args = match args {
    None | Some(Value::Null) => Value::Object(Default::default()),
    Some(v) => v,
  };
  serde_json::from_value(args).map_err(|e| {
    RpcError::new(
      RpcError::INVALID_PARAMS,
      format!("invalid arguments for {}: {e}", tool.name()),
    )
  })
}

fn tool_output<T: Serialize>(output: T) -> Result<Value, RpcError> {
  serde_json::to_string_pretty(&output)
    .map(protocol::text_content)
    .map_err(|e| RpcError::new(RpcError::INTERNAL_ERROR, e.to_string()))
}

/// Map a service failure onto its JSON-RPC error code. `data.kind` carries
/// the taxonomy name.
pub fn service_error(err: &ServiceError) -> RpcError {
  let kind = err.kind();
  let code = match kind {
    ErrorKind::InvalidInput => RpcError::INVALID_PARAMS,
    ErrorKind::AlreadyExists => RpcError::ALREADY_EXISTS,
    ErrorKind::NotFound => RpcError::NOT_FOUND,
    ErrorKind::ConcurrentUpdateConflict => RpcError::CONFLICT,
    ErrorKind::StorageUnavailable => RpcError::STORAGE_UNAVAILABLE,
    ErrorKind::EmbeddingFailed => RpcError::EMBEDDING_FAILED,
  };
  RpcError::new(code, err.to_string()).with_data(json!({ "kind": kind }))
}
