// src/server/reload.rs

//! Live reload: a small client script, the WebSocket that feeds it, and the
//! middleware that injects the script into served HTML.

use axum::body::{Body, to_bytes};
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::Request;
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::notifier::NotificationEvent;
use crate::server::{CLIENT_PATH, ServerState, WS_PATH};

const CLIENT_SCRIPT: &str = r#"(function () {
  var url = (location.protocol === "https:" ? "wss://" : "ws://") + location.host + "__WS_PATH__";
  function show(text) {
    var el = document.getElementById("__sitepipe_notify");
    if (!el) {
      el = document.createElement("div");
      el.id = "__sitepipe_notify";
      el.style.cssText = "position:fixed;top:0;right:0;z-index:9999;padding:12px 18px;" +
        "font:14px sans-serif;color:#fff;background:rgba(0,0,0,.75);border-bottom-left-radius:5px";
      document.body.appendChild(el);
    }
    el.textContent = text;
    el.style.display = "block";
    clearTimeout(el._hide);
    el._hide = setTimeout(function () { el.style.display = "none"; }, 2000);
  }
  function connect() {
    var ws = new WebSocket(url);
    ws.onmessage = function (ev) {
      if (ev.data === "reload") {
        location.reload();
      } else if (ev.data.indexOf("message:") === 0) {
        show(ev.data.slice(8));
      }
    };
    ws.onclose = function () { setTimeout(connect, 1000); };
  }
  connect();
})();
"#;

pub(crate) async fn client_script() -> Response {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        CLIENT_SCRIPT.replace("__WS_PATH__", WS_PATH),
    )
        .into_response()
}

pub(crate) async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    let events = state.notifier.subscribe();
    ws.on_upgrade(move |socket| forward_events(socket, events))
}

async fn forward_events(mut socket: WebSocket, mut events: broadcast::Receiver<NotificationEvent>) {
    debug!("live reload client connected");

    loop {
        match events.recv().await {
            Ok(event) => {
                if socket.send(Message::Text(event.to_wire().into())).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "live reload client lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    debug!("live reload client disconnected");
}

/// Insert the client `<script>` tag before the last `</body>`, or append it
/// when the document has none.
pub fn inject_script(html: &str) -> String {
    let tag = format!(r#"<script src="{CLIENT_PATH}"></script>"#);

    match html.to_ascii_lowercase().rfind("</body>") {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..at]);
            out.push_str(&tag);
            out.push_str(&html[at..]);
            out
        }
        None => format!("{html}{tag}"),
    }
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"))
}

pub(crate) async fn inject_reload_client(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if !response.status().is_success() || !is_html(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "failed to buffer HTML response");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let body = match std::str::from_utf8(&bytes) {
        Ok(html) => Body::from(inject_script(html)),
        Err(_) => Body::from(bytes),
    };

    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, body)
}
