//! Editor session served over a websocket.
//!
//! One external editor connects, receives `graph_load` with the current
//! graph, and sends `graph_update` whenever the user edits. Disconnecting
//! ends the session.

use std::net::{SocketAddr, TcpListener, TcpStream};

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use tungstenite::{Error as WsError, Message, WebSocket, accept};

use super::session::{EditorSession, SessionEvent};
use crate::protocol::{ErrorPayload, GRAPH_LOAD, GRAPH_UPDATE, GraphPayload, WSMessage};

pub struct WsEditorSession {
    listener: TcpListener,
    material: Option<String>,
    graph: String,
    client: Option<WebSocket<TcpStream>>,
}

impl WsEditorSession {
    pub fn bind(addr: &str, material: Option<String>) -> Result<Self> {
        let listener =
            TcpListener::bind(addr).with_context(|| format!("failed to bind editor at {addr}"))?;
        listener
            .set_nonblocking(true)
            .context("failed to set listener non-blocking")?;
        Ok(Self {
            listener,
            material,
            graph: String::new(),
            client: None,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().context("listener has no address")
    }

    fn try_accept(&mut self) -> Result<()> {
        let stream = match self.listener.accept() {
            Ok((s, peer)) => {
                log::info!("[editor] client connected from {peer}");
                s
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(()),
            Err(e) => return Err(e).context("accept failed"),
        };
        // Handshake is easier with a blocking socket, switch to non-blocking afterwards.
        stream
            .set_nonblocking(false)
            .context("failed to set tcp blocking")?;
        let ws = accept(stream).map_err(|e| anyhow!("websocket handshake failed: {e}"))?;
        ws.get_ref()
            .set_nonblocking(true)
            .context("failed to set tcp non-blocking")?;
        self.client = Some(ws);
        self.send_graph()
    }

    fn send_graph(&mut self) -> Result<()> {
        let Some(ws) = self.client.as_mut() else {
            return Ok(());
        };
        let msg = WSMessage::new(
            GRAPH_LOAD,
            None,
            Some(GraphPayload {
                graph: self.graph.clone(),
                material: self.material.clone(),
            }),
        );
        ws.send(Message::Text(serde_json::to_string(&msg)?))
            .context("failed to send graph_load")
    }

    fn handle_text(ws: &mut WebSocket<TcpStream>, text: &str) -> Option<String> {
        let msg: WSMessage<Value> = match serde_json::from_str(text) {
            Ok(m) => m,
            Err(e) => {
                send_error(ws, None, "PARSE_ERROR", &format!("invalid json: {e}"));
                return None;
            }
        };
        match msg.msg_type.as_str() {
            GRAPH_UPDATE => {
                let payload = msg
                    .payload
                    .map(serde_json::from_value::<GraphPayload>)
                    .transpose();
                match payload {
                    Ok(Some(p)) => Some(p.graph),
                    Ok(None) => {
                        send_error(ws, msg.request_id, "PARSE_ERROR", "missing payload");
                        None
                    }
                    Err(e) => {
                        let message = format!("invalid graph payload: {e}");
                        send_error(ws, msg.request_id, "PARSE_ERROR", &message);
                        None
                    }
                }
            }
            "ping" => {
                let pong = WSMessage::<Value>::new("pong", msg.request_id, None);
                if let Ok(text) = serde_json::to_string(&pong) {
                    let _ = ws.send(Message::Text(text));
                }
                None
            }
            "pong" | "heartbeat" => None,
            other => {
                send_error(
                    ws,
                    msg.request_id,
                    "PARSE_ERROR",
                    &format!("unknown message type: {other}"),
                );
                None
            }
        }
    }
}

impl EditorSession for WsEditorSession {
    fn open(&mut self, graph: &str) -> Result<()> {
        self.graph = graph.to_string();
        log::info!(
            "[editor] waiting for editor on ws://{}",
            self.local_addr()?
        );
        Ok(())
    }

    fn load_graph(&mut self, graph: &str) -> Result<()> {
        self.graph = graph.to_string();
        self.send_graph()
    }

    fn poll(&mut self) -> Result<SessionEvent> {
        if self.client.is_none() {
            self.try_accept()?;
            return Ok(SessionEvent::Idle);
        }
        let Some(ws) = self.client.as_mut() else {
            return Ok(SessionEvent::Idle);
        };

        let mut latest = None;
        loop {
            match ws.read() {
                Ok(Message::Text(text)) => {
                    if let Some(graph) = Self::handle_text(ws, &text) {
                        latest = Some(graph);
                    }
                }
                Ok(Message::Ping(payload)) => {
                    let _ = ws.send(Message::Pong(payload));
                }
                // Hand over a pending edit first; the next read reports the closed connection.
                Ok(Message::Close(_)) if latest.is_some() => break,
                Ok(Message::Close(_)) => return Ok(SessionEvent::Closed),
                Ok(_) => {}
                Err(WsError::Io(ref io)) if io.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(WsError::AlreadyClosed) | Err(WsError::ConnectionClosed) => {
                    return Ok(SessionEvent::Closed);
                }
                Err(e) => return Err(e).context("websocket read failed"),
            }
        }

        Ok(match latest {
            Some(graph) => {
                self.graph = graph.clone();
                SessionEvent::Edited(graph)
            }
            None => SessionEvent::Idle,
        })
    }

    fn close(&mut self) {
        if let Some(mut ws) = self.client.take() {
            let _ = ws.close(None);
            let _ = ws.flush();
        }
    }
}

fn send_error(ws: &mut WebSocket<TcpStream>, request_id: Option<String>, code: &str, message: &str) {
    let err = WSMessage::new(
        "error",
        request_id,
        Some(ErrorPayload {
            code: code.to_string(),
            message: message.to_string(),
        }),
    );
    if let Ok(text) = serde_json::to_string(&err) {
        let _ = ws.send(Message::Text(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{thread, time::Duration};

    fn poll_until(session: &mut WsEditorSession, want: impl Fn(&SessionEvent) -> bool) -> SessionEvent {
        for _ in 0..500 {
            let ev = session.poll().unwrap();
            if want(&ev) {
                return ev;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("session never produced the expected event");
    }

    #[test]
    fn client_receives_graph_and_sends_edits() {
        let mut session = WsEditorSession::bind("127.0.0.1:0", Some("mat".into())).unwrap();
        let addr = session.local_addr().unwrap();
        session.open("nfgraph 1\n").unwrap();

        let client = thread::spawn(move || {
            let (mut ws, _) = tungstenite::connect(format!("ws://{addr}")).unwrap();
            let Message::Text(text) = ws.read().unwrap() else {
                panic!("expected text");
            };
            let load: WSMessage<GraphPayload> = serde_json::from_str(&text).unwrap();
            assert_eq!(load.msg_type, GRAPH_LOAD);
            let payload = load.payload.unwrap();
            assert_eq!(payload.graph, "nfgraph 1\n");
            assert_eq!(payload.material.as_deref(), Some("mat"));

            let update = WSMessage::new(
                GRAPH_UPDATE,
                None,
                Some(GraphPayload {
                    graph: "nfgraph 1\n[nodes]\n".into(),
                    material: None,
                }),
            );
            ws.send(Message::Text(serde_json::to_string(&update).unwrap()))
                .unwrap();
            thread::sleep(Duration::from_millis(200));
            let _ = ws.close(None);
            let _ = ws.flush();
        });

        let ev = poll_until(&mut session, |e| matches!(e, SessionEvent::Edited(_)));
        assert_eq!(ev, SessionEvent::Edited("nfgraph 1\n[nodes]\n".into()));
        poll_until(&mut session, |e| *e == SessionEvent::Closed);
        client.join().unwrap();
        session.close();
    }
}
