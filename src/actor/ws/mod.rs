//! WebSocket Actor - Reload Broadcast
//!
//! Holds the browser connections opened by the reload client and
//! broadcasts reload requests to all of them.
//!
//! ```text
//! BundlerActor --[Reload]--> WsActor --[broadcast]--> Clients
//! ```

use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::messages::WsMsg;
use crate::reload::message::ReloadMessage;

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// Interval of the background read poll that drops closed clients.
const READ_POLL: Duration = Duration::from_millis(200);

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    rx: mpsc::Receiver<WsMsg>,
    clients: Clients,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<WsMsg>) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let reader = Arc::clone(&self.clients);
        std::thread::spawn(move || reap_closed_clients(reader));

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Reload { reason } => {
                    crate::debug!("ws"; "sending reload: {}", reason);
                    self.broadcast(&ReloadMessage::reload(reason));
                }
                WsMsg::AddClient(stream) => self.add_client(stream),
                WsMsg::Shutdown => break,
            }
        }

        for mut ws in self.clients.lock().drain(..) {
            let _ = ws.close(None);
        }
        crate::debug!("ws"; "stopped");
    }

    fn add_client(&self, stream: TcpStream) {
        let mut ws = match tungstenite::accept(stream) {
            Ok(ws) => ws,
            Err(e) => {
                crate::log!("ws"; "handshake failed: {}", e);
                return;
            }
        };

        let hello = Message::Text(ReloadMessage::connected().to_json().into());
        if let Err(e) = ws.send(hello) {
            crate::debug!("ws"; "client dropped during hello: {}", e);
            return;
        }
        // reads are polled from the reaper thread
        let _ = ws.get_ref().set_nonblocking(true);

        let mut clients = self.clients.lock();
        clients.push(ws);
        crate::debug!("ws"; "client connected (total: {})", clients.len());
    }

    /// Send to every client, dropping the ones that fail. Returns the
    /// number of clients reached.
    fn broadcast(&self, msg: &ReloadMessage) -> usize {
        let frame = Message::Text(msg.to_json().into());
        let mut clients = self.clients.lock();
        if clients.is_empty() {
            crate::debug!("ws"; "no clients connected");
            return 0;
        }

        clients.retain_mut(|ws| match ws.send(frame.clone()) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("ws"; "client disconnected: {}", e);
                false
            }
        });
        clients.len()
    }
}

/// Drain incoming frames so closed connections are noticed between reloads.
fn reap_closed_clients(clients: Clients) {
    while Arc::strong_count(&clients) > 1 {
        std::thread::sleep(READ_POLL);

        clients.lock().retain_mut(|ws| match ws.read() {
            Ok(Message::Close(_)) => false,
            Ok(_) => true,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
                true
            }
            Err(_) => false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn read_text<S: std::io::Read + std::io::Write>(ws: &mut WebSocket<S>) -> String {
        match ws.read().unwrap() {
            Message::Text(text) => text.as_str().to_owned(),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_broadcast_without_clients() {
        let (_tx, rx) = mpsc::channel(1);
        let actor = WsActor::new(rx);
        assert_eq!(actor.broadcast(&ReloadMessage::reload("x")), 0);
    }

    #[test]
    fn test_client_receives_hello_and_reload() {
        let (_tx, rx) = mpsc::channel(1);
        let actor = WsActor::new(rx);

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = std::thread::spawn(move || {
            let (ws, _) = tungstenite::connect(format!("ws://{addr}")).unwrap();
            ws
        });

        let (stream, _) = listener.accept().unwrap();
        actor.add_client(stream);
        let mut ws = client.join().unwrap();

        assert!(read_text(&mut ws).contains(r#""type":"connected""#));
        assert_eq!(actor.broadcast(&ReloadMessage::reload("document document.tsx updated")), 1);
        assert_eq!(
            read_text(&mut ws),
            r#"{"type":"reload","reason":"document document.tsx updated"}"#
        );
    }
}
