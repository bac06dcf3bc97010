use super::{TransportQueue, TransportSignal};
use crate::engine::core::error::EngineError;
use tungstenite::{Error as WsError, Message};

pub fn connect(url: &str, queue: TransportQueue) -> Result<(), EngineError> {
    let url = url.to_string();
    std::thread::Builder::new()
        .name("event-transport".to_string())
        .spawn(move || run_socket(&url, &queue))
        .map_err(|err| EngineError::Transport(err.to_string()))?;
    Ok(())
}

/// Blocking reader loop, ends when the socket closes or fails.
fn run_socket(url: &str, queue: &TransportQueue) {
    let mut socket = match tungstenite::connect(url) {
        Ok((socket, _response)) => socket,
        Err(err) => {
            queue.push(TransportSignal::ConnectFailed(err.to_string()));
            return;
        }
    };
    queue.push(TransportSignal::Opened);

    loop {
        match socket.read() {
            Ok(Message::Text(text)) => queue.push(TransportSignal::Message(text)),
            Ok(Message::Close(_)) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {
                queue.push(TransportSignal::Closed);
                return;
            }
            // Binary frames are not part of the protocol; ping/pong is handled by tungstenite.
            Ok(_) => {}
            Err(err) => {
                queue.push(TransportSignal::Errored(err.to_string()));
                queue.push(TransportSignal::Closed);
                return;
            }
        }
    }
}
