use super::{TransportQueue, TransportSignal};
use crate::engine::core::error::EngineError;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

pub fn connect(url: &str, queue: TransportQueue) -> Result<(), EngineError> {
    let socket =
        WebSocket::new(url).map_err(|err| EngineError::Transport(format!("{:?}", err)))?;

    let open_queue = queue.clone();
    let on_open = Closure::wrap(Box::new(move |_event: JsValue| {
        open_queue.push(TransportSignal::Opened);
    }) as Box<dyn FnMut(JsValue)>);
    socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));

    let message_queue = queue.clone();
    let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
        // Only text frames carry events.
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            message_queue.push(TransportSignal::Message(data.into()));
        }
    }) as Box<dyn FnMut(MessageEvent)>);
    socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

    let error_queue = queue.clone();
    let on_error = Closure::wrap(Box::new(move |_event: JsValue| {
        error_queue.push(TransportSignal::Errored("websocket error".to_string()));
    }) as Box<dyn FnMut(JsValue)>);
    socket.set_onerror(Some(on_error.as_ref().unchecked_ref()));

    let on_close = Closure::wrap(Box::new(move |_event: CloseEvent| {
        queue.push(TransportSignal::Closed);
    }) as Box<dyn FnMut(CloseEvent)>);
    socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

    // The browser owns the socket from here; hand the callbacks to JS.
    on_open.forget();
    on_message.forget();
    on_error.forget();
    on_close.forget();
    Ok(())
}
