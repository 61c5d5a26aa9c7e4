mod signaling_sink;
mod ws_signaling;

pub use signaling_sink::SignalingSink;
pub use ws_signaling::WsSignaling;
