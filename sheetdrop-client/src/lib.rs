pub mod connection;
pub mod intake;

use url::Url;

use crate::{connection::ConnectionStatus, intake::IntakeEvent};

/// Events delivered to the UI thread from the runtime.
///
/// Connection and intake tasks share one channel; the UI drains it once per
/// frame and owns all state mutation.
#[derive(Debug)]
pub enum UiEvent {
    Connection(ConnectionStatus),
    Intake(IntakeEvent),
}

pub fn validate_server_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|err| err.to_string())?;
    match url.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(format!("unsupported scheme {other:?}; expected ws or wss")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_url_must_be_websocket() {
        assert!(validate_server_url("ws://127.0.0.1:8000").is_ok());
        assert!(validate_server_url("wss://backend.local/intake").is_ok());
        assert!(validate_server_url("http://127.0.0.1:8000").is_err());
        assert!(validate_server_url("not a url").is_err());
    }
}
