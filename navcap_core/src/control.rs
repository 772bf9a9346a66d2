use crate::capture::Capture;
use crate::describe::{describe, Action, TrackingTransition};
use crate::error::{CaptureError, Result};
use crate::record::{EventContext, EventType};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Commands sent by the control panel through the message relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ControlCommand {
    Start,
    Stop,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlAck {
    pub result: String,
}

impl ControlAck {
    pub fn ok() -> Self {
        Self {
            result: "ok".to_string(),
        }
    }
}

/// A relayed message awaiting acknowledgement
#[derive(Debug)]
pub struct ControlMessage {
    pub payload: String,
    pub reply: oneshot::Sender<ControlAck>,
}

/// Sending half of the relay
#[derive(Debug, Clone)]
pub struct ControlClient {
    tx: mpsc::Sender<ControlMessage>,
}

impl ControlClient {
    pub async fn send(&self, command: ControlCommand) -> Result<ControlAck> {
        self.send_raw(serde_json::to_string(&command)?).await
    }

    pub async fn send_raw(&self, payload: impl Into<String>) -> Result<ControlAck> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ControlMessage {
                payload: payload.into(),
                reply,
            })
            .await
            .map_err(|e| CaptureError::ChannelClosed(e.to_string()))?;
        rx.await
            .map_err(|e| CaptureError::ChannelClosed(e.to_string()))
    }
}

pub fn control_channel(capacity: usize) -> (ControlClient, mpsc::Receiver<ControlMessage>) {
    let (tx, rx) = mpsc::channel(capacity);
    (ControlClient { tx }, rx)
}

/// Applies start/stop/clear to the tracking gate and the log.
///
/// Each transition writes a `tracking` bookkeeping record, whatever the
/// gate says, so the log shows where capture started and stopped.
#[derive(Debug, Clone)]
pub struct ControlHandler {
    capture: Capture,
}

impl ControlHandler {
    pub fn new(capture: Capture) -> Self {
        Self { capture }
    }

    /// Apply a command. Returns once the store writes are queued, not
    /// once they are persisted.
    pub fn handle(&self, command: ControlCommand) -> Result<ControlAck> {
        let writer = self.capture.writer();
        let transition = match command {
            ControlCommand::Start => {
                self.capture.gate().set(true);
                writer.submit_tracking(true)?;
                TrackingTransition::Started
            }
            ControlCommand::Stop => {
                self.capture.gate().set(false);
                writer.submit_tracking(false)?;
                TrackingTransition::Stopped
            }
            ControlCommand::Clear => {
                writer.submit_clear()?;
                TrackingTransition::Cleared
            }
        };
        info!(?command, "Applied control command");

        let context = EventContext::described(describe(&Action::Tracking(transition)));
        if !self.capture.record(EventType::Tracking, context) {
            return Err(CaptureError::WriterClosed);
        }
        Ok(ControlAck::ok())
    }

    /// Handle a raw relay payload. Every message is acknowledged; payloads
    /// that are not a known command are ignored.
    pub fn handle_message(&self, payload: &str) -> ControlAck {
        match serde_json::from_str::<ControlCommand>(payload) {
            Ok(command) => {
                if let Err(e) = self.handle(command) {
                    error!(error = %e, ?command, "Control command failed");
                }
            }
            Err(e) => warn!(error = %e, payload, "Ignoring unknown control message"),
        }
        ControlAck::ok()
    }

    /// Serve relayed messages until every client is dropped
    pub async fn serve(self, mut rx: mpsc::Receiver<ControlMessage>) {
        info!("Starting control channel");

        while let Some(message) = rx.recv().await {
            let ack = self.handle_message(&message.payload);
            if message.reply.send(ack).is_err() {
                debug!("Control client went away before acknowledgement");
            }
        }

        info!("Control channel closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::tests::capture_fixture;
    use crate::record::EventRecord;

    async fn recorded(capture: &Capture) -> Vec<EventRecord> {
        capture.writer().flush().await.unwrap();
        capture.writer().read_all().await.unwrap()
    }

    #[test]
    fn test_command_wire_format() {
        let command: ControlCommand = serde_json::from_str(r#"{"action":"start"}"#).unwrap();
        assert_eq!(command, ControlCommand::Start);
        assert_eq!(
            serde_json::to_string(&ControlCommand::Clear).unwrap(),
            r#"{"action":"clear"}"#
        );
        assert_eq!(
            serde_json::to_string(&ControlAck::ok()).unwrap(),
            r#"{"result":"ok"}"#
        );
    }

    #[tokio::test]
    async fn test_start_and_stop_flip_the_gate() {
        let (capture, _page) = capture_fixture(false).await;
        let handler = ControlHandler::new(capture.clone());

        assert_eq!(handler.handle(ControlCommand::Start).unwrap(), ControlAck::ok());
        assert!(capture.is_tracking());
        handler.handle(ControlCommand::Stop).unwrap();
        assert!(!capture.is_tracking());

        let events = recorded(&capture).await;
        let descriptions: Vec<&str> = events.iter().map(|e| e.natural_description()).collect();
        assert_eq!(descriptions, vec!["Tracking started", "Tracking stopped"]);
        assert!(events.iter().all(|e| e.event_type == EventType::Tracking));
    }

    #[tokio::test]
    async fn test_clear_leaves_only_bookkeeping_record() {
        let (capture, _page) = capture_fixture(true).await;
        let handler = ControlHandler::new(capture.clone());

        for _ in 0..3 {
            capture.capture_event(EventType::Click, EventContext::described("Clicked"));
        }
        handler.handle(ControlCommand::Clear).unwrap();

        let events = recorded(&capture).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].natural_description(), "Events cleared");
    }

    #[tokio::test]
    async fn test_unknown_message_is_acknowledged() {
        let (capture, _page) = capture_fixture(false).await;
        let handler = ControlHandler::new(capture.clone());

        assert_eq!(handler.handle_message(r#"{"action":"pause"}"#), ControlAck::ok());
        assert_eq!(handler.handle_message("not json"), ControlAck::ok());
        assert!(!capture.is_tracking());
        assert!(recorded(&capture).await.is_empty());
    }

    #[tokio::test]
    async fn test_serve_over_channel() {
        let (capture, _page) = capture_fixture(false).await;
        let (client, rx) = control_channel(8);
        tokio::spawn(ControlHandler::new(capture.clone()).serve(rx));

        assert_eq!(client.send(ControlCommand::Start).await.unwrap(), ControlAck::ok());
        assert!(capture.is_tracking());
        assert_eq!(client.send_raw("{}").await.unwrap(), ControlAck::ok());
    }
}
