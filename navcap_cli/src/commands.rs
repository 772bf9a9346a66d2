use crate::error::CliError;
use navcap_core::export::{export_json, recent_lines};
use navcap_core::storage::{self, KeyValueStore};
use navcap_core::{
    control_channel, Capture, CaptureConfig, ControlAck, ControlCommand, ControlHandler,
    EventLogWriter, ReadyState, StaticPage, TrackingGate,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Relay one command to the store, the way the control panel does, and
/// wait until its writes have landed.
pub async fn control(
    store: Arc<dyn KeyValueStore>,
    config: CaptureConfig,
    url: &str,
    command: ControlCommand,
) -> Result<ControlAck, CliError> {
    let (writer, writer_task) =
        EventLogWriter::spawn(Arc::clone(&store), config.max_events, config.retry);
    let gate = TrackingGate::new();
    gate.load(store.as_ref()).await?;

    let page = StaticPage::new(url, "").with_ready_state(ReadyState::Complete);
    let capture = Capture::new(gate, writer, Arc::new(page), Arc::new(config));

    let (client, rx) = control_channel(1);
    let server = tokio::spawn(ControlHandler::new(capture.clone()).serve(rx));
    let ack = client.send(command).await?;
    drop(client);
    server.await?;

    capture.writer().flush().await?;
    drop(capture);
    writer_task.await?;

    info!(?command, result = %ack.result, "Control command applied");
    Ok(ack)
}

pub async fn list(store: &dyn KeyValueStore, recent: usize) -> Result<Vec<String>, CliError> {
    let events = storage::load_events(store).await?;
    debug!(total = events.len(), recent, "Listing recent events");
    Ok(recent_lines(&events, recent))
}

/// Write the stored log as pretty JSON. Returns the path written.
pub async fn export(
    store: &dyn KeyValueStore,
    config: &CaptureConfig,
    out: Option<PathBuf>,
) -> Result<(PathBuf, usize), CliError> {
    let events = storage::load_events(store).await?;
    let out = out.unwrap_or_else(|| PathBuf::from(&config.export_file_name));
    write_export(&out, &export_json(&events)?)?;
    info!(path = ?out, count = events.len(), "Exported events");
    Ok((out, events.len()))
}

fn write_export(path: &Path, json: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
}
