//! Runtime bridge between UI command queue and the registry gateway.

use std::{sync::Arc, thread};

use client_core::{execute, ClientConfig, RegistryGateway, RestGateway};
use crossbeam_channel::{Receiver, Sender};
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(
    config: ClientConfig,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        let gateway = Arc::new(RestGateway::new(&config));
        tracing::info!(
            backend = %config.backend_url,
            table = %config.table,
            "backend worker ready"
        );
        runtime.block_on(serve(gateway, cmd_rx, ui_tx));
    })
}

/// Serves commands until `Shutdown` or until the UI drops its sender. Each
/// gateway request runs as its own task so a slow request never blocks the
/// queue.
pub async fn serve<G>(gateway: Arc<G>, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>)
where
    G: RegistryGateway + 'static,
{
    let mut session_changes = gateway.subscribe_session_changes();
    let events_tx = ui_tx.clone();
    let event_task = tokio::spawn(async move {
        loop {
            match session_changes.recv().await {
                Ok(change) => {
                    let _ = events_tx.try_send(UiEvent::SessionChanged(change.into_session()));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "session change subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut in_flight: Vec<JoinHandle<()>> = Vec::new();
    while let Ok(cmd) = cmd_rx.recv() {
        in_flight.retain(|task| !task.is_finished());
        match cmd {
            BackendCommand::Gateway(request) => {
                let gateway = Arc::clone(&gateway);
                let ui_tx = ui_tx.clone();
                in_flight.push(tokio::spawn(async move {
                    let outcome = execute(gateway.as_ref(), request).await;
                    if ui_tx.try_send(UiEvent::Outcome(outcome)).is_err() {
                        tracing::warn!("ui event queue unavailable; dropping gateway outcome");
                    }
                }));
            }
            BackendCommand::Shutdown => break,
        }
    }

    if !in_flight.is_empty() {
        tracing::info!(count = in_flight.len(), "aborting in-flight gateway requests");
    }
    for task in in_flight {
        task.abort();
    }
    event_task.abort();
    tracing::info!("backend worker stopped");
}

#[cfg(test)]
#[path = "../tests/runtime_tests.rs"]
mod tests;
