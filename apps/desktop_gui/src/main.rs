mod backend_bridge;
mod controller;
mod ui;

use anyhow::{anyhow, Context};
use client_core::{load_settings, ClientConfig};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::RsvpApp;

const APP_TITLE: &str = "Wedding RSVP";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config() -> anyhow::Result<ClientConfig> {
    let settings = load_settings().context("failed to read settings")?;
    settings.resolve().context("invalid settings")
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = load_config()?;
    tracing::info!(
        backend = %config.backend_url,
        data_dir = %config.data_dir.display(),
        target = %config.event.target,
        "starting rsvp client"
    );

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    let event = config.event.clone();
    let csv_style = config.csv_style;
    let worker = backend_bridge::runtime::launch(config, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([960.0, 720.0])
            .with_min_inner_size([640.0, 520.0]),
        ..Default::default()
    };
    let result = eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(ui::theme::lilac_visuals());
            Ok(Box::new(RsvpApp::new(cmd_tx, ui_rx, event, csv_style)))
        }),
    );

    // The app sends Shutdown when dropped; wait for the worker to wind down.
    if worker.join().is_err() {
        tracing::error!("backend worker panicked");
    }
    result.map_err(|err| anyhow!("ui event loop failed: {err}"))
}
