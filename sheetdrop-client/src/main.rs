use std::{
    path::PathBuf,
    sync::mpsc::{Receiver, Sender},
    time::Duration,
};

use clap::Parser;
use sheetdrop_client::{
    UiEvent,
    connection::{Connection, ConnectionStatus},
    intake::{IntakeEvent, IntakePanelState, read_file_entry},
    validate_server_url,
};
use sheetdrop_core::{FlashToken, REJECT_FLASH_DURATION, format_size};
use tokio::runtime::Runtime;
use tracing::error;

/// UI poll cadence for draining runtime events.
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "sheetdrop-client")]
struct ClientArgs {
    /// WebSocket endpoint of the report backend.
    #[arg(long, default_value = "ws://127.0.0.1:8000")]
    server_url: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = ClientArgs::parse();
    if let Err(err) = validate_server_url(&args.server_url) {
        error!("invalid server URL {}: {}", args.server_url, err);
        std::process::exit(2);
    }

    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("tokio runtime init failed: {err}");
            std::process::exit(1);
        }
    };

    // One connection per process, opened here before the UI loop starts so
    // repaints can never create another.
    let (ui_event_tx, ui_event_rx) = std::sync::mpsc::channel();
    let connection = Connection::open(
        runtime.handle(),
        args.server_url.clone(),
        ui_event_tx.clone(),
    );
    let app = SheetDropApp::new(runtime, connection, ui_event_tx, ui_event_rx);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([560.0, 440.0])
            .with_min_inner_size([440.0, 340.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    if let Err(err) = eframe::run_native(
        "SheetDrop",
        native_options,
        Box::new(move |_cc| Ok(Box::new(app))),
    ) {
        error!("ui event loop failed: {err}");
        std::process::exit(1);
    }
}

struct SheetDropApp {
    runtime: Runtime,
    connection: Connection,
    ui_event_tx: Sender<UiEvent>,
    ui_event_rx: Receiver<UiEvent>,
    intake: IntakePanelState,
    connection_status: ConnectionStatus,
}

impl SheetDropApp {
    fn new(
        runtime: Runtime,
        connection: Connection,
        ui_event_tx: Sender<UiEvent>,
        ui_event_rx: Receiver<UiEvent>,
    ) -> Self {
        Self {
            runtime,
            connection,
            ui_event_tx,
            ui_event_rx,
            intake: IntakePanelState::new(),
            connection_status: ConnectionStatus::Connecting,
        }
    }

    fn poll_ui_events(&mut self) {
        while let Ok(event) = self.ui_event_rx.try_recv() {
            match event {
                UiEvent::Connection(status) => self.connection_status = status,
                UiEvent::Intake(event) => {
                    if let Some(token) = self.intake.apply(event) {
                        self.schedule_flash_expiry(token);
                    }
                }
            }
        }
    }

    fn schedule_flash_expiry(&self, token: FlashToken) {
        let tx = self.ui_event_tx.clone();
        self.runtime.spawn(async move {
            tokio::time::sleep(REJECT_FLASH_DURATION).await;
            let _ = tx.send(UiEvent::Intake(IntakeEvent::FlashExpired(token)));
        });
    }

    /// Starts one independent read task per file; completions land on the UI
    /// event channel in whatever order the reads finish.
    fn enqueue_files(&self, batch: Vec<(PathBuf, String)>) {
        if batch.is_empty() {
            return;
        }
        for (path, hinted_mime) in batch {
            let tx = self.ui_event_tx.clone();
            self.runtime.spawn(async move {
                let event = read_file_entry(path, hinted_mime).await;
                let _ = tx.send(UiEvent::Intake(event));
            });
        }
    }

    fn browse_for_files(&self) {
        let picked = rfd::FileDialog::new()
            .add_filter("Spreadsheets", &["csv", "xlsx", "xls"])
            .pick_files();
        if let Some(paths) = picked {
            self.enqueue_files(paths.into_iter().map(|path| (path, String::new())).collect());
        }
    }
}

impl eframe::App for SheetDropApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_ui_events();

        let dropped = ctx.input(|input| input.raw.dropped_files.clone());
        if !dropped.is_empty() {
            let batch = dropped
                .into_iter()
                .filter_map(|file| file.path.map(|path| (path, file.mime)))
                .collect();
            self.enqueue_files(batch);
        }
        let hovering_files = ctx.input(|input| !input.raw.hovered_files.is_empty());

        egui::TopBottomPanel::top("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Backend: {}", self.connection_status.label()));
                ui.separator();
                ui.label(format!(
                    "{} selected, {}",
                    self.intake.entries().len(),
                    format_size(self.intake.total_bytes())
                ));
            });
        });

        egui::TopBottomPanel::bottom("action_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Add files\u{2026}").clicked() {
                    self.browse_for_files();
                }
                let can_send = self.connection_status == ConnectionStatus::Connected
                    && !self.intake.is_empty();
                if ui
                    .add_enabled(can_send, egui::Button::new("Send selected files"))
                    .clicked()
                {
                    self.connection.request_send(self.intake.entries().to_vec());
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let stroke = if hovering_files {
                egui::Stroke::new(2.0, ui.visuals().selection.stroke.color)
            } else {
                ui.visuals().widgets.noninteractive.bg_stroke
            };
            egui::Frame::group(ui.style()).stroke(stroke).show(ui, |ui| {
                ui.set_min_size(egui::vec2(ui.available_width(), 96.0));
                ui.centered_and_justified(|ui| {
                    ui.label("Drop .csv, .xlsx or .xls files here");
                });
            });

            if let Some(name) = self.intake.flash_file() {
                ui.colored_label(
                    egui::Color32::from_rgb(0xd0, 0x45, 0x45),
                    format!("Unsupported file type: {name}"),
                );
            }

            ui.add_space(8.0);
            egui::ScrollArea::vertical().auto_shrink(false).show(ui, |ui| {
                egui::Grid::new("accepted_files")
                    .striped(true)
                    .num_columns(2)
                    .show(ui, |ui| {
                        for file in self.intake.entries() {
                            ui.label(&file.name);
                            ui.label(format_size(file.size_bytes));
                            ui.end_row();
                        }
                    });
            });
        });

        ctx.request_repaint_after(EVENT_POLL_INTERVAL);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.connection.close();
    }
}
