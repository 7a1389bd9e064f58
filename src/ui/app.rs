use eframe::egui;
use tokio::sync::{mpsc, watch};

use crate::common::SessionCommand;
use crate::session::SessionSnapshot;

use super::components::{chat_area, input_bar, status_bar, username_prompt};
use super::state::AppState;

pub struct ChatApp {
    state: AppState,
    command_sender: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        command_sender: mpsc::Sender<SessionCommand>,
        snapshots: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        Self {
            state: AppState::default(),
            command_sender,
            snapshots,
        }
    }

    fn send_command(&mut self, command: SessionCommand) {
        if let Err(err) = self.command_sender.try_send(command) {
            log::warn!("Failed to send command to session: {err}");
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let snapshot = self.snapshots.borrow_and_update().clone();

        if snapshot.identity.is_none() {
            egui::CentralPanel::default().show(ctx, |ui| {
                if let Some(warning) = &snapshot.warning {
                    ui.colored_label(egui::Color32::from_rgb(230, 120, 40), warning);
                }
                if let Some(name) = username_prompt::render(ui, &mut self.state.username_input) {
                    self.send_command(SessionCommand::SelectIdentity(name));
                }
            });
            ctx.request_repaint();
            return;
        }

        egui::TopBottomPanel::top("status_bar").show(ctx, |ui| {
            ui.heading("Rust WebSocket Chat");
            let actions = status_bar::render(ui, &snapshot);
            if actions.clear_requested {
                self.send_command(SessionCommand::ClearAll);
            }
            if actions.reconnect_requested {
                self.send_command(SessionCommand::Reconnect);
            }
        });

        egui::TopBottomPanel::bottom("input_bar").show(ctx, |ui| {
            let connected = snapshot.connection.is_connected();
            if let Some(text) = input_bar::render(ui, &mut self.state.input_text, connected) {
                self.send_command(SessionCommand::Submit(text));
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            chat_area::render(ui, &snapshot.messages, snapshot.identity.as_ref());
        });

        ctx.request_repaint();
    }
}
