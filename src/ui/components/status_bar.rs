use eframe::egui;

use crate::common::ConnectionState;
use crate::session::SessionSnapshot;

#[derive(Debug, Default)]
pub struct StatusActions {
    pub clear_requested: bool,
    pub reconnect_requested: bool,
}

pub fn render(ui: &mut egui::Ui, snapshot: &SessionSnapshot) -> StatusActions {
    let mut actions = StatusActions::default();

    ui.horizontal(|ui| {
        let (color, label) = match &snapshot.connection {
            ConnectionState::Connected => (egui::Color32::GREEN, "Connected".to_string()),
            ConnectionState::Connecting => (egui::Color32::YELLOW, "Connecting...".to_string()),
            ConnectionState::Disconnected => (egui::Color32::GRAY, "Disconnected".to_string()),
            ConnectionState::Failed(reason) => (egui::Color32::RED, format!("Failed: {reason}")),
        };
        ui.colored_label(color, "●");
        ui.label(label);

        if let Some(identity) = &snapshot.identity {
            ui.separator();
            ui.label(format!("Logged in as {identity}"));
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Clear Chat").clicked() {
                actions.clear_requested = true;
            }
            if !snapshot.connection.is_live() && ui.button("Reconnect").clicked() {
                actions.reconnect_requested = true;
            }
        });
    });

    if let Some(warning) = &snapshot.warning {
        ui.colored_label(egui::Color32::from_rgb(230, 120, 40), warning);
    }

    actions
}
