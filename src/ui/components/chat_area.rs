use eframe::egui;

use crate::common::{ChatMessage, Identity, MessageOrigin};
use crate::ui::state::format_time;

pub fn render(ui: &mut egui::Ui, messages: &[ChatMessage], identity: Option<&Identity>) {
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            if messages.is_empty() {
                ui.label(egui::RichText::new("No messages yet").weak());
                return;
            }

            for message in messages {
                let own = identity.is_some_and(|identity| message.is_own(identity));
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(format_time(&message.sent_at)).weak());
                    let author = egui::RichText::new(&message.author).strong();
                    if own {
                        ui.colored_label(egui::Color32::LIGHT_BLUE, author);
                    } else {
                        ui.label(author);
                    }
                    ui.label(&message.text);
                    if message.origin == MessageOrigin::LocalPending {
                        ui.label(egui::RichText::new("(sending)").weak().italics());
                    }
                });
            }
        });
}
