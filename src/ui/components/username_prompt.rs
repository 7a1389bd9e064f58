use eframe::egui;

/// Username entry screen. Returns the name once submitted.
pub fn render(ui: &mut egui::Ui, username: &mut String) -> Option<String> {
    let mut submit = false;
    ui.vertical_centered(|ui| {
        ui.heading("Enter your username");
        ui.add_space(8.0);
        let response = ui.text_edit_singleline(username);
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            submit = true;
        }
        if ui.button("Join Chat").clicked() {
            submit = true;
        }
    });

    (submit && !username.trim().is_empty()).then(|| username.clone())
}
