// PrintBench - ui/panels/connection.rs
//
// Connection section of the left sidebar: port, baud rate, connect /
// disconnect / unlock. Writes `request_connect`, `request_disconnect`,
// and `request_unlock`; gui.rs consumes them each frame.

use crate::app::state::AppState;
use crate::core::model::MachineState;
use crate::ui::theme;
use crate::util::constants;

/// Render the connection section.
pub fn render(ui: &mut egui::Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("Printer").strong());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let colour = theme::machine_colour(state.link.state());
            ui.label(
                egui::RichText::new(format!(" \u{25cf} {} ", state.link.state().label()))
                    .strong()
                    .color(colour),
            );
        });
    });

    let linked = state.link.state().is_linked();

    // Port and baud are fixed while a link exists.
    ui.add_enabled_ui(!linked, |ui| {
        ui.horizontal(|ui| {
            ui.label("Port");
            ui.add(
                egui::TextEdit::singleline(&mut state.port_input)
                    .hint_text(constants::DEFAULT_PORT)
                    .desired_width(ui.available_width() - 8.0),
            );
        });

        ui.horizontal(|ui| {
            ui.label("Baud");
            egui::ComboBox::from_id_salt("baud_rate")
                .selected_text(state.baud.to_string())
                .show_ui(ui, |ui| {
                    for &rate in constants::BAUD_RATES {
                        ui.selectable_value(&mut state.baud, rate, rate.to_string());
                    }
                });
        });
    });

    ui.add_space(4.0);

    ui.horizontal(|ui| {
        if linked {
            if ui.button("Disconnect").clicked() {
                state.request_disconnect = true;
            }
        } else if ui
            .add_enabled(
                !state.port_input.trim().is_empty(),
                egui::Button::new("Connect"),
            )
            .on_hover_text("Open the link; the controller starts alarm-locked")
            .clicked()
        {
            state.request_connect = true;
        }

        let alarmed = matches!(state.link.state(), MachineState::Alarm { .. });
        if ui
            .add_enabled(alarmed, egui::Button::new("Unlock"))
            .on_hover_text("Send $X to clear the controller alarm")
            .clicked()
        {
            state.request_unlock = true;
        }
    });
}
