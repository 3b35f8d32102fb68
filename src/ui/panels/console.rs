// PrintBench - ui/panels/console.rs
//
// Printer console: the transcript of sent commands and annotations, plus a
// manual command input. Writes `pending_console_send`; gui.rs routes it
// through the link.

use crate::app::state::AppState;
use crate::core::model::ConsoleDirection;
use crate::ui::theme;

/// Render the console panel.
pub fn render(ui: &mut egui::Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("Console").strong());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(
                egui::RichText::new(format!("{} lines", state.link.console_len()))
                    .small()
                    .color(theme::DIM),
            );
        });
    });

    // Input row first so the scrollback takes the remaining height.
    ui.horizontal(|ui| {
        let linked = state.link.state().is_linked();

        let input = ui.add_enabled(
            linked,
            egui::TextEdit::singleline(&mut state.console_input)
                .hint_text("G-code command\u{2026}")
                .desired_width(ui.available_width() - 52.0),
        );
        let pressed_enter = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        let send_clicked = ui
            .add_enabled(
                linked && !state.console_input.trim().is_empty(),
                egui::Button::new("Send"),
            )
            .clicked();

        if (pressed_enter || send_clicked) && !state.console_input.trim().is_empty() {
            state.pending_console_send = Some(state.console_input.trim().to_string());
            state.console_input.clear();
            // Keep typing flow: focus returns to the input.
            input.request_focus();
        }
    });

    egui::ScrollArea::vertical()
        .id_salt("printer_console")
        .auto_shrink([false; 2])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for entry in state.link.console() {
                let time = entry.timestamp.format("%H:%M:%S");
                let prefix = match entry.direction {
                    ConsoleDirection::Sent => ">",
                    ConsoleDirection::Note => "\u{2014}",
                };
                ui.label(
                    egui::RichText::new(format!("{time} {prefix} {}", entry.text))
                        .monospace()
                        .size(12.0)
                        .color(theme::console_colour(entry.direction)),
                );
            }
        });
}
