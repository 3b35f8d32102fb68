// PrintBench - ui/panels/slices.rs
//
// The slice viewer window: a vertical slider scrubs through the layer
// image stack. The slider range is exactly 0..=layers-1 and the selected
// image is shown at a fixed size, so scrubbing never makes the view jump.
//
// Only the selected layer's image lives on the GPU: textures are uploaded
// lazily and the previous one is dropped on selection change, keeping GPU
// memory flat no matter how tall the stack is.

use crate::app::state::AppState;
use crate::ui::theme;

/// Slice viewer window with its one-layer texture cache.
#[derive(Default)]
pub struct SliceViewer {
    /// Texture for the currently displayed layer: (layer index, handle).
    texture: Option<(usize, egui::TextureHandle)>,
}

impl SliceViewer {
    /// Render the window when `state.show_slice_viewer` is set.
    pub fn render(&mut self, ctx: &egui::Context, state: &mut AppState) {
        if !state.show_slice_viewer {
            return;
        }

        let mut open = state.show_slice_viewer;
        egui::Window::new("Slice Viewer")
            .open(&mut open)
            .default_size([
                theme::SLICE_VIEW_SIZE + 80.0,
                theme::SLICE_VIEW_SIZE + 40.0,
            ])
            .resizable(true)
            .show(ctx, |ui| {
                if state.layers.is_empty() {
                    ui.label(
                        egui::RichText::new(if state.slice_in_progress {
                            "Slicing\u{2026}"
                        } else {
                            "No layers — slice a model first."
                        })
                        .color(theme::DIM),
                    );
                    return;
                }

                state.clamp_selection();

                // Arrow keys step through the stack while the window is open.
                let (up, down) = ui.input(|i| {
                    (
                        i.key_pressed(egui::Key::ArrowUp),
                        i.key_pressed(egui::Key::ArrowDown),
                    )
                });
                if up && state.selected_layer + 1 < state.layers.len() {
                    state.selected_layer += 1;
                }
                if down && state.selected_layer > 0 {
                    state.selected_layer -= 1;
                }

                ui.horizontal(|ui| {
                    // Vertical slider, bottom layer at the bottom.
                    let max_index = state.layers.len() - 1;
                    ui.add(
                        egui::Slider::new(&mut state.selected_layer, 0..=max_index)
                            .vertical()
                            .show_value(false),
                    );

                    ui.vertical(|ui| {
                        let layer = &state.layers[state.selected_layer];

                        ui.label(format!(
                            "Layer {}/{} \u{2014} z = {:.3} mm, {} outline{} ({} closed)",
                            layer.index + 1,
                            state.layers.len(),
                            layer.z,
                            layer.outline_count,
                            if layer.outline_count == 1 { "" } else { "s" },
                            layer.closed_count,
                        ));

                        let texture = self.texture_for(ctx, state);
                        let side = ui
                            .available_size()
                            .min_elem()
                            .clamp(64.0, theme::SLICE_VIEW_SIZE);
                        ui.add(
                            egui::Image::new(&texture)
                                .fit_to_exact_size(egui::Vec2::splat(side)),
                        );
                    });
                });
            });
        state.show_slice_viewer = open;
    }

    /// Texture for the selected layer, uploading it if the selection moved.
    fn texture_for(&mut self, ctx: &egui::Context, state: &AppState) -> egui::TextureHandle {
        let index = state.selected_layer;

        if let Some((cached_index, handle)) = &self.texture {
            if *cached_index == index {
                return handle.clone();
            }
        }

        let layer = &state.layers[index];
        let size = [layer.image.width() as usize, layer.image.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, layer.image.as_raw());
        let handle = ctx.load_texture(
            format!("slice_layer_{index}"),
            color_image,
            egui::TextureOptions::LINEAR,
        );
        self.texture = Some((index, handle.clone()));
        handle
    }

    /// Drop the cached texture; called when a new stack replaces the old one.
    pub fn invalidate(&mut self) {
        self.texture = None;
    }
}
