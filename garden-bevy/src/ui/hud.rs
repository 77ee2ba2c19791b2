//! Top bar and status line.

use bevy_egui::egui;
use garden_core::Zone;

use super::color32;
use crate::state::{ActiveOverlay, AppState, Garden};

pub fn render_top_bar(ctx: &egui::Context, app_state: &mut AppState, garden: &Garden) {
    let session = &garden.session;
    let zone = Zone::of(session.current_zone());

    egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.heading(
                egui::RichText::new("Memory Garden").color(egui::Color32::from_rgb(0, 255, 136)),
            );

            ui.separator();

            // Current zone in its own colors
            ui.label(
                egui::RichText::new(format!(" {} ", zone.display_name))
                    .color(color32(zone.palette.text))
                    .background_color(color32(zone.palette.primary))
                    .strong(),
            );

            ui.separator();

            ui.label(format!("{} memories", session.store().len()));

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.spacing_mut().item_spacing.x = 6.0;

                if ui.button("?").on_hover_text("Help (F1)").clicked() {
                    app_state.toggle_overlay(ActiveOverlay::Help);
                }

                if ui.button("Settings").on_hover_text("API key").clicked() {
                    if app_state.overlay != ActiveOverlay::Settings {
                        app_state.api_key_input = session.config().api_key.clone().unwrap_or_default();
                    }
                    app_state.toggle_overlay(ActiveOverlay::Settings);
                }

                let connections_label = if app_state.show_connections {
                    "Connections: on"
                } else {
                    "Connections: off"
                };
                if ui
                    .selectable_label(app_state.show_connections, connections_label)
                    .on_hover_text("Toggle connection lines (C)")
                    .clicked()
                {
                    app_state.show_connections = !app_state.show_connections;
                }

                if ui
                    .button("Plant a Memory")
                    .on_hover_text("Open the memory form (F)")
                    .clicked()
                {
                    app_state.open_form();
                }
            });
        });
    });
}

pub fn render_status_bar(ctx: &egui::Context, app_state: &AppState, garden: &Garden) {
    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new(
                    "WASD/Arrows move · Space/Ctrl up/down · Right-drag look · Click inspect · Shift+drag move · F plant · C connections",
                )
                .small()
                .color(egui::Color32::GRAY),
            );

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if !garden.has_ai() {
                    ui.label(
                        egui::RichText::new("AI off")
                            .small()
                            .color(egui::Color32::from_rgb(200, 160, 80)),
                    )
                    .on_hover_text("Set an API key in Settings to enable AI features");
                }
                let pending = garden.session.pending_lookups();
                if pending > 0 {
                    ui.spinner();
                    ui.label(egui::RichText::new(format!("Finding connections ({pending})")).small());
                }
                if let Some(ref msg) = app_state.status_message {
                    ui.label(egui::RichText::new(msg).italics());
                }
                if let Some(memory) = garden.session.hovered_memory() {
                    let zone = Zone::of(memory.emotion);
                    ui.label(
                        egui::RichText::new(&memory.title)
                            .color(color32(zone.palette.primary))
                            .strong(),
                    );
                }
            });
        });
    });
}
