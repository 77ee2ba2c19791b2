//! Overlay windows for memory details, settings and help.

use bevy_egui::egui;
use garden_core::{MemoryId, Zone};

use super::color32;
use crate::state::{ActiveOverlay, AppState, Garden};

/// Render the window for a selected memory.
pub fn render_memory_detail(ctx: &egui::Context, app_state: &mut AppState, garden: &Garden, id: MemoryId) {
    let session = &garden.session;
    let Some(memory) = session.memory(id) else {
        app_state.overlay = ActiveOverlay::None;
        return;
    };
    let zone = Zone::of(memory.emotion);

    let screen = ctx.screen_rect();
    let width = (screen.width() * 0.8).min(420.0).max(280.0);
    let height = (screen.height() * 0.7).min(460.0).max(280.0);

    let mut open = true;
    let mut select = None;

    egui::Window::new(&memory.title)
        .id(egui::Id::new("memory_detail"))
        .collapsible(false)
        .resizable(true)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .default_size([width, height])
        .max_size([520.0, 600.0])
        .open(&mut open)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(format!(" {} ", zone.display_name))
                        .color(color32(zone.palette.text))
                        .background_color(color32(zone.palette.primary))
                        .strong(),
                );
                ui.label(memory.date.format("%B %-d, %Y").to_string());
            });

            ui.horizontal(|ui| {
                ui.label("Intensity:");
                ui.label(
                    egui::RichText::new(format!("{}/10", memory.intensity))
                        .color(color32(zone.palette.accent))
                        .strong(),
                );
            });

            ui.separator();

            egui::ScrollArea::vertical()
                .max_height(220.0)
                .show(ui, |ui| {
                    ui.label(&memory.description);
                });

            ui.separator();

            ui.label(
                egui::RichText::new(format!(
                    "Planted {}",
                    memory.created_at.format("%Y-%m-%d %H:%M UTC")
                ))
                .small()
                .color(egui::Color32::GRAY),
            );

            let related: Vec<_> = session
                .connections()
                .related(id)
                .filter_map(|other| session.memory(other))
                .collect();
            if !related.is_empty() {
                ui.add_space(6.0);
                ui.label(egui::RichText::new("Related memories").strong());
                for other in related {
                    let other_zone = Zone::of(other.emotion);
                    if ui
                        .link(
                            egui::RichText::new(&other.title).color(color32(other_zone.palette.primary)),
                        )
                        .clicked()
                    {
                        select = Some(other.id);
                    }
                }
            }
        });

    if !open {
        app_state.overlay = ActiveOverlay::None;
    } else if let Some(other) = select {
        app_state.overlay = ActiveOverlay::MemoryDetail(other);
    }
}

/// Render the settings overlay.
pub fn render_settings(ctx: &egui::Context, app_state: &mut AppState, garden: &mut Garden) {
    let screen = ctx.screen_rect();
    let width = (screen.width() * 0.75).min(400.0).max(280.0);

    let mut save = false;

    egui::Window::new("Settings")
        .collapsible(false)
        .resizable(true)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .default_width(width)
        .show(ctx, |ui| {
            ui.heading("AI Features");
            ui.separator();

            ui.label("API key:");
            ui.add(
                egui::TextEdit::singleline(&mut app_state.api_key_input)
                    .password(true)
                    .hint_text("sk-...")
                    .desired_width(f32::INFINITY),
            );
            ui.label(
                egui::RichText::new(format!(
                    "Model: {}  ·  Endpoint: {}",
                    garden.session.config().model,
                    garden.session.config().api_base
                ))
                .small()
                .color(egui::Color32::GRAY),
            );

            ui.add_space(6.0);
            let status = if garden.has_ai() {
                egui::RichText::new("AI features are on").color(egui::Color32::from_rgb(0, 255, 136))
            } else {
                egui::RichText::new("AI features are off").color(egui::Color32::from_rgb(200, 160, 80))
            };
            ui.label(status);

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    save = true;
                }
                if ui.button("Close").clicked() {
                    app_state.overlay = ActiveOverlay::None;
                }
            });
        });

    if save {
        let config = garden
            .session
            .config()
            .clone()
            .with_api_key(app_state.api_key_input.clone());
        garden.session.reconfigure(config);
        if garden.session.config().has_api_key() && !garden.has_ai() {
            app_state.error_message =
                Some("Could not start the AI client. Check the logs for details.".to_string());
        }
        let message = if garden.has_ai() {
            "AI features enabled"
        } else {
            "AI features disabled"
        };
        app_state.set_status_persistent(message);
        app_state.overlay = ActiveOverlay::None;
    }
}

/// Render the help overlay.
pub fn render_help(ctx: &egui::Context) {
    let screen = ctx.screen_rect();
    let width = (screen.width() * 0.8).min(450.0).max(300.0);
    let height = (screen.height() * 0.75).min(480.0).max(320.0);

    egui::Window::new("Help")
        .collapsible(false)
        .resizable(true)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .default_size([width, height])
        .max_size([550.0, 600.0])
        .show(ctx, |ui| {
            ui.heading("Memory Garden");
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.label("Plant your memories as trees. Each emotion has its own zone in the ring of gardens; walk between them to change the mood.");
                ui.add_space(10.0);

                ui.heading("Moving");
                shortcut(ui, "W A S D / Arrows", "Walk");
                shortcut(ui, "Space / Ctrl", "Rise / descend");
                shortcut(ui, "Right mouse drag", "Look around");
                ui.add_space(8.0);

                ui.heading("Memories");
                shortcut(ui, "F", "Plant a new memory");
                shortcut(ui, "Click a tree", "Read the memory");
                shortcut(ui, "Shift + drag a tree", "Replant it elsewhere");
                shortcut(ui, "C", "Show or hide connections");
                ui.add_space(8.0);

                ui.heading("General");
                shortcut(ui, "F1", "This help");
                shortcut(ui, "Escape", "Close window");
                shortcut(ui, "Ctrl+Q", "Quit");
                ui.add_space(8.0);

                ui.label(
                    egui::RichText::new(
                        "With an API key set, new memories are linked to related ones and the form can detect emotions and continue your writing.",
                    )
                    .small()
                    .color(egui::Color32::GRAY),
                );
            });
        });
}

fn shortcut(ui: &mut egui::Ui, keys: &str, action: &str) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(keys).strong());
        ui.label(format!("- {action}"));
    });
}
