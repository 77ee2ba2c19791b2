//! The "Plant a New Memory" form.

use bevy_egui::egui;
use garden_core::{Emotion, Zone};
use tracing::info;

use super::color32;
use crate::runtime::RUNTIME;
use crate::state::{AppState, Garden};

pub fn render_plant_form(ctx: &egui::Context, app_state: &mut AppState, garden: &mut Garden, time: f64) {
    let screen = ctx.screen_rect();
    let width = (screen.width() * 0.8).min(460.0).max(300.0);
    let height = (screen.height() * 0.8).min(520.0).max(340.0);

    let gateway = garden.session.gateway().cloned();
    let mut plant = false;
    let mut cancel = false;

    egui::Window::new("Plant a New Memory")
        .collapsible(false)
        .resizable(true)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .default_size([width, height])
        .show(ctx, |ui| {
            egui::Grid::new("memory_form")
                .num_columns(2)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label("Title:");
                    ui.add(
                        egui::TextEdit::singleline(&mut app_state.form.title)
                            .hint_text("A name for this memory")
                            .desired_width(f32::INFINITY),
                    );
                    ui.end_row();

                    ui.label("Date:");
                    ui.add(
                        egui::TextEdit::singleline(&mut app_state.form.date)
                            .hint_text("YYYY-MM-DD")
                            .desired_width(120.0),
                    );
                    ui.end_row();

                    ui.label("Emotion:");
                    ui.horizontal(|ui| {
                        let selected = Zone::of(app_state.form.emotion);
                        egui::ComboBox::from_id_salt("emotion_picker")
                            .selected_text(selected.display_name)
                            .show_ui(ui, |ui| {
                                for emotion in Emotion::ALL {
                                    let zone = Zone::of(emotion);
                                    ui.selectable_value(
                                        &mut app_state.form.emotion,
                                        emotion,
                                        egui::RichText::new(zone.display_name)
                                            .color(color32(zone.palette.primary)),
                                    );
                                }
                            });

                        let detecting = app_state.requests.is_detecting();
                        let label = if detecting { "Detecting..." } else { "AI Detect" };
                        let response = ui.add_enabled(
                            gateway.is_some() && !detecting,
                            egui::Button::new(label),
                        );
                        if response
                            .on_hover_text("Guess the emotion from the title and description")
                            .clicked()
                        {
                            if let Some(gateway) = &gateway {
                                app_state.start_sentiment(gateway);
                            }
                        }
                        if detecting {
                            ui.spinner();
                        }
                    });
                    ui.end_row();

                    ui.label("Intensity:");
                    ui.add(egui::Slider::new(&mut app_state.form.intensity, 1..=10));
                    ui.end_row();
                });

            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.label("Description:");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let completing = app_state.requests.is_completing();
                    if completing {
                        ui.spinner();
                    }
                    let label = if completing { "Writing..." } else { "AI Complete" };
                    let response = ui.add_enabled(
                        gateway.is_some() && !completing,
                        egui::Button::new(label),
                    );
                    if response
                        .on_hover_text("Continue the description")
                        .clicked()
                    {
                        if let Some(gateway) = &gateway {
                            app_state.start_completion(gateway);
                        }
                    }
                });
            });
            egui::ScrollArea::vertical().max_height(200.0).show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut app_state.form.description)
                        .hint_text("What happened? How did it feel?")
                        .desired_rows(6)
                        .desired_width(f32::INFINITY),
                );
            });

            if gateway.is_none() {
                ui.label(
                    egui::RichText::new("AI helpers are off. Add an API key in Settings.")
                        .small()
                        .color(egui::Color32::GRAY),
                );
            }

            if let Some(ref error) = app_state.form_error {
                ui.colored_label(egui::Color32::from_rgb(255, 100, 100), error);
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Plant").clicked() {
                    plant = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });

    if cancel {
        app_state.close_form();
        return;
    }
    if !plant {
        return;
    }

    let draft = match app_state.form.to_draft() {
        Ok(draft) => draft,
        Err(e) => {
            app_state.form_error = Some(e.to_string());
            return;
        }
    };
    let title = draft.title.clone();
    match garden.session.plant(draft, RUNTIME.handle()) {
        Ok(id) => {
            info!(id = %id, "memory planted from form");
            app_state.close_form();
            app_state.set_status(format!("Planted \"{title}\""), time);
        }
        Err(e) => app_state.form_error = Some(e.to_string()),
    }
}
