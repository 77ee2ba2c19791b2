//! UI module - egui-based HUD, form and overlay windows.

mod form;
mod hud;
mod overlays;

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use garden_core::Rgb;

use crate::state::{ActiveOverlay, AppState, Garden};

/// egui color for a palette entry.
pub fn color32(rgb: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(rgb.r, rgb.g, rgb.b)
}

/// Main UI system - renders all egui panels.
pub fn main_ui_system(
    mut contexts: EguiContexts,
    mut app_state: ResMut<AppState>,
    mut garden: ResMut<Garden>,
    time: Res<Time>,
) {
    let ctx = contexts.ctx_mut();

    configure_style(ctx);

    // Panels first, windows float on top
    hud::render_top_bar(ctx, &mut app_state, &garden);
    hud::render_status_bar(ctx, &app_state, &garden);

    let overlay = app_state.overlay;
    match overlay {
        ActiveOverlay::None => {}
        ActiveOverlay::PlantForm => {
            form::render_plant_form(ctx, &mut app_state, &mut garden, time.elapsed_secs_f64())
        }
        ActiveOverlay::MemoryDetail(id) => overlays::render_memory_detail(ctx, &mut app_state, &garden, id),
        ActiveOverlay::Settings => overlays::render_settings(ctx, &mut app_state, &mut garden),
        ActiveOverlay::Help => overlays::render_help(ctx),
    }

    if app_state.error_message.is_some() {
        render_error_popup(ctx, &mut app_state);
    }

    if app_state.overlay == ActiveOverlay::None && garden.session.hovered_memory().is_some() {
        ctx.set_cursor_icon(egui::CursorIcon::PointingHand);
    }
}

/// Configure egui visual style.
fn configure_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    use egui::{FontId, TextStyle};
    style.text_styles = [
        (TextStyle::Small, FontId::proportional(13.0)),
        (TextStyle::Body, FontId::proportional(15.0)),
        (TextStyle::Monospace, FontId::monospace(14.0)),
        (TextStyle::Button, FontId::proportional(15.0)),
        (TextStyle::Heading, FontId::proportional(21.0)),
    ]
    .into();

    // Translucent night-garden theme
    let visuals = &mut style.visuals;
    visuals.dark_mode = true;
    visuals.override_text_color = Some(egui::Color32::from_rgb(235, 240, 230));
    visuals.window_fill = egui::Color32::from_rgba_unmultiplied(20, 30, 25, 235);
    visuals.panel_fill = egui::Color32::from_rgba_unmultiplied(15, 25, 20, 200);
    visuals.faint_bg_color = egui::Color32::from_rgb(35, 50, 40);
    visuals.extreme_bg_color = egui::Color32::from_rgb(10, 18, 14);

    visuals.selection.bg_fill = egui::Color32::from_rgb(46, 139, 87); // Sea green
    visuals.hyperlink_color = egui::Color32::from_rgb(0, 255, 136);

    visuals.widgets.noninteractive.bg_fill = egui::Color32::from_rgb(30, 42, 35);
    visuals.widgets.inactive.bg_fill = egui::Color32::from_rgb(40, 55, 45);
    visuals.widgets.hovered.bg_fill = egui::Color32::from_rgb(55, 80, 60);
    visuals.widgets.hovered.bg_stroke =
        egui::Stroke::new(1.0, egui::Color32::from_rgb(0, 255, 136));
    visuals.widgets.hovered.expansion = 1.0;
    visuals.widgets.active.bg_fill = egui::Color32::from_rgb(46, 139, 87);

    ctx.set_style(style);
}

/// Render error popup.
fn render_error_popup(ctx: &egui::Context, app_state: &mut AppState) {
    let mut open = true;

    egui::Window::new("Error")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .open(&mut open)
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(10.0);
                if let Some(ref msg) = app_state.error_message {
                    ui.colored_label(egui::Color32::RED, msg);
                }
                ui.add_space(10.0);
                if ui.button("OK").clicked() {
                    app_state.error_message = None;
                }
            });
        });

    if !open {
        app_state.error_message = None;
    }
}

/// Handle keyboard input for overlays and shortcuts.
pub fn handle_keyboard_input(
    keys: Res<ButtonInput<KeyCode>>,
    mut app_state: ResMut<AppState>,
    mut contexts: EguiContexts,
    mut exit: EventWriter<AppExit>,
) {
    let ctx = contexts.ctx_mut();

    let ctrl_pressed = keys.pressed(KeyCode::ControlLeft)
        || keys.pressed(KeyCode::ControlRight)
        || keys.pressed(KeyCode::SuperLeft)
        || keys.pressed(KeyCode::SuperRight);

    if ctrl_pressed && keys.just_pressed(KeyCode::KeyQ) {
        exit.send(AppExit::Success);
        return;
    }

    // Close overlays with Escape
    if keys.just_pressed(KeyCode::Escape) && app_state.overlay != ActiveOverlay::None {
        if app_state.overlay == ActiveOverlay::PlantForm {
            app_state.close_form();
        } else {
            app_state.overlay = ActiveOverlay::None;
        }
        return;
    }

    // Don't handle other shortcuts while the user is typing
    if ctx.wants_keyboard_input() {
        return;
    }

    if keys.just_pressed(KeyCode::F1) || keys.just_pressed(KeyCode::Slash) {
        app_state.toggle_overlay(ActiveOverlay::Help);
    }

    if app_state.overlay == ActiveOverlay::None {
        if keys.just_pressed(KeyCode::KeyF) {
            app_state.open_form();
        }
        if keys.just_pressed(KeyCode::KeyC) {
            app_state.show_connections = !app_state.show_connections;
        }
    }
}
