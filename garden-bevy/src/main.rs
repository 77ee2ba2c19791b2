//! Memory Garden - a 3D journal where memories grow as trees.
//!
//! This application renders the garden described by `garden-core` with Bevy
//! and draws its interface with egui. It features:
//! - Eight emotion zones arranged in a ring, each with its own decorations
//! - First-person walking with zone-tinted fog, sky and ambient tones
//! - Planting memories with optional AI emotion detection and completion
//! - Thematic connection lines between related memories

mod audio;
mod camera;
mod effects;
mod runtime;
mod state;
mod ui;
mod world;

use anyhow::Context;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use garden_core::GardenConfig;

use crate::audio::AmbientAudioPlugin;
use crate::effects::GardenNotice;
use crate::state::{AppState, Garden};
use crate::world::TreeSync;

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = GardenConfig::from_env().context("invalid garden configuration")?;

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Memory Garden".into(),
                        resolution: (1280., 800.).into(),
                        resizable: true,
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    filter: "info,wgpu=error,naga=warn,garden_core=debug".into(),
                    ..default()
                }),
        )
        .add_plugins(EguiPlugin)
        .add_plugins(AmbientAudioPlugin)
        .add_event::<GardenNotice>()
        // App state
        .insert_resource(Garden::new(config))
        .init_resource::<AppState>()
        .init_resource::<TreeSync>()
        .insert_resource(ClearColor(Color::srgb_u8(0x87, 0xCE, 0xEB)))
        // Startup systems
        .add_systems(Startup, world::setup_scene)
        // Update systems - UI
        .add_systems(Update, (ui::main_ui_system, ui::handle_keyboard_input))
        // Update systems - garden loop
        .add_systems(
            Update,
            (
                camera::handle_garden_input,
                camera::tick_garden,
                effects::handle_garden_notices,
                camera::sync_camera,
                world::sync_trees,
                world::draw_connections,
            )
                .chain()
                .after(ui::main_ui_system),
        )
        // Update systems - AI requests and housekeeping
        .add_systems(Update, (state::poll_ai_requests, state::clear_old_status))
        .add_systems(Last, state::dispose_on_exit)
        .run();

    Ok(())
}
