// Standard library and external crates
use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use bevy::render::camera::ClearColorConfig;
use bevy::render::view::RenderLayers;
use bevy_common_assets::json::JsonAssetPlugin;

// Crate engine modules
use crate::engine::anchors::registry::AnchorRegistry;
use crate::engine::anchors::{AnchorsRegistered, ModelReady};
use crate::engine::assets::startup_config::StartupConfig;
use crate::engine::camera::viewport_camera::{
    MainCamera, ViewportCamera, camera_controller, camera_shortcuts,
};
use crate::engine::core::app_state::AppState;
use crate::engine::core::window_config::create_window_config;
use crate::engine::events::ingestion::{
    EventIngestion, InboundEvent, apply_inbound_events, drain_transport_signals, tick_simulator,
};
use crate::engine::events::model::EventModel;
use crate::engine::loading::LoadingPlugin;
use crate::engine::loading::config_loader::{ConfigLoader, start_loading};
use crate::engine::loading::model_loader::{ModelLoader, on_scene_ready};
use crate::engine::loading::progress::LoadingProgress;
use crate::engine::render::markers::{
    MARKER_RENDER_LAYER, MarkerBuffer, MarkerSettings, setup_marker_assets, sync_marker_instances,
};
use crate::engine::render::pulse::{PulseSettings, animate_markers};
use crate::engine::scene::heatmap::{
    HeatRaster, decay_heat_raster, spawn_heat_floor, sync_heat_floor,
};
use crate::engine::scene::xray::{XRayOverlay, apply_xray_mode, sync_xray_companions};
use crate::engine::systems::fps_tracking::fps_notification_system;
use crate::engine::systems::view_mode::{ViewModes, view_mode_system};

// Crate tools modules
use crate::tools::dashboard::{Dashboard, refresh_dashboard};
use crate::tools::picking::picker::pick_on_click;
use crate::tools::picking::targeting::{PointerTarget, retarget_on_double_click, track_pointer_hit};
use crate::tools::selection::{Selection, SelectionChanged};

// Create Web RPC modules
use crate::rpc::web_rpc::WebRpcPlugin;

#[cfg(not(target_arch = "wasm32"))]
use crate::engine::systems::fps_tracking::fps_text_update_system;
#[cfg(not(target_arch = "wasm32"))]
use crate::tools::dashboard::panel::{
    rebuild_anchor_rows, select_anchor_row, spawn_dashboard_panel, update_dashboard_panel,
};
#[cfg(not(target_arch = "wasm32"))]
use crate::tools::selection::deselect_on_escape;

const LOG_FILTER: &str = "info,wgpu=error,naga=warn";

/// Per-frame ordering while running.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameSet {
    /// Pointer, keyboard and camera input.
    Input,
    /// Ingestion, animation, raster decay and overlay maintenance.
    Tick,
    /// Dashboard and notifications reading the settled frame.
    Present,
}

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .init_state::<AppState>()
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        // Registers StartupConfig as a loadable asset type from JSON files.
        .add_plugins(JsonAssetPlugin::<StartupConfig>::new(&["json"]))
        .add_plugins(WebRpcPlugin)
        .add_plugins(LoadingPlugin);

    // Initialise resources early
    app.init_resource::<LoadingProgress>()
        .init_resource::<ConfigLoader>()
        .init_resource::<ModelLoader>()
        .init_resource::<AnchorRegistry>()
        .init_resource::<EventModel>()
        .init_resource::<EventIngestion>()
        .init_resource::<HeatRaster>()
        .init_resource::<MarkerBuffer>()
        .init_resource::<MarkerSettings>()
        .init_resource::<PulseSettings>()
        .init_resource::<ViewModes>()
        .init_resource::<XRayOverlay>()
        .init_resource::<Selection>()
        .init_resource::<PointerTarget>()
        .init_resource::<ViewportCamera>()
        .init_resource::<Dashboard>()
        .insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: 400.0,
            ..default()
        })
        .add_event::<ModelReady>()
        .add_event::<AnchorsRegistered>()
        .add_event::<InboundEvent>()
        .add_event::<SelectionChanged>()
        .add_observer(on_scene_ready);

    app.configure_sets(
        Update,
        (FrameSet::Input, FrameSet::Tick, FrameSet::Present)
            .chain()
            .run_if(in_state(AppState::Running)),
    );

    // State-based system scheduling
    app.add_systems(
        Startup,
        (setup, start_loading, setup_marker_assets, spawn_heat_floor),
    );

    app.add_systems(
        Update,
        (
            view_mode_system,
            pick_on_click,
            retarget_on_double_click,
            track_pointer_hit,
            camera_controller,
        )
            .chain()
            .in_set(FrameSet::Input),
    )
    .add_systems(
        Update,
        (
            drain_transport_signals,
            tick_simulator,
            apply_inbound_events,
            animate_markers,
            decay_heat_raster,
            apply_xray_mode,
            sync_xray_companions,
            sync_marker_instances,
            sync_heat_floor,
        )
            .chain()
            .in_set(FrameSet::Tick),
    )
    .add_systems(
        Update,
        (refresh_dashboard, fps_notification_system).in_set(FrameSet::Present),
    );

    // Keyboard shortcuts and the text panel only exist natively; web hosts use RPC.
    #[cfg(not(target_arch = "wasm32"))]
    {
        app.add_systems(Startup, spawn_dashboard_panel)
            .add_systems(
                Update,
                (camera_shortcuts, deselect_on_escape, select_anchor_row)
                    .after(view_mode_system)
                    .before(pick_on_click)
                    .in_set(FrameSet::Input),
            )
            .add_systems(
                Update,
                (
                    rebuild_anchor_rows,
                    update_dashboard_panel,
                    fps_text_update_system,
                )
                    .chain()
                    .after(refresh_dashboard)
                    .in_set(FrameSet::Present),
            );
    }

    app
}

fn spawn_lighting(commands: &mut Commands) {
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}

/// Scene camera plus a child overlay camera that draws markers over the
/// scene. The overlay clears depth, so markers are never occluded.
fn spawn_cameras(commands: &mut Commands, viewport: &ViewportCamera) {
    commands
        .spawn((
            Camera3d::default(),
            Transform::from_translation(viewport.eye()).with_rotation(viewport.rotation()),
            MainCamera,
        ))
        .with_children(|parent| {
            parent.spawn((
                Camera3d::default(),
                Camera {
                    order: 1,
                    clear_color: ClearColorConfig::None,
                    ..default()
                },
                RenderLayers::layer(MARKER_RENDER_LAYER),
            ));
        });
}

// Startup system that only handles basic initialisation
fn setup(mut commands: Commands, viewport: Res<ViewportCamera>) {
    spawn_lighting(&mut commands);
    spawn_cameras(&mut commands, &viewport);
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    let log_config = LogPlugin {
        filter: LOG_FILTER.to_string(),
        level: Level::INFO,
        ..default()
    };

    DefaultPlugins
        .set(window_config)
        .set(asset_config)
        .set(log_config)
}
