//! Startup loading: configuration first, then the model scene.
//!
//! Both stages degrade instead of failing. A missing config falls back to
//! defaults and a model that cannot load completes with zero anchors.

/// Startup config asset loading with a default fallback.
pub mod config_loader;

/// glTF scene spawning and readiness reporting.
pub mod model_loader;

/// Loading progress flags driving the transition to the running state.
pub mod progress;

use bevy::prelude::*;

use crate::engine::anchors::build_anchor_registry;
use crate::engine::core::app_state::{AppState, transition_to_running};
use crate::engine::events::ingestion::start_event_ingestion;
use config_loader::resolve_startup_config;
use model_loader::{spawn_model, watch_model_load};

/// Per-frame loading chain. Every stage after the first waits for the
/// startup config resource, which only exists once the config resolved.
pub struct LoadingPlugin;

impl Plugin for LoadingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                resolve_startup_config,
                spawn_model,
                watch_model_load,
                build_anchor_registry,
                start_event_ingestion,
                transition_to_running,
            )
                .chain()
                .run_if(in_state(AppState::Loading)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::anchors::registry::AnchorRegistry;
    use crate::engine::anchors::{AnchorsRegistered, ModelReady, ModelRoot};
    use crate::engine::assets::startup_config::StartupConfig;
    use crate::engine::camera::viewport_camera::ViewportCamera;
    use crate::engine::events::ingestion::{ConnectionStatus, EventIngestion};
    use crate::engine::events::model::EventModel;
    use crate::engine::render::markers::MarkerBuffer;
    use crate::engine::render::pulse::PulseSettings;
    use crate::engine::scene::xray::XRayOverlay;
    use bevy::state::app::StatesPlugin;
    use config_loader::ConfigLoader;
    use model_loader::ModelLoader;
    use progress::LoadingProgress;

    fn loading_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default(), StatesPlugin))
            .init_asset::<StartupConfig>()
            .init_asset::<Mesh>()
            .init_asset::<StandardMaterial>()
            .init_state::<AppState>()
            .add_event::<ModelReady>()
            .add_event::<AnchorsRegistered>()
            .init_resource::<LoadingProgress>()
            .init_resource::<ConfigLoader>()
            .init_resource::<ModelLoader>()
            .init_resource::<PulseSettings>()
            .init_resource::<MarkerBuffer>()
            .init_resource::<XRayOverlay>()
            .init_resource::<ViewportCamera>()
            .init_resource::<AnchorRegistry>()
            .init_resource::<EventModel>()
            .init_resource::<EventIngestion>()
            .add_plugins(LoadingPlugin);
        app
    }

    fn state(app: &App) -> AppState {
        *app.world().resource::<State<AppState>>().get()
    }

    #[test]
    fn frames_before_config_resolves_keep_loading() {
        let mut app = loading_app();
        for _ in 0..3 {
            app.update();
        }
        assert!(!app.world().contains_resource::<StartupConfig>());
        assert!(!app.world().resource::<LoadingProgress>().anchors_registered);
        assert_eq!(state(&app), AppState::Loading);
    }

    #[test]
    fn model_ready_completes_loading() {
        let mut app = loading_app();
        app.update();

        // Stand in for a resolved config and a spawned scene.
        app.insert_resource(StartupConfig::default());
        {
            let mut progress = app.world_mut().resource_mut::<LoadingProgress>();
            progress.config_resolved = true;
            progress.model_requested = true;
            progress.model_ready = true;
        }
        let world = app.world_mut();
        let root = world.spawn((Transform::default(), ModelRoot)).id();
        let cam = world
            .spawn((Name::new("CCTV_7"), Transform::from_xyz(1.0, 2.0, 3.0)))
            .id();
        world.entity_mut(root).add_child(cam);
        world.send_event(ModelReady { root: Some(root) });

        app.update();
        assert_eq!(app.world().resource::<AnchorRegistry>().lookup("CCTV_7"), Some(0));
        assert_eq!(
            app.world().resource::<EventIngestion>().status(),
            ConnectionStatus::Simulating
        );

        app.update();
        assert_eq!(state(&app), AppState::Running);
    }
}
