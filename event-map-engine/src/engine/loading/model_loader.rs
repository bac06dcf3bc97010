use bevy::asset::LoadState;
use bevy::prelude::*;
use bevy::scene::SceneInstanceReady;

use crate::engine::anchors::{ModelReady, ModelRoot};
use crate::engine::assets::startup_config::StartupConfig;
use crate::engine::core::error::EngineError;
use crate::engine::loading::progress::LoadingProgress;

#[derive(Resource, Default)]
pub struct ModelLoader {
    handle: Option<Handle<Scene>>,
    path: String,
}

/// Spawn the configured glTF scene once the startup config is known.
pub fn spawn_model(
    mut commands: Commands,
    mut loading_progress: ResMut<LoadingProgress>,
    mut model_loader: ResMut<ModelLoader>,
    config: Option<Res<StartupConfig>>,
    asset_server: Res<AssetServer>,
) {
    if loading_progress.model_requested {
        return;
    }
    let Some(config) = config else {
        return;
    };

    info!("Loading model {}", config.model);
    let handle = asset_server.load(GltfAssetLabel::Scene(0).from_asset(config.model.clone()));
    commands.spawn((SceneRoot(handle.clone()), ModelRoot));
    model_loader.handle = Some(handle);
    model_loader.path = config.model.clone();
    loading_progress.model_requested = true;
}

/// A model that fails to load still completes loading, with no anchors.
pub fn watch_model_load(
    mut loading_progress: ResMut<LoadingProgress>,
    model_loader: Res<ModelLoader>,
    asset_server: Res<AssetServer>,
    mut ready: EventWriter<ModelReady>,
) {
    if loading_progress.model_ready {
        return;
    }
    let Some(handle) = model_loader.handle.as_ref() else {
        return;
    };
    if let Some(LoadState::Failed(err)) = asset_server.get_load_state(handle) {
        let err = EngineError::ModelLoad {
            path: model_loader.path.clone(),
            reason: err.to_string(),
        };
        error!("{}", err);
        loading_progress.model_ready = true;
        ready.write(ModelReady { root: None });
    }
}

/// Observer fired when a scene finishes spawning its entities.
pub fn on_scene_ready(
    trigger: Trigger<SceneInstanceReady>,
    roots: Query<(), With<ModelRoot>>,
    mut loading_progress: ResMut<LoadingProgress>,
    mut ready: EventWriter<ModelReady>,
) {
    let root = trigger.target();
    if loading_progress.model_ready || !roots.contains(root) {
        return;
    }
    info!("✓ Model scene spawned");
    loading_progress.model_ready = true;
    ready.write(ModelReady { root: Some(root) });
}
