use bevy::asset::LoadState;
use bevy::prelude::*;

use crate::engine::assets::startup_config::{STARTUP_CONFIG_PATH, StartupConfig};
use crate::engine::core::error::EngineError;
use crate::engine::loading::progress::LoadingProgress;

#[derive(Resource, Default)]
pub struct ConfigLoader {
    handle: Option<Handle<StartupConfig>>,
}

// Start the loading process
pub fn start_loading(mut config_loader: ResMut<ConfigLoader>, asset_server: Res<AssetServer>) {
    config_loader.handle = Some(asset_server.load(STARTUP_CONFIG_PATH));
}

/// Publish the loaded configuration as a resource, or defaults if it failed.
pub fn resolve_startup_config(
    mut commands: Commands,
    mut loading_progress: ResMut<LoadingProgress>,
    config_loader: Res<ConfigLoader>,
    asset_server: Res<AssetServer>,
    configs: Res<Assets<StartupConfig>>,
) {
    if loading_progress.config_resolved {
        return;
    }
    let Some(handle) = config_loader.handle.as_ref() else {
        return;
    };

    if let Some(config) = configs.get(handle) {
        info!("✓ Startup config loaded: {:?}", config);
        commands.insert_resource(config.clone().normalized());
        loading_progress.config_resolved = true;
        return;
    }

    if let Some(LoadState::Failed(err)) = asset_server.get_load_state(handle) {
        let err = EngineError::Config(err.to_string());
        warn!("{}; continuing with defaults", err);
        commands.insert_resource(StartupConfig::default());
        loading_progress.config_resolved = true;
    }
}
