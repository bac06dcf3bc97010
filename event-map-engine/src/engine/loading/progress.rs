use bevy::prelude::*;

#[derive(Resource, Default, Debug)]
pub struct LoadingProgress {
    pub config_resolved: bool,
    pub model_requested: bool,
    pub model_ready: bool,
    pub anchors_registered: bool,
}
