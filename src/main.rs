use bevy::prelude::*;

mod setup;
mod input;
mod actions;
mod clouds;

use actions::ActionState;
use clouds::{CloudSet, CloudStartupSet, CloudsPlugin};
use input::{camera_controller, input_mapping_system};

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .insert_resource(ClearColor(Color::srgb(0.45, 0.65, 0.90)))
        // domain plugin: builds, animates and draws the cloud field
        .add_plugins(CloudsPlugin)
        .init_resource::<ActionState>()
        // camera (the cloud observer) must exist before the field is built
        .add_systems(Startup, setup::setup.before(CloudStartupSet::Build))
        // input + camera each frame, before the clouds read the observer
        .add_systems(
            Update,
            (input_mapping_system, camera_controller.after(input_mapping_system))
                .before(CloudSet::Drive),
        )
        .run();
}
