//! Unknown options are rejected.

use mbe_ecs::Component;

#[derive(Component)]
#[component(opaque)]
struct Health;

fn main() {
    let _health = Health;
}
