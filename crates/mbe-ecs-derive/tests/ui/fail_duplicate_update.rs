//! A component has a single update function.

use mbe_ecs::Component;

#[derive(Component)]
#[component(update = Self::tick, update = Self::tock)]
struct Health;

fn main() {
    let _health = Health;
}
