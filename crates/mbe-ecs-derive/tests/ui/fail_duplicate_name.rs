//! A component can only be named once.

use mbe_ecs::Component;

#[derive(Component)]
#[component(name = "first", name = "second")]
struct Health;

fn main() {
    let _health = Health;
}
