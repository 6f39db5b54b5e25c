//! Declared names must not be blank.

use mbe_ecs::Component;

#[derive(Component)]
#[component(name = "  ")]
struct Health;

fn main() {
    let _health = Health;
}
