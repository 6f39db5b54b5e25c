//! Bases must be reachable from the component by a coercion.

use mbe_ecs::Component;

trait Drawable {}

#[derive(Component)]
#[component(bases(dyn Drawable))]
struct Sprite;

fn main() {
    let _sprite = Sprite;
}
