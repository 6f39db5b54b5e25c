//! Interface bases, interface chains and a declared name.

use mbe_ecs::{Component, EntityManager};

trait Drawable {
    fn layer(&self) -> i32;
}

trait Animated: Drawable {
    fn frames(&self) -> u32;
}

#[derive(Component)]
#[component(name = "sprite", bases(dyn Drawable))]
struct Sprite {
    layer: i32,
}

impl Drawable for Sprite {
    fn layer(&self) -> i32 {
        self.layer
    }
}

#[derive(Component)]
#[component(bases(dyn Animated => dyn Drawable))]
struct Flipbook {
    frames: u32,
}

impl Drawable for Flipbook {
    fn layer(&self) -> i32 {
        1
    }
}

impl Animated for Flipbook {
    fn frames(&self) -> u32 {
        self.frames
    }
}

fn main() {
    assert_eq!(<Sprite as Component>::type_name(), "sprite");

    let mut manager = EntityManager::new();
    let id = manager.create_entity_with((Sprite { layer: 2 },)).unwrap();
    let book = manager.create_entity_with((Flipbook { frames: 8 },)).unwrap();

    assert_eq!(manager.get_component_group::<dyn Drawable>(), &[id, book]);
    assert_eq!(manager.get_component_group::<dyn Animated>(), &[book]);

    let drawable = manager.entity(id).unwrap().get_component::<dyn Drawable>().unwrap();
    assert_eq!(drawable.layer(), 2);

    let entity = manager.entity(book).unwrap();
    assert_eq!(entity.get_component::<dyn Animated>().unwrap().frames(), 8);
    assert_eq!(entity.get_component::<dyn Drawable>().unwrap().layer(), 1);
}
