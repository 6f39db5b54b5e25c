//! Components without options, including generic ones.

use mbe_ecs::{Component, EntityManager};

#[derive(Component)]
struct Health(u32);

#[derive(Component)]
struct Tagged<T> {
    value: T,
}

fn main() {
    let mut manager = EntityManager::new();
    let id = manager
        .create_entity_with((Health(10), Tagged { value: "boss" }))
        .unwrap();

    let entity = manager.entity(id).unwrap();
    assert_eq!(entity.get_component::<Health>().unwrap().0, 10);
    assert_eq!(entity.get_component::<Tagged<&str>>().unwrap().value, "boss");
}
