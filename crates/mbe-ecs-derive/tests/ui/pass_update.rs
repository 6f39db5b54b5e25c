//! A custom update function.

use std::time::Duration;

use mbe_ecs::{Component, EntityManager, Frame};

#[derive(Component)]
#[component(update = Self::tick)]
struct Timer {
    elapsed: Duration,
}

impl Timer {
    fn tick(&mut self, frame: &Frame<'_>) {
        self.elapsed += frame.delta;
    }
}

fn main() {
    let mut manager = EntityManager::new();
    let id = manager
        .create_entity_with((Timer { elapsed: Duration::ZERO },))
        .unwrap();

    manager.update(Duration::from_millis(16));
    manager.update(Duration::from_millis(16));

    let timer = manager.entity(id).unwrap().get_component::<Timer>().unwrap();
    assert_eq!(timer.elapsed, Duration::from_millis(32));
}
