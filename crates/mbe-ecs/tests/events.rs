//! Lifecycle events and events raised by components.

mod common;

use std::{cell::RefCell, rc::Rc, time::Duration};

use common::{Position, init_tracing};
use mbe_ecs::{
    Component, ComponentValueChanged, ComponentsChanged, EntityCreated, EntityId, EntityManager,
    EntityRemoved, EventBus, Frame, ManagerConfig,
};
use mbe_event::{EventLogger, LogOutput};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Clicked {
    entity: EntityId,
}

#[derive(Component)]
#[component(update = Self::drain)]
struct Health {
    current: u32,
}

impl Health {
    fn drain(&mut self, frame: &Frame<'_>) {
        if self.current > 0 {
            self.current -= 1;
            frame
                .events
                .raise(&ComponentValueChanged::<Health>::new(frame.owner, "Current"));
        }
    }
}

fn record<E: Clone + 'static>(bus: &EventBus) -> Rc<RefCell<Vec<E>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    bus.subscribe(move |event: &E| sink.borrow_mut().push(event.clone()));
    seen
}

#[test]
fn test_clicked_scenario() {
    init_tracing();
    let mut manager = EntityManager::new();
    let a = manager.create_entity();
    let bus = manager.events().clone();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let cb = bus.subscribe(move |event: &Clicked| sink.borrow_mut().push(event.entity));

    bus.raise(&Clicked { entity: a });
    assert_eq!(*seen.borrow(), vec![a]);

    assert!(bus.unsubscribe::<Clicked>(cb));
    bus.raise(&Clicked { entity: a });
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn test_lifecycle_events() {
    let mut manager = EntityManager::new();
    let created = record::<EntityCreated>(manager.events());
    let changed = record::<ComponentsChanged>(manager.events());
    let removed = record::<EntityRemoved>(manager.events());

    let id = manager.create_entity();
    manager
        .entity_mut(id)
        .unwrap()
        .add_component(Position { x: 0.0, y: 0.0 })
        .unwrap();
    manager.destroy(id).unwrap();
    assert!(removed.borrow().is_empty());
    manager.commit_pending_removals();

    assert_eq!(*created.borrow(), vec![EntityCreated { entity: id }]);
    assert_eq!(*changed.borrow(), vec![ComponentsChanged { entity: id }]);
    assert_eq!(*removed.borrow(), vec![EntityRemoved { entity: id }]);
}

#[test]
fn test_components_raise_value_changes_during_update() {
    let bus = EventBus::new();
    let mut manager = EntityManager::with_events(ManagerConfig::default(), bus.clone());
    let changes = record::<ComponentValueChanged<Health>>(&bus);

    let alive = manager.create_entity_with((Health { current: 1 },)).unwrap();
    let doomed = manager.create_entity_with((Health { current: 5 },)).unwrap();
    manager.destroy(doomed).unwrap();

    manager.update(Duration::from_millis(16));
    manager.update(Duration::from_millis(16));

    let changes = changes.borrow();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].entity(), alive);
    assert!(changes[0].is_value_changed("current"));
}

#[test]
fn test_logger_writes_lifecycle_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("entities.log");
    let mut manager = EntityManager::new();

    let id = {
        let mut logger = EventLogger::with_file(manager.events(), &path).unwrap();
        logger.subscribe::<EntityCreated>(LogOutput::FILE);
        let id = manager.create_entity();
        assert_eq!(manager.events().subscriber_count::<EntityCreated>(), 1);
        id
    };

    manager.create_entity();
    assert_eq!(manager.events().subscriber_count::<EntityCreated>(), 0);

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 1);
    assert!(contents.contains(&format!("{id:?}")));
}
