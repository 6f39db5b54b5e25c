#![allow(dead_code)]

use mbe_ecs::Component;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub trait Drawable {
    fn layer(&self) -> i32;
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Component, Debug)]
#[component(name = "renderable", bases(dyn Drawable))]
pub struct Renderable {
    pub layer: i32,
}

impl Drawable for Renderable {
    fn layer(&self) -> i32 {
        self.layer
    }
}
