//! Adding several components at once.

use crate::{component::Component, error::Result, manager::EntityMut};

/// A tuple of up to eight components, added left to right.
///
/// ```ignore
/// manager.create_entity_with((Position::default(), Velocity::default()))?;
/// ```
pub trait ComponentBundle {
    fn add_to(self, entity: &mut EntityMut<'_>) -> Result<()>;
}

macro_rules! impl_bundle {
    ($($component:ident),+) => {
        impl<$($component: Component),+> ComponentBundle for ($($component,)+) {
            #[allow(non_snake_case)]
            fn add_to(self, entity: &mut EntityMut<'_>) -> Result<()> {
                let ($($component,)+) = self;
                $(entity.add_component($component)?;)+
                Ok(())
            }
        }
    };
}

impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);
