//! Component type registry and the per-component base tables.
//!
//! Each component type records, in its own [`ComponentBases`], which types
//! it can also be looked up as. An edge `Derived -> Base` carries an upcast
//! from a pointer to the derived type to a pointer to the base, which is
//! usually an unsizing coercion to `dyn Trait`. Edges may also start at one
//! of the component's bases (`dyn Animated -> dyn Drawable`), but they only
//! ever apply to the component that declared them. Adding a component walks
//! its table from the concrete type and produces one typed view of the
//! instance per ancestor.

use std::any::{Any, TypeId};

use rustc_hash::FxHashMap;
use smallvec::{SmallVec, smallvec};
use tracing::{debug, trace, warn};

use crate::component::{Component, ComponentTypeId};

/// Type-erased `*mut T` for some component or interface type `T`.
pub(crate) type View = Box<dyn Any>;

type Upcast = Box<dyn Fn(&dyn Any) -> Option<View>>;

struct BaseEdge {
    base: ComponentTypeId,
    upcast: Upcast,
}

/// Base relations declared by one component type.
///
/// Filled in by [`Component::declare_bases`], usually through the
/// [`declare_bases!`](crate::declare_bases) macro.
#[derive(Default)]
pub struct ComponentBases {
    edges: FxHashMap<ComponentTypeId, SmallVec<[BaseEdge; 2]>>,
}

impl ComponentBases {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `D` can be looked up as `B`.
    ///
    /// Declaring the same edge twice, or an edge from a type to itself, is
    /// ignored and returns `false`. Prefer the [`declare_bases!`] macro,
    /// which only ever passes coercions.
    ///
    /// # Safety
    ///
    /// `upcast` must return a pointer to the object it was given (or to a
    /// part of it) that is valid for reads and writes as a `B` for as long
    /// as the argument is.
    ///
    /// [`declare_bases!`]: crate::declare_bases
    pub unsafe fn declare_base<D, B>(&mut self, upcast: fn(*mut D) -> *mut B) -> bool
    where
        D: ?Sized + 'static,
        B: ?Sized + 'static,
    {
        let derived = ComponentTypeId::of::<D>();
        let base = ComponentTypeId::of::<B>();

        if derived == base {
            warn!(component = derived.name(), "ignored base declaration on itself");
            return false;
        }

        let edges = self.edges.entry(derived).or_default();
        if edges.iter().any(|edge| edge.base == base) {
            trace!(derived = derived.name(), base = base.name(), "base already declared");
            return false;
        }

        edges.push(BaseEdge {
            base,
            upcast: Box::new(move |view: &dyn Any| {
                view.downcast_ref::<*mut D>()
                    .map(|&ptr| Box::new(upcast(ptr)) as View)
            }),
        });
        debug!(derived = derived.name(), base = base.name(), "declared base");
        true
    }

    /// Direct bases declared for `ty`.
    pub fn bases_of(&self, ty: ComponentTypeId) -> impl Iterator<Item = ComponentTypeId> + '_ {
        self.edges
            .get(&ty)
            .into_iter()
            .flat_map(|edges| edges.iter().map(|edge| edge.base))
    }

    /// `ty` followed by every type reachable through these declarations.
    #[must_use]
    pub fn closure(&self, ty: ComponentTypeId) -> Vec<ComponentTypeId> {
        self.walk(ty, (), |_, _| Some(()))
            .into_iter()
            .map(|(key, ())| key)
            .collect()
    }

    /// Number of declared edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(SmallVec::len).sum()
    }

    fn views<C: Component>(&self, ptr: *mut C) -> Vec<(ComponentTypeId, View)> {
        let root: View = Box::new(ptr);
        self.walk(ComponentTypeId::of_component::<C>(), root, |edge, view| {
            (edge.upcast)(&**view)
        })
    }

    /// Depth-first walk over declared bases, visiting each type once.
    fn walk<P>(
        &self,
        root: ComponentTypeId,
        payload: P,
        step: impl Fn(&BaseEdge, &P) -> Option<P>,
    ) -> Vec<(ComponentTypeId, P)> {
        let mut visited: SmallVec<[ComponentTypeId; 8]> = smallvec![root];
        let mut stack = vec![(root, payload)];
        let mut out = Vec::new();

        while let Some((ty, payload)) = stack.pop() {
            if let Some(edges) = self.edges.get(&ty) {
                // Reversed so the first declared base is visited first.
                for edge in edges.iter().rev() {
                    if visited.contains(&edge.base) {
                        continue;
                    }
                    let Some(next) = step(edge, &payload) else {
                        debug_assert!(false, "upcast from {} received a foreign view", ty.name());
                        continue;
                    };
                    visited.push(edge.base);
                    stack.push((edge.base, next));
                }
            }
            out.push((ty, payload));
        }

        out
    }
}

impl std::fmt::Debug for ComponentBases {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentBases")
            .field("edges", &self.edge_count())
            .finish()
    }
}

/// Base tables of every component type added through a manager.
///
/// Owned by an [`EntityManager`](crate::EntityManager); there is no global
/// table, so independent managers never share state. A component's keys
/// depend only on its own [`Component::declare_bases`], never on which other
/// component types were registered before it.
#[derive(Default)]
pub struct ComponentRegistry {
    tables: FxHashMap<TypeId, ComponentBases>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `C::declare_bases` unless it already ran for this registry.
    ///
    /// Returns `true` the first time.
    pub fn register<C: Component>(&mut self) -> bool {
        if self.tables.contains_key(&TypeId::of::<C>()) {
            return false;
        }
        let mut bases = ComponentBases::new();
        C::declare_bases(&mut bases);
        trace!(
            component = C::type_name(),
            edges = bases.edge_count(),
            "registered component type"
        );
        self.tables.insert(TypeId::of::<C>(), bases);
        true
    }

    /// Whether `C::declare_bases` has run for this registry.
    #[must_use]
    pub fn is_registered<C: Component>(&self) -> bool {
        self.tables.contains_key(&TypeId::of::<C>())
    }

    /// Declarations of a registered component type.
    #[must_use]
    pub fn bases<C: Component>(&self) -> Option<&ComponentBases> {
        self.tables.get(&TypeId::of::<C>())
    }

    /// Every key a component of type `component` is registered under, its
    /// own first. Unregistered types only have their own key.
    #[must_use]
    pub fn closure(&self, component: ComponentTypeId) -> Vec<ComponentTypeId> {
        match self.tables.get(&component.type_id()) {
            Some(bases) => bases.closure(component),
            None => vec![component],
        }
    }

    /// Whether a component of type `component` can be looked up as `base`.
    #[must_use]
    pub fn is_derived_from(&self, component: ComponentTypeId, base: ComponentTypeId) -> bool {
        component != base && self.closure(component).contains(&base)
    }

    /// Number of declared edges over all registered component types.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.tables.values().map(ComponentBases::edge_count).sum()
    }

    /// One view of the component at `ptr` per key in its closure, its own
    /// key first.
    pub(crate) fn views<C: Component>(&self, ptr: *mut C) -> Vec<(ComponentTypeId, View)> {
        match self.tables.get(&TypeId::of::<C>()) {
            Some(bases) => bases.views(ptr),
            None => vec![(ComponentTypeId::of_component::<C>(), Box::new(ptr) as View)],
        }
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("registered", &self.tables.len())
            .field("edges", &self.edge_count())
            .finish()
    }
}

/// Declare base types of a component through unsizing coercions.
///
/// ```ignore
/// declare_bases!(bases, Sprite => dyn Drawable, dyn Named);
/// // Interfaces may derive from interfaces (`trait Animated: Drawable`).
/// declare_bases!(bases, dyn Animated => dyn Drawable);
/// ```
#[macro_export]
macro_rules! declare_bases {
    ($bases:expr, $derived:ty => $($base:ty),+ $(,)?) => {{
        let bases: &mut $crate::ComponentBases = $bases;
        $(
            // SAFETY: the upcast is a pointer coercion of its argument.
            unsafe {
                bases.declare_base::<$derived, $base>(|ptr: *mut $derived| -> *mut $base { ptr });
            }
        )+
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Shape {
        fn area(&self) -> f32;
    }

    trait Named {
        fn name(&self) -> &str;
    }

    trait Labelled: Named {}

    struct Square(f32);

    impl Shape for Square {
        fn area(&self) -> f32 {
            self.0 * self.0
        }
    }

    impl Named for Square {
        fn name(&self) -> &str {
            "square"
        }
    }

    impl Labelled for Square {}

    impl Component for Square {
        fn declare_bases(bases: &mut ComponentBases) {
            declare_bases!(bases, Square => dyn Shape, dyn Labelled);
            declare_bases!(bases, dyn Labelled => dyn Named);
        }
    }

    struct Tag;

    impl Named for Tag {
        fn name(&self) -> &str {
            "tag"
        }
    }

    impl Labelled for Tag {}

    impl Component for Tag {
        fn declare_bases(bases: &mut ComponentBases) {
            declare_bases!(bases, Tag => dyn Labelled);
        }
    }

    fn key<T: ?Sized + 'static>() -> ComponentTypeId {
        ComponentTypeId::of::<T>()
    }

    #[test]
    fn test_register_runs_once() {
        let mut registry = ComponentRegistry::new();
        assert!(registry.register::<Square>());
        assert!(!registry.register::<Square>());
        assert!(registry.is_registered::<Square>());
        assert_eq!(registry.edge_count(), 3);
    }

    #[test]
    fn test_duplicate_and_self_edges_ignored() {
        let mut bases = ComponentBases::new();
        declare_bases!(&mut bases, Square => dyn Shape, dyn Shape);
        assert_eq!(bases.edge_count(), 1);

        // SAFETY: identity.
        let added = unsafe { bases.declare_base::<Square, Square>(|ptr| ptr) };
        assert!(!added);
    }

    #[test]
    fn test_closure_walks_chain() {
        let mut registry = ComponentRegistry::new();
        registry.register::<Square>();

        let closure = registry.closure(key::<Square>());
        assert_eq!(closure[0], key::<Square>());
        assert_eq!(closure.len(), 4);
        assert!(closure.contains(&key::<dyn Named>()));

        let bases = registry.bases::<Square>().unwrap();
        assert!(bases.closure(key::<dyn Labelled>()).contains(&key::<dyn Named>()));
        assert_eq!(bases.bases_of(key::<Square>()).count(), 2);

        assert!(registry.is_derived_from(key::<Square>(), key::<dyn Named>()));
        assert!(!registry.is_derived_from(key::<dyn Shape>(), key::<Square>()));
        assert!(!registry.is_derived_from(key::<Square>(), key::<Square>()));
    }

    #[test]
    fn test_interface_edges_stay_with_their_component() {
        let mut registry = ComponentRegistry::new();
        registry.register::<Tag>();
        let before = registry.closure(key::<Tag>());

        registry.register::<Square>();
        let after = registry.closure(key::<Tag>());

        assert_eq!(before, vec![key::<Tag>(), key::<dyn Labelled>()]);
        assert_eq!(after, before);
        assert!(!registry.is_derived_from(key::<Tag>(), key::<dyn Named>()));
        assert!(registry.is_derived_from(key::<Square>(), key::<dyn Named>()));
    }

    #[test]
    fn test_unregistered_component_has_only_its_own_key() {
        let registry = ComponentRegistry::new();
        assert_eq!(registry.closure(key::<Square>()), vec![key::<Square>()]);
        assert!(registry.bases::<Square>().is_none());
    }

    #[test]
    fn test_views_point_at_instance() {
        let mut registry = ComponentRegistry::new();
        registry.register::<Square>();

        let ptr = Box::into_raw(Box::new(Square(3.0)));
        let views = registry.views(ptr);
        assert_eq!(views.len(), 4);

        for (ty, view) in &views {
            if *ty == key::<dyn Shape>() {
                let shape = *view.downcast_ref::<*mut dyn Shape>().unwrap();
                // SAFETY: `ptr` is live until the end of the test.
                assert!((unsafe { &*shape }.area() - 9.0).abs() < f32::EPSILON);
            }
            if *ty == key::<dyn Named>() {
                let named = *view.downcast_ref::<*mut dyn Named>().unwrap();
                // SAFETY: as above.
                assert_eq!(unsafe { &*named }.name(), "square");
            }
        }

        // SAFETY: allocated by `Box::into_raw` above, no views used after.
        drop(unsafe { Box::from_raw(ptr) });
    }

    #[test]
    fn test_cyclic_declarations_terminate() {
        trait A {}
        trait B {}
        impl A for Square {}
        impl B for Square {}

        let mut bases = ComponentBases::new();
        // SAFETY: only keys are walked, the upcasts never run.
        unsafe {
            bases.declare_base::<dyn A, dyn B>(|_| std::ptr::null_mut::<Square>());
            bases.declare_base::<dyn B, dyn A>(|_| std::ptr::null_mut::<Square>());
        }

        assert_eq!(bases.closure(key::<dyn A>()), vec![key::<dyn A>(), key::<dyn B>()]);
    }
}
