//! Generational handles for objects owned by a registry.
//!
//! Each object type gets its own [`HandleRegistry`]. The registry stores the
//! objects and issues [`Handle`]s: small `Copy` values that resolve back to
//! the object while it is alive and report staleness afterwards.
//!
//! # Key Concepts
//!
//! - **Handle**: `(index, generation)`; never aliases two live objects
//! - **Null handle**: [`Handle::NULL`], the "no object" sentinel
//! - **Validation**: how strictly [`HandleRegistry::get_or_fail`] checks
//!
//! ```ignore
//! let mut textures = HandleRegistry::new();
//! let grass = textures.issue(Texture::load("grass.png"));
//!
//! assert!(grass.valid(&textures));
//! textures.release(grass);
//! assert!(textures.resolve(grass).is_none());
//! ```
//!
//! Registries are plain values owned by whoever needs them; there is no
//! process-wide state, so independent worlds never share ids.

mod error;
mod handle;
mod registry;
mod validation;

pub use error::{HandleError, HandleResult};
pub use handle::{Generation, Handle};
pub use registry::HandleRegistry;
pub use validation::{ParseValidationError, Validation};
