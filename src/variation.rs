//! Variations: named, scoped transformations of a build context.
//!
//! Each variation simulates one real-world source of build non-determinism.
//! Entering a variation yields the transformed context plus an optional
//! release handle; the pipeline calls the handle when the scope ends.
use crate::context::BuildContext;
use crate::error::VariationError;

mod command;
mod env;
mod fileordering;
mod noop;

pub use command::{Kernel, Umask};
pub use env::{CapturesEnvironment, Home, Locales, PathSuffix, Timezone};
pub use fileordering::FileOrdering;
pub use noop::Placeholder;

/// A scoped transformation of a [`BuildContext`].
pub trait Variation: Send + Sync {
    fn name(&self) -> &'static str;

    /// Transform `context` for the lifetime of a scope.
    ///
    /// Anything allocated here must be released through the returned
    /// [`Entered::release`] handle rather than on drop.
    fn enter(&self, context: BuildContext) -> Result<Entered, VariationError>;
}

/// Releases whatever a variation acquired on entry.
pub trait Release {
    fn release(self: Box<Self>) -> Result<(), VariationError>;
}

pub struct Entered {
    pub context: BuildContext,
    pub release: Option<Box<dyn Release>>,
}

impl Entered {
    /// A variation that only rewrote the context.
    pub fn pure(context: BuildContext) -> Self {
        Self {
            context,
            release: None,
        }
    }

    pub fn with_release(context: BuildContext, release: Box<dyn Release>) -> Self {
        Self {
            context,
            release: Some(release),
        }
    }
}
