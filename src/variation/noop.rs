//! Placeholders for variations that cannot be applied safely.
use super::{Entered, Variation};
use crate::context::BuildContext;
use crate::error::VariationError;

/// A registered variation that leaves the context untouched.
///
/// `domain_host` and `user_group` need superuser privileges. `shell` would
/// have to change the login shell of every user on the host.
#[derive(Debug)]
pub struct Placeholder {
    name: &'static str,
}

impl Placeholder {
    pub fn domain_host() -> Self {
        Self {
            name: "domain_host",
        }
    }

    pub fn shell() -> Self {
        Self { name: "shell" }
    }

    pub fn user_group() -> Self {
        Self { name: "user_group" }
    }
}

impl Variation for Placeholder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn enter(&self, context: BuildContext) -> Result<Entered, VariationError> {
        tracing::debug!(variation = self.name, "variation not applied");
        Ok(Entered::pure(context))
    }
}
