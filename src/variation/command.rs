//! Variations that wrap B's command.
use super::{Entered, Variation};
use crate::context::{BuildContext, CommandToken};
use crate::error::VariationError;

pub const KERNEL_WRAPPER: [&str; 2] = ["linux64", "--uname-2.6"];
pub const UMASK_B: &str = "0002";

/// Runs B under a personality that reports a different kernel release.
#[derive(Debug, Default)]
pub struct Kernel;

impl Variation for Kernel {
    fn name(&self) -> &'static str {
        "kernel"
    }

    fn enter(&self, mut context: BuildContext) -> Result<Entered, VariationError> {
        context
            .b
            .wrap_command(KERNEL_WRAPPER.iter().map(|word| CommandToken::word(*word)));
        Ok(Entered::pure(context))
    }
}

/// Runs B after an inline `umask` statement.
#[derive(Debug, Default)]
pub struct Umask;

impl Variation for Umask {
    fn name(&self) -> &'static str {
        "umask"
    }

    fn enter(&self, mut context: BuildContext) -> Result<Entered, VariationError> {
        context.b.wrap_command([
            CommandToken::word("umask"),
            CommandToken::word(UMASK_B),
            CommandToken::raw(";"),
        ]);
        Ok(Entered::pure(context))
    }
}
