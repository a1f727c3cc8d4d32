//! Composes selected variations over a build context.
//!
//! Scopes are entered in list order and released in strict reverse order,
//! whether the caller's work succeeds, fails, or panics. This is what keeps
//! the fileordering overlay from outliving the run.
use crate::context::BuildContext;
use crate::error::{CheckError, VariationError};
use crate::registry::VariationRegistry;
use crate::variation::Release;

/// A validated, ordered selection of variations.
pub struct Pipeline<'r> {
    registry: &'r VariationRegistry,
    selected: Vec<&'static str>,
}

impl<'r> Pipeline<'r> {
    /// Validate `selected` against the registry without touching anything.
    ///
    /// Names are applied in the order given; use
    /// [`VariationRegistry::resolve`] to get canonical order first.
    pub fn new<S: AsRef<str>>(
        registry: &'r VariationRegistry,
        selected: &[S],
    ) -> Result<Self, CheckError> {
        let mut names: Vec<&'static str> = Vec::with_capacity(selected.len());
        for name in selected {
            let name = registry.get(name.as_ref())?.name();
            if names.contains(&name) {
                return Err(CheckError::Config(format!(
                    "variation {name} selected more than once"
                )));
            }
            names.push(name);
        }
        Ok(Self {
            registry,
            selected: names,
        })
    }

    pub fn selected(&self) -> &[&'static str] {
        &self.selected
    }

    /// Enter every selected variation, threading the context through.
    ///
    /// If a variation fails to enter, the ones already entered are released
    /// before the error is returned.
    pub fn enter(&self, initial: BuildContext) -> Result<Applied, CheckError> {
        let mut scopes = ScopeStack::default();
        let mut context = initial;
        for &name in &self.selected {
            let variation = self.registry.get(name)?;
            tracing::info!(variation = name, "enter variation");
            match variation.enter(context) {
                Ok(entered) => {
                    context = entered.context;
                    scopes.push(name, entered.release);
                }
                Err(err) => {
                    tracing::error!(variation = name, error = %err, "variation failed to enter");
                    if let Err(release_err) = scopes.unwind() {
                        tracing::error!(error = %release_err, "release after failed entry");
                    }
                    return Err(err.into());
                }
            }
        }
        Ok(Applied { context, scopes })
    }

    /// Run `body` with the fully transformed context, then release every scope.
    ///
    /// An error from `body` wins over a release error; a release error on an
    /// otherwise successful run is returned as the result.
    pub fn run<T, F>(&self, initial: BuildContext, body: F) -> Result<T, CheckError>
    where
        F: FnOnce(&BuildContext) -> Result<T, CheckError>,
    {
        let applied = self.enter(initial)?;
        let result = body(applied.context());
        let released = applied.release();
        match (result, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err.into()),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(release_err)) => {
                tracing::error!(error = %release_err, "release after failed run");
                Err(err)
            }
        }
    }
}

/// A context with all of its variation scopes still open.
pub struct Applied {
    context: BuildContext,
    scopes: ScopeStack,
}

impl Applied {
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Close every scope, innermost first.
    pub fn release(mut self) -> Result<(), VariationError> {
        self.scopes.unwind()
    }
}

/// Entered variations, innermost last.
#[derive(Default)]
struct ScopeStack {
    entries: Vec<(&'static str, Option<Box<dyn Release>>)>,
}

impl ScopeStack {
    fn push(&mut self, name: &'static str, release: Option<Box<dyn Release>>) {
        self.entries.push((name, release));
    }

    /// Pop and release every entry. All entries are released even when one
    /// fails; the first failure is returned.
    fn unwind(&mut self) -> Result<(), VariationError> {
        let mut first_err = None;
        while let Some((name, release)) = self.entries.pop() {
            tracing::info!(variation = name, "exit variation");
            let Some(release) = release else {
                continue;
            };
            if let Err(err) = release.release() {
                tracing::error!(variation = name, error = %err, "variation failed to release");
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for ScopeStack {
    fn drop(&mut self) {
        let _ = self.unwind();
    }
}
