//! Ordered catalogue of known variations.
//!
//! Registration order is the application order. The registry is built once
//! and passed around explicitly, so tests can supply a reduced or fake one.
use crate::error::CheckError;
use crate::tool::ToolRunner;
use crate::variation::{
    CapturesEnvironment, FileOrdering, Home, Kernel, Locales, PathSuffix, Placeholder, Timezone,
    Umask, Variation,
};
use std::sync::Arc;

pub struct VariationRegistry {
    variations: Vec<Box<dyn Variation>>,
}

impl VariationRegistry {
    /// Build a reduced or fake registry from variations in application order.
    ///
    /// Duplicate names are rejected; the first registration would shadow
    /// the rest during lookup.
    #[cfg(test)]
    pub(crate) fn new(variations: Vec<Box<dyn Variation>>) -> Result<Self, CheckError> {
        for (idx, variation) in variations.iter().enumerate() {
            let name = variation.name();
            if variations[..idx].iter().any(|prior| prior.name() == name) {
                return Err(CheckError::Config(format!(
                    "variation {name} registered twice"
                )));
            }
        }
        Ok(Self { variations })
    }

    /// The full catalogue in canonical order.
    pub fn standard(runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            variations: vec![
                Box::new(CapturesEnvironment),
                Box::new(Placeholder::domain_host()),
                Box::new(FileOrdering::new(runner)),
                Box::new(Home),
                Box::new(Kernel),
                Box::new(Locales),
                Box::new(PathSuffix),
                Box::new(Placeholder::shell()),
                Box::new(Timezone),
                Box::new(Umask),
                Box::new(Placeholder::user_group()),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Result<&dyn Variation, CheckError> {
        self.variations
            .iter()
            .find(|variation| variation.name() == name)
            .map(Box::as_ref)
            .ok_or_else(|| CheckError::UnknownVariation(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variations.iter().any(|variation| variation.name() == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.variations.iter().map(|variation| variation.name())
    }

    /// Sort `selected` into registry order, dropping duplicates.
    ///
    /// Fails on the first name the registry does not know.
    pub fn resolve<S: AsRef<str>>(&self, selected: &[S]) -> Result<Vec<&'static str>, CheckError> {
        for name in selected {
            self.get(name.as_ref())?;
        }
        Ok(self
            .names()
            .filter(|known| selected.iter().any(|name| name.as_ref() == *known))
            .collect())
    }
}
