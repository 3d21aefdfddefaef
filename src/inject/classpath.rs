//! Variant classpath - the symbols a build variant can reach
//!
//! Injected code is only valid if the symbols it calls exist in the
//! variant's dependency set, so the pass consults this read-only view
//! before rewriting anything.

use std::collections::BTreeSet;

use crate::config::VariantConfig;

/// Read-only set of symbols available to one build variant.
#[derive(Debug, Clone, Default)]
pub struct Classpath {
    symbols: BTreeSet<String>,
}

impl Classpath {
    pub fn new(symbols: impl IntoIterator<Item = String>) -> Self {
        Self {
            symbols: symbols.into_iter().collect(),
        }
    }

    pub fn from_variant(variant: &VariantConfig) -> Self {
        Self::new(variant.symbols.iter().cloned())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
