//! Loading the even/odd model pair used for cross-validated inference.

use super::forest::Forest;
use crate::error::ModelError;
use tracing::info;

/// Event-number parity selecting one half of a [`ModelPair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn of(event_number: u64) -> Self {
        if event_number.is_multiple_of(2) {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Parity::Even => "even",
            Parity::Odd => "odd",
        }
    }
}

/// Two independently trained forests, one per event-number parity.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPair {
    pub even: Forest,
    pub odd: Forest,
}

impl ModelPair {
    pub fn get(&self, parity: Parity) -> &Forest {
        match parity {
            Parity::Even => &self.even,
            Parity::Odd => &self.odd,
        }
    }

    /// Model for an event: `even` for even event numbers, `odd` otherwise.
    pub fn for_event(&self, event_number: u64) -> &Forest {
        self.get(Parity::of(event_number))
    }
}

/// Input names `f0`, `f1`, ..., `f{n-1}` the dumps refer to.
///
/// Feature columns passed to [`infer`](super::infer) must follow the same
/// order.
pub fn feature_names(n_features: usize) -> Vec<String> {
    (0..n_features).map(|i| format!("f{i}")).collect()
}

/// Loads `<path>even.txt` and `<path>odd.txt`.
///
/// `path` is a prefix, not a directory: `"models/"` reads
/// `models/even.txt`, `"models/bdt_"` reads `models/bdt_even.txt`.
///
/// # Errors
/// Propagates the first read or parse failure.
pub fn load_models(path: &str, n_features: usize) -> Result<ModelPair, ModelError> {
    let names = feature_names(n_features);
    let odd = Forest::load_txt(format!("{path}{}.txt", Parity::Odd.name()), &names)?;
    let even = Forest::load_txt(format!("{path}{}.txt", Parity::Even.name()), &names)?;

    info!(
        path,
        n_features,
        even_trees = even.n_trees(),
        odd_trees = odd.n_trees(),
        "loaded model pair"
    );
    Ok(ModelPair { even, odd })
}
