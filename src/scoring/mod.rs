//! Boosted-decision-tree scoring of permutation hypotheses.
//!
//! Every permutation of an event gets a feature vector; a trained ensemble
//! turns it into a raw margin and the logistic transform maps that margin to
//! a probability. The caller keeps the most probable hypothesis
//! ([`select_best`]).
//!
//! # Key Types
//!
//! - [`Model`]: the seam between the engine and a trained ensemble
//! - [`Forest`]: tree ensemble parsed from an XGBoost text dump
//! - [`ModelPair`]: even/odd forests for cross-validated inference
//! - [`ScoreEngine`]: per-thread scorer with a reusable input buffer
//!
//! # Feature order
//!
//! Models name their inputs `f0..f{n-1}`; column `j` of a feature batch is
//! fed as `fj`.

mod engine;
mod forest;
mod loader;
mod types;

pub use engine::{infer, infer_events, logistic, select_best, ScoreConfig, ScoreEngine};
pub use forest::Forest;
pub use loader::{feature_names, load_models, ModelPair, Parity};
pub use types::{FeatureBatch, Model, ScoreVector};
