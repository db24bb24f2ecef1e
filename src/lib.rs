//! Jet-to-parton assignment for semileptonic ttbar reconstruction.
//!
//! Provides the two building blocks of a BDT-based reconstruction step:
//!
//! - **Permutation indexing**: every distinct assignment of an event's jets
//!   to the roles `w1`, `w2`, `h` and `l`, precomputed per jet multiplicity.
//! - **Scoring**: evaluation of a boosted decision-tree ensemble on each
//!   permutation's features, mapped to a probability with the logistic
//!   transform.
//!
//! # Architecture
//!
//! Both parts are stateless apart from their immutable inputs: a
//! [`PermutationDict`](permutation::PermutationDict) is built once and
//! shared, a [`Forest`](scoring::Forest) is loaded once and shared, and each
//! worker keeps its own [`ScoreEngine`](scoring::ScoreEngine). Feature
//! construction and event selection are left to the caller.
//!
//! ```
//! use u_jetreco::permutation::{build_permutation_dict, RoleSlot};
//! use u_jetreco::scoring::{infer, select_best, Forest};
//!
//! let dict = build_permutation_dict(6).unwrap();
//! let table = dict.for_jet_count(4).unwrap();
//!
//! let jet_pt = [80.0_f32, 60.0, 45.0, 30.0];
//! let features = vec![
//!     table.take(RoleSlot::W1, &jet_pt),
//!     table.take(RoleSlot::W2, &jet_pt),
//! ];
//! let scores = infer(&features, &Forest::empty(2), true);
//! assert_eq!(scores.len(), 12);
//! assert_eq!(select_best(&scores), Some(0));
//! ```

pub mod error;
pub mod permutation;
pub mod scoring;

pub use error::{ModelError, PermutationError};
