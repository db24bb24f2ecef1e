//! Jet-role permutation indexing.
//!
//! A semileptonic ttbar hypothesis assigns four of an event's jets to
//! roles: the two jets of the hadronic W (`w1`, `w2`), the b jet of the
//! hadronic top (`h`) and the b jet of the leptonic top (`l`). Any further
//! jets are "other". Jets are interchangeable within a role but roles are
//! not interchangeable with each other, so the number of hypotheses for `N`
//! jets is `N! / (2! (N-4)!)`.
//!
//! # Key Types
//!
//! - [`RoleLabels`]: validated label string (`"wwhl"`, `"wwhloo"`, ...)
//! - [`PermutationIndexer`]: enumerates all distinct assignments
//! - [`PermutationTable`]: jet index per role slot, one row per hypothesis
//! - [`PermutationDict`]: tables for every multiplicity up to a maximum
//!
//! # Usage
//!
//! ```
//! use u_jetreco::permutation::{build_permutation_dict, RoleSlot};
//!
//! let dict = build_permutation_dict(6).unwrap();
//! let table = dict.for_jet_count(9).unwrap(); // clamped to 6 jets
//! assert_eq!(table.len(), 180);
//!
//! let jet_pt = [91.0_f32, 74.0, 55.0, 43.0, 31.0, 27.0];
//! let w1_pt = table.take(RoleSlot::W1, &jet_pt);
//! assert_eq!(w1_pt.len(), 180);
//! ```

mod config;
mod indexer;
mod types;

pub use config::{IndexerConfig, MAX_SUPPORTED_JETS, MIN_JETS};
pub use indexer::{
    build_permutation_dict, build_permutation_dict_with, expected_permutation_count,
    next_permutation, PermutationIndexer,
};
pub use types::{PermutationDict, PermutationTable, RoleLabels, RoleSlot, RoleTag};
