//! Role-permutation enumeration.
//!
//! [`PermutationIndexer`] turns a role-label string into the table of all
//! distinct jet-to-role assignments; [`build_permutation_dict`] does this for
//! every jet multiplicity up to a maximum.

use super::config::{IndexerConfig, MIN_JETS};
use super::types::{PermutationDict, PermutationTable, RoleLabels, RoleSlot, RoleTag};
use crate::error::PermutationError;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Cached table for four jets, rows as `[w1, w2, h, l]`.
///
/// Checked against the enumeration every time a dictionary is built.
const REFERENCE_FOUR_JETS: [[usize; 4]; 12] = [
    [1, 0, 2, 3],
    [1, 0, 3, 2],
    [2, 0, 1, 3],
    [2, 0, 3, 1],
    [2, 1, 0, 3],
    [2, 1, 3, 0],
    [3, 0, 1, 2],
    [3, 0, 2, 1],
    [3, 1, 0, 2],
    [3, 1, 2, 0],
    [3, 2, 0, 1],
    [3, 2, 1, 0],
];

/// Number of distinct role assignments for `n_jets` jets: `N! / (2! (N-4)!)`.
///
/// Returns `Some(0)` below four jets and `None` when the count does not fit
/// in a `usize`.
pub fn expected_permutation_count(n_jets: usize) -> Option<usize> {
    if n_jets < MIN_JETS {
        return Some(0);
    }
    // n (n - 1) is always even
    (n_jets.checked_mul(n_jets - 1)? / 2)
        .checked_mul(n_jets - 2)?
        .checked_mul(n_jets - 3)
}

/// Enumerates jet-to-role assignments.
///
/// # Algorithm
///
/// 1. Sort the labels and walk every distinct permutation of the multiset
///    with [`next_permutation`]. Identical tags (the two `w`, all `o`) never
///    produce duplicate orderings.
/// 2. Scan each permutation left to right. `o` positions are skipped, `h`
///    and `l` positions go to their slots. W positions are numbered from the
///    right: the higher jet position is `w1`, the lower one `w2`. The
///    counter restarts for every permutation.
/// 3. Order the rows lexicographically by `(w1, w2, h, l)`.
///
/// This numbering and row order are the ones the four-jet reference table fixes;
/// a literal first-seen-is-`w1` scan would not reproduce it.
///
/// # Examples
///
/// ```
/// use u_jetreco::permutation::{PermutationIndexer, RoleLabels, RoleSlot};
///
/// let table = PermutationIndexer::index(&RoleLabels::parse("wwhl").unwrap());
/// assert_eq!(table.len(), 12);
/// assert_eq!(table.row(0), [1, 0, 2, 3]);
/// assert_eq!(table.column(RoleSlot::W2)[..4], [0, 0, 0, 0]);
/// ```
pub struct PermutationIndexer;

impl PermutationIndexer {
    /// Builds the table of every distinct assignment for `labels`.
    pub fn index(labels: &RoleLabels) -> PermutationTable {
        let n_jets = labels.len();
        let mut perm = labels.tags().to_vec();
        perm.sort_unstable();

        let mut rows = Vec::with_capacity(expected_permutation_count(n_jets).unwrap_or(0));
        loop {
            rows.push(assign_roles(&perm));
            if !next_permutation(&mut perm) {
                break;
            }
        }

        canonical_table(n_jets, rows)
    }

    /// Builds a table from explicitly listed label permutations.
    ///
    /// Applies the role assignment and canonical ordering of [`index`](Self::index)
    /// without enumerating; repeated permutations collapse into one row.
    ///
    /// # Errors
    /// Returns [`PermutationError::InvalidComposition`] if a permutation is
    /// not `n_jets` long.
    pub fn index_permutations(
        n_jets: usize,
        perms: &[RoleLabels],
    ) -> Result<PermutationTable, PermutationError> {
        let mut rows = Vec::with_capacity(perms.len());
        for perm in perms {
            if perm.len() != n_jets {
                return Err(PermutationError::InvalidComposition {
                    labels: perm.to_string(),
                    message: format!("expected {n_jets} labels, got {}", perm.len()),
                });
            }
            rows.push(assign_roles(perm.tags()));
        }
        Ok(canonical_table(n_jets, rows))
    }
}

/// Builds permutation tables for every multiplicity in `4..=max_n_jets`.
///
/// # Errors
/// Fails if `max_n_jets` is out of range, or if the cached four-jet table
/// no longer agrees with the enumeration.
pub fn build_permutation_dict(max_n_jets: usize) -> Result<PermutationDict, PermutationError> {
    build_permutation_dict_with(&IndexerConfig::default().with_max_n_jets(max_n_jets))
}

/// Same as [`build_permutation_dict`], driven by an [`IndexerConfig`].
pub fn build_permutation_dict_with(
    config: &IndexerConfig,
) -> Result<PermutationDict, PermutationError> {
    if let Err(message) = config.validate() {
        warn!(max_n_jets = config.max_n_jets, "rejected indexer config: {message}");
        return Err(PermutationError::InvalidConfig(message));
    }

    let mut tables = BTreeMap::new();
    for n_jets in MIN_JETS..=config.max_n_jets {
        let labels = RoleLabels::for_jet_count(n_jets)?;
        let enumerated = PermutationIndexer::index(&labels);

        let table = if n_jets == MIN_JETS {
            let reference = PermutationTable::from_rows(MIN_JETS, &REFERENCE_FOUR_JETS);
            if reference != enumerated {
                return Err(PermutationError::ReferenceMismatch { n_jets });
            }
            reference
        } else {
            enumerated
        };

        debug!(n_jets, permutations = table.len(), "built permutation table");
        tables.insert(n_jets, table);
    }

    info!(
        max_n_jets = config.max_n_jets,
        tables = tables.len(),
        "permutation dictionary ready"
    );
    Ok(PermutationDict::new(config.max_n_jets, tables))
}

/// Rearranges `items` into the lexicographically next permutation.
///
/// Returns `false` (leaving `items` in its last, descending, order) when
/// there is no next permutation.
///
/// # Complexity
/// O(n) per call
pub fn next_permutation<T: Ord>(items: &mut [T]) -> bool {
    let n = items.len();
    if n < 2 {
        return false;
    }

    // Longest non-increasing suffix starts at `i + 1`.
    let mut i = n - 1;
    while i > 0 && items[i - 1] >= items[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let pivot = i - 1;

    let mut j = n - 1;
    while items[j] <= items[pivot] {
        j -= 1;
    }
    items.swap(pivot, j);
    items[i..].reverse();
    true
}

/// Maps one label permutation to its `[w1, w2, h, l]` row.
fn assign_roles(tags: &[RoleTag]) -> [usize; 4] {
    let mut row = [usize::MAX; 4];
    let mut w_seen = 0;

    for (position, tag) in tags.iter().enumerate() {
        let slot = match tag {
            RoleTag::Other => continue,
            RoleTag::W => {
                w_seen += 1;
                if w_seen == 1 {
                    RoleSlot::W2
                } else {
                    RoleSlot::W1
                }
            }
            RoleTag::Higgs => RoleSlot::H,
            RoleTag::Lepton => RoleSlot::L,
        };
        row[slot as usize] = position;
    }

    row
}

fn canonical_table(n_jets: usize, mut rows: Vec<[usize; 4]>) -> PermutationTable {
    rows.sort_unstable();
    rows.dedup();
    PermutationTable::from_rows(n_jets, &rows)
}
