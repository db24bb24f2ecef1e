//! Role labels and permutation tables.

use crate::error::PermutationError;
use std::collections::BTreeMap;
use std::fmt;

use super::config::{IndexerConfig, MIN_JETS};

/// Role tag of a single jet position in a label string.
///
/// Variant order is the canonical sort order used before enumeration
/// (`h < l < o < w`, the same as the tag characters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoleTag {
    /// Jet from the hadronically decaying top (`h`).
    Higgs,
    /// Jet from the leptonically decaying top (`l`).
    Lepton,
    /// Unused jet (`o`).
    Other,
    /// One of the two W-boson jets (`w`).
    W,
}

impl RoleTag {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'h' => Some(RoleTag::Higgs),
            'l' => Some(RoleTag::Lepton),
            'o' => Some(RoleTag::Other),
            'w' => Some(RoleTag::W),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            RoleTag::Higgs => 'h',
            RoleTag::Lepton => 'l',
            RoleTag::Other => 'o',
            RoleTag::W => 'w',
        }
    }
}

/// Named role slot of a permutation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoleSlot {
    W1,
    W2,
    H,
    L,
}

impl RoleSlot {
    /// All slots in row order.
    pub const ALL: [RoleSlot; 4] = [RoleSlot::W1, RoleSlot::W2, RoleSlot::H, RoleSlot::L];

    pub fn name(self) -> &'static str {
        match self {
            RoleSlot::W1 => "w1",
            RoleSlot::W2 => "w2",
            RoleSlot::H => "h",
            RoleSlot::L => "l",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        RoleSlot::ALL.into_iter().find(|slot| slot.name() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RoleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated role-label string: two `w`, one `h`, one `l`, any number of `o`.
///
/// # Examples
///
/// ```
/// use u_jetreco::permutation::RoleLabels;
///
/// let labels = RoleLabels::parse("wwhlo").unwrap();
/// assert_eq!(labels.len(), 5);
/// assert!(RoleLabels::parse("wwhx").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawLabels")
)]
pub struct RoleLabels {
    tags: Vec<RoleTag>,
}

impl RoleLabels {
    /// Parses a label string, rejecting characters outside `o`/`w`/`h`/`l`.
    pub fn parse(s: &str) -> Result<Self, PermutationError> {
        let tags = s
            .chars()
            .enumerate()
            .map(|(position, label)| {
                RoleTag::from_char(label)
                    .ok_or(PermutationError::UnknownRoleLabel { label, position })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_tags(tags)
    }

    /// Wraps a tag sequence after checking its composition.
    pub fn from_tags(tags: Vec<RoleTag>) -> Result<Self, PermutationError> {
        let count = |tag: RoleTag| tags.iter().filter(|&&t| t == tag).count();
        let (w, h, l) = (
            count(RoleTag::W),
            count(RoleTag::Higgs),
            count(RoleTag::Lepton),
        );
        if w != 2 || h != 1 || l != 1 {
            return Err(PermutationError::InvalidComposition {
                labels: tags.iter().map(|t| t.as_char()).collect(),
                message: format!("expected 2 w, 1 h and 1 l, found {w} w, {h} h and {l} l"),
            });
        }
        Ok(Self { tags })
    }

    /// Canonical label string `wwhl` followed by `N - 4` other tags.
    pub fn for_jet_count(n_jets: usize) -> Result<Self, PermutationError> {
        if n_jets < MIN_JETS {
            return Err(PermutationError::InvalidComposition {
                labels: String::new(),
                message: format!("need at least {MIN_JETS} jets, got {n_jets}"),
            });
        }
        let mut tags = vec![RoleTag::W, RoleTag::W, RoleTag::Higgs, RoleTag::Lepton];
        tags.resize(n_jets, RoleTag::Other);
        Ok(Self { tags })
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &[RoleTag] {
        &self.tags
    }
}

impl fmt::Display for RoleLabels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tag in &self.tags {
            write!(f, "{}", tag.as_char())?;
        }
        Ok(())
    }
}

/// Jet indices per role slot for every permutation of one jet multiplicity.
///
/// Column `slot` holds, for each permutation `r`, the jet position assigned
/// to that slot. The four indices of any row are pairwise distinct and lie
/// in `[0, n_jets)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawTable")
)]
pub struct PermutationTable {
    n_jets: usize,
    columns: [Vec<usize>; 4],
}

impl PermutationTable {
    /// Builds a table from `[w1, w2, h, l]` rows.
    pub(crate) fn from_rows(n_jets: usize, rows: &[[usize; 4]]) -> Self {
        let mut columns: [Vec<usize>; 4] = Default::default();
        for column in &mut columns {
            column.reserve_exact(rows.len());
        }
        for row in rows {
            for (column, &index) in columns.iter_mut().zip(row) {
                column.push(index);
            }
        }
        Self { n_jets, columns }
    }

    /// Builds a table from `[w1, w2, h, l]` columns, checking the row invariant.
    ///
    /// # Errors
    /// Returns [`PermutationError::InvalidTable`] for fewer than four jets,
    /// columns of different lengths, or a row with an index outside
    /// `[0, n_jets)` or a repeated index.
    pub fn from_columns(
        n_jets: usize,
        columns: [Vec<usize>; 4],
    ) -> Result<Self, PermutationError> {
        let invalid = |message: String| PermutationError::InvalidTable { n_jets, message };

        if n_jets < MIN_JETS {
            return Err(invalid(format!("need at least {MIN_JETS} jets")));
        }
        let len = columns[0].len();
        if let Some(slot) = RoleSlot::ALL
            .into_iter()
            .find(|slot| columns[slot.index()].len() != len)
        {
            return Err(invalid(format!(
                "column {slot} has {} rows, expected {len}",
                columns[slot.index()].len()
            )));
        }

        let table = Self { n_jets, columns };
        for (r, row) in table.rows().enumerate() {
            if row.iter().any(|&j| j >= n_jets) {
                return Err(invalid(format!("row {r} {row:?} has an index out of range")));
            }
            if (0..4).any(|a| (a + 1..4).any(|b| row[a] == row[b])) {
                return Err(invalid(format!("row {r} {row:?} repeats a jet")));
            }
        }
        Ok(table)
    }

    /// Jet multiplicity this table was built for.
    pub fn n_jets(&self) -> usize {
        self.n_jets
    }

    /// Number of permutations.
    pub fn len(&self) -> usize {
        self.columns[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column(&self, slot: RoleSlot) -> &[usize] {
        &self.columns[slot.index()]
    }

    /// Looks a column up by slot name (`"w1"`, `"w2"`, `"h"`, `"l"`).
    pub fn column_by_name(&self, name: &str) -> Option<&[usize]> {
        RoleSlot::from_name(name).map(|slot| self.column(slot))
    }

    /// Returns permutation `r` as `[w1, w2, h, l]`.
    ///
    /// # Panics
    /// Panics if `r >= self.len()`.
    pub fn row(&self, r: usize) -> [usize; 4] {
        RoleSlot::ALL.map(|slot| self.columns[slot.index()][r])
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = [usize; 4]> + '_ {
        (0..self.len()).map(move |r| self.row(r))
    }

    /// Flattens every row back into the label string it encodes.
    ///
    /// Positions not used by any slot are tagged `o`.
    pub fn label_permutations(&self) -> Vec<RoleLabels> {
        self.rows()
            .map(|[w1, w2, h, l]| {
                let mut tags = vec![RoleTag::Other; self.n_jets];
                tags[w1] = RoleTag::W;
                tags[w2] = RoleTag::W;
                tags[h] = RoleTag::Higgs;
                tags[l] = RoleTag::Lepton;
                RoleLabels { tags }
            })
            .collect()
    }

    /// Gathers per-jet values for one slot across all permutations.
    ///
    /// `values[j]` is a property of jet `j` (pt, b-tag score, ...); the
    /// result holds that property of the `slot` jet of every permutation.
    ///
    /// # Panics
    /// Panics if `values` has fewer than `n_jets` entries.
    pub fn take<T: Copy>(&self, slot: RoleSlot, values: &[T]) -> Vec<T> {
        assert!(
            values.len() >= self.n_jets,
            "need {} jet values, got {}",
            self.n_jets,
            values.len()
        );
        self.column(slot).iter().map(|&j| values[j]).collect()
    }
}

/// Permutation tables for every jet multiplicity from 4 to `max_n_jets`.
///
/// Built once by [`build_permutation_dict`](super::build_permutation_dict)
/// and read-only afterwards; share it by reference across worker threads.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawDict")
)]
pub struct PermutationDict {
    max_n_jets: usize,
    tables: BTreeMap<usize, PermutationTable>,
}

impl PermutationDict {
    pub(crate) fn new(max_n_jets: usize, tables: BTreeMap<usize, PermutationTable>) -> Self {
        Self { max_n_jets, tables }
    }

    /// Assembles a dictionary from prebuilt tables.
    ///
    /// # Errors
    /// Fails if `max_n_jets` is out of range, if the keys are not exactly
    /// `4..=max_n_jets`, or if a table was built for a different multiplicity
    /// than its key.
    pub fn from_tables(
        max_n_jets: usize,
        tables: BTreeMap<usize, PermutationTable>,
    ) -> Result<Self, PermutationError> {
        IndexerConfig::default()
            .with_max_n_jets(max_n_jets)
            .validate()
            .map_err(PermutationError::InvalidConfig)?;

        if !tables.keys().copied().eq(MIN_JETS..=max_n_jets) {
            return Err(PermutationError::InvalidConfig(format!(
                "tables must cover {MIN_JETS}..={max_n_jets} jets, got {:?}",
                tables.keys().collect::<Vec<_>>()
            )));
        }
        if let Some((&n_jets, table)) = tables.iter().find(|(n, t)| t.n_jets() != **n) {
            return Err(PermutationError::InvalidTable {
                n_jets,
                message: format!("stored table was built for {} jets", table.n_jets()),
            });
        }
        Ok(Self::new(max_n_jets, tables))
    }

    pub fn max_n_jets(&self) -> usize {
        self.max_n_jets
    }

    /// Table for exactly `n_jets` jets.
    pub fn get(&self, n_jets: usize) -> Option<&PermutationTable> {
        self.tables.get(&n_jets)
    }

    /// Table for an event with `n_jets` selected jets.
    ///
    /// Multiplicities above `max_n_jets` use the `max_n_jets` table (only
    /// the leading jets are considered). Events with fewer than four jets
    /// have no table.
    pub fn for_jet_count(&self, n_jets: usize) -> Option<&PermutationTable> {
        if n_jets < MIN_JETS {
            return None;
        }
        self.get(n_jets.min(self.max_n_jets))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &PermutationTable)> {
        self.tables.iter().map(|(&n, table)| (n, table))
    }

    /// Number of multiplicities covered.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawLabels {
    tags: Vec<RoleTag>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawLabels> for RoleLabels {
    type Error = PermutationError;

    fn try_from(raw: RawLabels) -> Result<Self, Self::Error> {
        Self::from_tags(raw.tags)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawTable {
    n_jets: usize,
    columns: [Vec<usize>; 4],
}

#[cfg(feature = "serde")]
impl TryFrom<RawTable> for PermutationTable {
    type Error = PermutationError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        Self::from_columns(raw.n_jets, raw.columns)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawDict {
    max_n_jets: usize,
    tables: BTreeMap<usize, PermutationTable>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawDict> for PermutationDict {
    type Error = PermutationError;

    fn try_from(raw: RawDict) -> Result<Self, Self::Error> {
        Self::from_tables(raw.max_n_jets, raw.tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_unknown_label() {
        let err = RoleLabels::parse("wwhx").unwrap_err();
        assert_eq!(
            err,
            PermutationError::UnknownRoleLabel {
                label: 'x',
                position: 3
            }
        );
    }

    #[test]
    fn test_parse_rejects_uppercase() {
        // Tags are case sensitive.
        assert!(matches!(
            RoleLabels::parse("WWHL"),
            Err(PermutationError::UnknownRoleLabel { position: 0, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_composition() {
        assert!(matches!(
            RoleLabels::parse("wwwl"),
            Err(PermutationError::InvalidComposition { .. })
        ));
        assert!(matches!(
            RoleLabels::parse("whlo"),
            Err(PermutationError::InvalidComposition { .. })
        ));
    }

    #[test]
    fn test_for_jet_count() {
        let labels = RoleLabels::for_jet_count(6).unwrap();
        assert_eq!(labels.to_string(), "wwhloo");
        assert!(RoleLabels::for_jet_count(3).is_err());
    }

    #[test]
    fn test_slot_names_round_trip() {
        for slot in RoleSlot::ALL {
            assert_eq!(RoleSlot::from_name(slot.name()), Some(slot));
        }
        assert_eq!(RoleSlot::from_name("w3"), None);
    }

    #[test]
    fn test_table_rows_and_columns() {
        let table = PermutationTable::from_rows(5, &[[1, 0, 2, 3], [4, 2, 0, 1]]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.column(RoleSlot::W1), &[1, 4]);
        assert_eq!(table.column_by_name("l"), Some(&[3, 1][..]));
        assert_eq!(table.row(1), [4, 2, 0, 1]);
    }

    #[test]
    fn test_label_permutations() {
        let table = PermutationTable::from_rows(5, &[[1, 0, 2, 3], [4, 2, 0, 1]]);
        let labels: Vec<String> = table
            .label_permutations()
            .iter()
            .map(|l| l.to_string())
            .collect();
        assert_eq!(labels, vec!["wwhlo", "hlwow"]);
    }

    #[test]
    fn test_take_gathers_slot_values() {
        let table = PermutationTable::from_rows(4, &[[1, 0, 2, 3], [3, 2, 0, 1]]);
        let pt = [40.0_f32, 30.0, 20.0, 10.0];
        assert_eq!(table.take(RoleSlot::W1, &pt), vec![30.0, 10.0]);
        assert_eq!(table.take(RoleSlot::H, &pt), vec![20.0, 40.0]);
    }

    #[test]
    #[should_panic(expected = "need 4 jet values")]
    fn test_take_short_values_panics() {
        let table = PermutationTable::from_rows(4, &[[1, 0, 2, 3]]);
        table.take(RoleSlot::W1, &[1.0_f32, 2.0]);
    }

    #[test]
    fn test_dict_for_jet_count_clamps() {
        let mut tables = BTreeMap::new();
        tables.insert(4, PermutationTable::from_rows(4, &[[1, 0, 2, 3]]));
        tables.insert(5, PermutationTable::from_rows(5, &[[4, 0, 2, 3]]));
        let dict = PermutationDict::new(5, tables);

        assert!(dict.for_jet_count(3).is_none());
        assert_eq!(dict.for_jet_count(4).map(|t| t.n_jets()), Some(4));
        assert_eq!(dict.for_jet_count(9).map(|t| t.n_jets()), Some(5));
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn test_from_columns_accepts_valid_rows() {
        let table =
            PermutationTable::from_columns(4, [vec![1, 3], vec![0, 2], vec![2, 0], vec![3, 1]])
                .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.row(1), [3, 2, 0, 1]);
    }

    #[test]
    fn test_from_columns_rejects_out_of_range_index() {
        let err = PermutationTable::from_columns(4, [vec![9], vec![9], vec![9], vec![9]]);
        assert!(matches!(
            err,
            Err(PermutationError::InvalidTable { n_jets: 4, .. })
        ));
    }

    #[test]
    fn test_from_columns_rejects_repeated_jet() {
        let err = PermutationTable::from_columns(5, [vec![1], vec![1], vec![2], vec![3]]);
        assert!(matches!(err, Err(PermutationError::InvalidTable { .. })));
    }

    #[test]
    fn test_from_columns_rejects_ragged_columns() {
        let err = PermutationTable::from_columns(4, [vec![1, 3], vec![0], vec![2], vec![3]]);
        assert!(matches!(err, Err(PermutationError::InvalidTable { .. })));
    }

    #[test]
    fn test_from_columns_rejects_too_few_jets() {
        let err = PermutationTable::from_columns(3, [vec![], vec![], vec![], vec![]]);
        assert!(matches!(
            err,
            Err(PermutationError::InvalidTable { n_jets: 3, .. })
        ));
    }

    #[test]
    fn test_from_tables_checks_keys() {
        let table4 = PermutationTable::from_rows(4, &[[1, 0, 2, 3]]);
        let table5 = PermutationTable::from_rows(5, &[[4, 0, 2, 3]]);

        let mut tables = BTreeMap::new();
        tables.insert(4, table4.clone());
        tables.insert(5, table5.clone());
        assert!(PermutationDict::from_tables(5, tables.clone()).is_ok());

        // missing N=5
        let mut short = tables.clone();
        short.remove(&5);
        assert!(matches!(
            PermutationDict::from_tables(5, short),
            Err(PermutationError::InvalidConfig(_))
        ));

        // table stored under the wrong multiplicity
        let mut swapped = BTreeMap::new();
        swapped.insert(4, table5);
        swapped.insert(5, table4);
        assert!(matches!(
            PermutationDict::from_tables(5, swapped),
            Err(PermutationError::InvalidTable { n_jets: 4, .. })
        ));

        assert!(matches!(
            PermutationDict::from_tables(3, BTreeMap::new()),
            Err(PermutationError::InvalidConfig(_))
        ));
    }

    #[cfg(feature = "serde")]
    mod serde_tests {
        use super::*;

        #[test]
        fn test_labels_deserialize_checks_composition() {
            let json = r#"{"tags":["W","W","W"]}"#;
            assert!(serde_json::from_str::<RoleLabels>(json).is_err());

            let json = r#"{"tags":["W","Higgs","Other","W","Lepton"]}"#;
            let labels: RoleLabels = serde_json::from_str(json).unwrap();
            assert_eq!(labels.to_string(), "whowl");
        }

        #[test]
        fn test_table_deserialize_checks_rows() {
            let out_of_range = r#"{"n_jets":4,"columns":[[9],[9],[9],[9]]}"#;
            assert!(serde_json::from_str::<PermutationTable>(out_of_range).is_err());

            let repeated = r#"{"n_jets":4,"columns":[[1],[1],[2],[3]]}"#;
            assert!(serde_json::from_str::<PermutationTable>(repeated).is_err());

            let ragged = r#"{"n_jets":4,"columns":[[1,3],[0],[2],[3]]}"#;
            assert!(serde_json::from_str::<PermutationTable>(ragged).is_err());
        }

        #[test]
        fn test_dict_serde_round_trip() {
            let dict = crate::permutation::build_permutation_dict(6).unwrap();
            let json = serde_json::to_string(&dict).unwrap();
            let back: PermutationDict = serde_json::from_str(&json).unwrap();
            assert_eq!(back, dict);
        }

        #[test]
        fn test_dict_deserialize_rejects_missing_table() {
            let json = r#"{"max_n_jets":5,"tables":{"4":{"n_jets":4,"columns":[[1],[0],[2],[3]]}}}"#;
            assert!(serde_json::from_str::<PermutationDict>(json).is_err());
        }
    }
}
