//! Indexer configuration.

/// Largest jet multiplicity the indexer will enumerate.
///
/// The table for `N` jets holds `N! / (2! (N-4)!)` rows, so 16 jets
/// already means 21 840 permutations per event.
pub const MAX_SUPPORTED_JETS: usize = 16;

/// Smallest multiplicity with room for the four role slots.
pub const MIN_JETS: usize = 4;

/// Configuration for [`build_permutation_dict`](super::build_permutation_dict).
///
/// # Examples
///
/// ```
/// use u_jetreco::permutation::IndexerConfig;
///
/// let config = IndexerConfig::default().with_max_n_jets(8);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexerConfig {
    /// Highest jet multiplicity covered by the dictionary (inclusive).
    ///
    /// Events with more jets are reconstructed from their leading
    /// `max_n_jets` jets.
    pub max_n_jets: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self { max_n_jets: 6 }
    }
}

impl IndexerConfig {
    pub fn with_max_n_jets(mut self, n: usize) -> Self {
        self.max_n_jets = n;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_n_jets < MIN_JETS {
            return Err(format!(
                "max_n_jets must be at least {MIN_JETS}, got {}",
                self.max_n_jets
            ));
        }
        if self.max_n_jets > MAX_SUPPORTED_JETS {
            return Err(format!(
                "max_n_jets must be at most {MAX_SUPPORTED_JETS}, got {}",
                self.max_n_jets
            ));
        }
        Ok(())
    }
}
