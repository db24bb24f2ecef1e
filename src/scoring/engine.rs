//! Per-permutation scoring.

use super::types::{FeatureBatch, Model, ScoreVector};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Configuration for [`ScoreEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreConfig {
    /// Check column lengths and the model's input count before scoring.
    ///
    /// A violation panics; it is a caller bug, not a runtime fault.
    pub validate: bool,

    /// Offset passed to the model with every feature vector.
    pub base_score: f32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            validate: false,
            base_score: 0.0,
        }
    }
}

impl ScoreConfig {
    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_base_score(mut self, base_score: f32) -> Self {
        self.base_score = base_score;
        self
    }
}

/// Logistic transform `1 / (1 + exp(-score))`.
///
/// The exponential is taken in single precision, the division in double,
/// and the result is rounded back to `f32`.
pub fn logistic(score: f32) -> f32 {
    let e = f64::from((-score).exp());
    (1.0 / (1.0 + e)) as f32
}

/// Scores every permutation of an event with a tree ensemble.
///
/// The engine owns the input buffer handed to the model, sized once from the
/// feature count and reused for every permutation and every event. Keep one
/// engine per thread.
///
/// # Examples
///
/// ```
/// use u_jetreco::scoring::{Forest, ScoreEngine};
///
/// let model = Forest::empty(2);
/// let mut engine = ScoreEngine::new(2);
/// let scores = engine.infer(&[vec![0.1, 0.2], vec![0.3, 0.4]], &model, true);
/// assert_eq!(scores, vec![0.5, 0.5]);
/// ```
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    config: ScoreConfig,
    input: Vec<f32>,
}

impl ScoreEngine {
    /// Creates an engine for `n_features` inputs with the default config.
    pub fn new(n_features: usize) -> Self {
        Self::with_config(n_features, ScoreConfig::default())
    }

    pub fn with_config(n_features: usize, config: ScoreConfig) -> Self {
        Self {
            config,
            input: vec![0.0; n_features],
        }
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    /// Scores one event; `validate` is OR-ed with the configured flag.
    ///
    /// Returns one probability per permutation, in permutation order.
    ///
    /// # Panics
    /// Panics if `features` is empty. With validation on, also panics if a
    /// column length differs from column 0 or if the model expects a
    /// different number of inputs.
    pub fn infer<M: Model + ?Sized>(
        &mut self,
        features: &FeatureBatch,
        model: &M,
        validate: bool,
    ) -> ScoreVector {
        assert!(!features.is_empty(), "feature batch must hold at least one column");

        let n_features = features.len();
        let n_permutations = features[0].len();

        if validate || self.config.validate {
            for (j, column) in features.iter().enumerate() {
                assert_eq!(
                    column.len(),
                    n_permutations,
                    "feature column f{j} has {} values, expected {n_permutations}",
                    column.len()
                );
            }
            assert_eq!(
                model.n_features(),
                n_features,
                "model expects {} features, batch has {n_features}",
                model.n_features()
            );
        }

        self.input.resize(n_features, 0.0);

        let mut scores = Vec::with_capacity(n_permutations);
        for i in 0..n_permutations {
            for (slot, column) in self.input.iter_mut().zip(features) {
                *slot = column[i];
            }
            let score = model.score(&self.input, self.config.base_score);
            scores.push(logistic(score));
        }
        scores
    }
}

/// One-shot scoring of a single event with a zero base score.
///
/// See [`ScoreEngine::infer`] for the contract.
///
/// # Examples
///
/// ```
/// use u_jetreco::scoring::{infer, Forest};
///
/// assert_eq!(infer(&[vec![0.0]], &Forest::empty(1), false), vec![0.5]);
/// ```
pub fn infer<M: Model + ?Sized>(features: &FeatureBatch, model: &M, validate: bool) -> ScoreVector {
    ScoreEngine::new(features.len()).infer(features, model, validate)
}

/// Scores many events with the same model.
///
/// With the `parallel` feature the events are spread over the rayon pool,
/// one engine per worker.
pub fn infer_events<M: Model + ?Sized>(
    events: &[Vec<Vec<f32>>],
    model: &M,
    validate: bool,
) -> Vec<ScoreVector> {
    let n_features = model.n_features();

    #[cfg(feature = "parallel")]
    {
        events
            .par_iter()
            .map_init(
                || ScoreEngine::new(n_features),
                |engine, features| engine.infer(features, model, validate),
            )
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        let mut engine = ScoreEngine::new(n_features);
        events
            .iter()
            .map(|features| engine.infer(features, model, validate))
            .collect()
    }
}

/// Index of the most probable permutation.
///
/// Returns `None` for an event without permutations. NaN scores never win;
/// ties keep the first index.
pub fn select_best(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((idx, score));
        }
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Forest;

    /// Margin equal to the first input.
    struct Identity;

    impl Model for Identity {
        fn n_features(&self) -> usize {
            1
        }
        fn score(&self, input: &[f32], base_score: f32) -> f32 {
            base_score + input[0]
        }
    }

    /// Margin `f0 - f1`.
    struct Difference;

    impl Model for Difference {
        fn n_features(&self) -> usize {
            2
        }
        fn score(&self, input: &[f32], _base_score: f32) -> f32 {
            input[0] - input[1]
        }
    }

    #[test]
    fn test_logistic_values() {
        assert_eq!(logistic(0.0), 0.5);
        assert!((logistic(2.0) - 0.880_797_1).abs() < 1e-6);
        assert!((logistic(2.0) + logistic(-2.0) - 1.0).abs() < 1e-6);
        assert_eq!(logistic(f32::INFINITY), 1.0);
        assert_eq!(logistic(f32::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_zero_tree_model_gives_half() {
        let scores = infer(&[vec![0.0]], &Forest::empty(1), true);
        assert_eq!(scores, vec![0.5]);
    }

    #[test]
    fn test_gathers_row_across_columns() {
        let features = vec![vec![1.0, 0.0, -3.0], vec![0.0, 1.0, -3.0]];
        let scores = infer(&features, &Difference, true);
        assert_eq!(scores.len(), 3);
        assert!((scores[0] - logistic(1.0)).abs() < 1e-7);
        assert!((scores[1] - logistic(-1.0)).abs() < 1e-7);
        assert_eq!(scores[2], 0.5);
    }

    #[test]
    fn test_base_score_from_config() {
        let mut engine = ScoreEngine::with_config(1, ScoreConfig::default().with_base_score(1.0));
        let scores = engine.infer(&[vec![-1.0]], &Identity, false);
        assert_eq!(scores, vec![0.5]);
    }

    #[test]
    fn test_engine_reused_across_events() {
        let mut engine = ScoreEngine::new(1);
        assert_eq!(engine.infer(&[vec![0.0, 0.0]], &Identity, false).len(), 2);
        assert_eq!(engine.infer(&[vec![0.0; 5]], &Identity, false).len(), 5);
        assert!(engine.infer(&[Vec::new()], &Identity, false).is_empty());
    }

    #[test]
    #[should_panic(expected = "feature column f1 has 2 values, expected 3")]
    fn test_validate_rejects_ragged_columns() {
        let features = vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0]];
        infer(&features, &Difference, true);
    }

    #[test]
    #[should_panic(expected = "feature column")]
    fn test_config_validate_flag() {
        let mut engine = ScoreEngine::with_config(2, ScoreConfig::default().with_validate(true));
        engine.infer(&[vec![1.0, 2.0, 3.0], vec![1.0, 2.0]], &Difference, false);
    }

    #[test]
    #[should_panic(expected = "model expects 1 features, batch has 2")]
    fn test_validate_rejects_feature_count() {
        infer(&[vec![1.0], vec![2.0]], &Identity, true);
    }

    #[test]
    #[should_panic(expected = "at least one column")]
    fn test_empty_batch_panics() {
        let features: Vec<Vec<f32>> = Vec::new();
        infer(&features, &Identity, false);
    }

    #[test]
    fn test_infer_events() {
        let events = vec![vec![vec![0.0, 1.0]], vec![vec![-1.0]], vec![vec![]]];
        let scores = infer_events(&events, &Identity, true);
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[0][0], 0.5);
        assert!((scores[0][1] - logistic(1.0)).abs() < 1e-7);
        assert!((scores[1][0] - logistic(-1.0)).abs() < 1e-7);
        assert!(scores[2].is_empty());
    }

    #[test]
    fn test_select_best() {
        assert_eq!(select_best(&[0.2, 0.9, 0.4]), Some(1));
        assert_eq!(select_best(&[0.7, 0.7]), Some(0));
        assert_eq!(select_best(&[f32::NAN, 0.1]), Some(1));
        assert_eq!(select_best(&[f32::NAN]), None);
        assert_eq!(select_best(&[]), None);
    }
}
