//! Core trait for scoring models.

/// Per-feature columns for one event: `features[j][i]` is feature `fj` of
/// permutation `i`.
pub type FeatureBatch = [Vec<f32>];

/// One probability per permutation, in permutation order.
pub type ScoreVector = Vec<f32>;

/// A trained ensemble that maps a feature vector to a raw margin.
///
/// Implementations are immutable after construction, so one model can be
/// shared by every thread scoring events.
///
/// # Examples
///
/// ```
/// use u_jetreco::scoring::Model;
///
/// struct SumModel;
///
/// impl Model for SumModel {
///     fn n_features(&self) -> usize { 2 }
///     fn score(&self, input: &[f32], base_score: f32) -> f32 {
///         base_score + input.iter().sum::<f32>()
///     }
/// }
///
/// assert_eq!(SumModel.score(&[1.0, 2.0], 0.5), 3.5);
/// ```
pub trait Model: Send + Sync {
    /// Number of inputs the model expects, in `f0..f{n-1}` order.
    fn n_features(&self) -> usize;

    /// Raw (pre-logistic) margin for one feature vector.
    ///
    /// `input` holds exactly [`n_features`](Model::n_features) values.
    fn score(&self, input: &[f32], base_score: f32) -> f32;
}

impl<M: Model + ?Sized> Model for &M {
    fn n_features(&self) -> usize {
        (**self).n_features()
    }

    fn score(&self, input: &[f32], base_score: f32) -> f32 {
        (**self).score(input, base_score)
    }
}
