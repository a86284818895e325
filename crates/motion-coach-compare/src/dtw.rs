//! Dynamic time warping alignment.
//!
//! Two implementations of the [`SequenceAligner`] contract:
//!
//! - [`WindowedDtw`]: exact search over the full `(n+1) x (m+1)` cumulative
//!   cost grid, optionally restricted to a Sakoe-Chiba band.
//! - [`MultiResolutionDtw`]: coarsen-align-refine approximation with
//!   near-linear runtime, used for long sequences and falling back to the
//!   exact search when its projected window fails to connect the endpoints.
//!
//! Backtracking is deterministic: on exact cumulative-cost ties the
//! predecessor preference is diagonal, then vertical, then horizontal.

use std::sync::atomic::{AtomicBool, Ordering};

use motion_coach_core::{
    AlignmentError, AlignmentMethod, AlignmentPath, DtwResult, FeatureMatrix, SequenceAligner,
};
use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::config::CompareConfig;

/// Default refinement radius for the multi-resolution search.
pub const DEFAULT_RADIUS: usize = 2;

fn row_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    sum.sqrt()
}

/// Euclidean distance between every row of `a` and every row of `b`.
#[must_use]
pub fn pairwise_distances(a: &FeatureMatrix, b: &FeatureMatrix) -> Array2<f64> {
    pairwise(a.data().view(), b.data().view())
}

fn pairwise(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> Array2<f64> {
    let (n, m) = (a.nrows(), b.nrows());
    let mut distances = Array2::zeros((n, m));
    for i in 0..n {
        for j in 0..m {
            distances[[i, j]] = row_distance(a.row(i), b.row(j));
        }
    }
    distances
}

/// Fills the cumulative cost grid in row-major order, evaluating only the
/// columns `bounds(i)` allows for each row. Cells outside the evaluated
/// region keep their +infinity initialization, which excludes them from any
/// valid path. Checks the cancellation flag once per row.
fn fill_grid<F>(
    distances: &Array2<f64>,
    bounds: F,
    cancel: Option<&AtomicBool>,
) -> Result<Array2<f64>, AlignmentError>
where
    F: Fn(usize) -> (usize, usize),
{
    let (n, m) = distances.dim();
    let mut cost = Array2::from_elem((n + 1, m + 1), f64::INFINITY);
    cost[[0, 0]] = 0.0;

    for i in 1..=n {
        if let Some(flag) = cancel {
            if flag.load(Ordering::Relaxed) {
                return Err(AlignmentError::Cancelled);
            }
        }
        let (j_start, j_end) = bounds(i);
        for j in j_start..j_end.min(m + 1) {
            let best = cost[[i - 1, j - 1]]
                .min(cost[[i - 1, j]])
                .min(cost[[i, j - 1]]);
            cost[[i, j]] = distances[[i - 1, j - 1]] + best;
        }
    }
    Ok(cost)
}

/// Walks the filled grid from `(n, m)` back to `(0, 0)`.
///
/// Tie-break order on equal cumulative costs: diagonal, vertical,
/// horizontal. This determinism is part of the path contract and must be
/// preserved.
fn backtrack(cost: &Array2<f64>) -> AlignmentPath {
    let (rows, cols) = cost.dim();
    let (mut i, mut j) = (rows - 1, cols - 1);
    let mut path = Vec::new();

    while i > 0 && j > 0 {
        path.push((i - 1, j - 1));
        let diagonal = cost[[i - 1, j - 1]];
        let vertical = cost[[i - 1, j]];
        let horizontal = cost[[i, j - 1]];
        if diagonal <= vertical && diagonal <= horizontal {
            i -= 1;
            j -= 1;
        } else if vertical <= horizontal {
            i -= 1;
        } else {
            j -= 1;
        }
    }

    path.reverse();
    path
}

/// Cumulative cost grid stored band-by-band: row `i` keeps only the columns
/// its window allows; any cell outside reads as +infinity. Keeps the
/// multi-resolution refinement's time and memory proportional to the band
/// area instead of the full `n x m` grid.
struct BandedGrid {
    starts: Vec<usize>,
    rows: Vec<Vec<f64>>,
}

impl BandedGrid {
    fn get(&self, i: usize, j: usize) -> f64 {
        let start = self.starts[i];
        if j < start {
            return f64::INFINITY;
        }
        self.rows[i].get(j - start).copied().unwrap_or(f64::INFINITY)
    }
}

/// Band-restricted grid fill with the same recurrence and boundary
/// conditions as [`fill_grid`]. Pairwise distances are computed lazily and
/// only for cells reachable from `(0, 0)` inside the band.
///
/// `bounds[i]` is the inclusive 0-based column range allowed for data row
/// `i`, as produced by [`project_bounds`].
fn fill_banded(
    a: ArrayView2<'_, f64>,
    b: ArrayView2<'_, f64>,
    bounds: &[(usize, usize)],
) -> BandedGrid {
    let n = a.nrows();
    let mut starts = Vec::with_capacity(n + 1);
    let mut rows = Vec::with_capacity(n + 1);
    starts.push(0);
    rows.push(vec![0.0]);

    for i in 1..=n {
        let (lo, hi) = bounds[i - 1];
        let start = lo + 1;
        let width = hi - lo + 1;
        let mut row = vec![f64::INFINITY; width];
        {
            let prev_start = starts[i - 1];
            let prev_row = &rows[i - 1];
            let prev = |j: usize| -> f64 {
                if j < prev_start {
                    return f64::INFINITY;
                }
                prev_row.get(j - prev_start).copied().unwrap_or(f64::INFINITY)
            };
            for offset in 0..width {
                let j = start + offset;
                let horizontal = if offset > 0 { row[offset - 1] } else { f64::INFINITY };
                let best = prev(j - 1).min(prev(j)).min(horizontal);
                if best.is_finite() {
                    row[offset] = row_distance(a.row(i - 1), b.row(j - 1)) + best;
                }
            }
        }
        starts.push(start);
        rows.push(row);
    }

    BandedGrid { starts, rows }
}

/// [`backtrack`] over a band-stored grid, with the same tie-break order.
fn backtrack_banded(grid: &BandedGrid, n: usize, m: usize) -> AlignmentPath {
    let (mut i, mut j) = (n, m);
    let mut path = Vec::new();

    while i > 0 && j > 0 {
        path.push((i - 1, j - 1));
        let diagonal = grid.get(i - 1, j - 1);
        let vertical = grid.get(i - 1, j);
        let horizontal = grid.get(i, j - 1);
        if diagonal <= vertical && diagonal <= horizontal {
            i -= 1;
            j -= 1;
        } else if vertical <= horizontal {
            i -= 1;
        } else {
            j -= 1;
        }
    }

    path.reverse();
    path
}

fn check_dims(a: &FeatureMatrix, b: &FeatureMatrix) -> Result<(), AlignmentError> {
    if a.feature_dim() != b.feature_dim() {
        return Err(AlignmentError::DimensionMismatch {
            expected: a.feature_dim(),
            actual: b.feature_dim(),
        });
    }
    Ok(())
}

/// Exact DTW, optionally restricted to a Sakoe-Chiba band.
#[derive(Debug, Clone)]
pub struct WindowedDtw {
    window: Option<usize>,
}

impl WindowedDtw {
    /// Creates an aligner with the given band half-width (`None` searches
    /// the full grid).
    #[must_use]
    pub fn new(window: Option<usize>) -> Self {
        Self { window }
    }

    /// Aligns with a cooperative cancellation flag, checked once per grid
    /// row so a caller-side timeout can abort long fills.
    ///
    /// # Errors
    ///
    /// [`AlignmentError::DimensionMismatch`] on differing feature
    /// dimensions, [`AlignmentError::InfeasibleWindow`] when the band is
    /// narrower than the sequence length difference, and
    /// [`AlignmentError::Cancelled`] when the flag is raised.
    pub fn align_with_cancel(
        &self,
        a: &FeatureMatrix,
        b: &FeatureMatrix,
        cancel: Option<&AtomicBool>,
    ) -> Result<DtwResult, AlignmentError> {
        let (n, m) = (a.num_frames(), b.num_frames());
        if n == 0 || m == 0 {
            return Ok(DtwResult::degenerate());
        }
        check_dims(a, b)?;

        if let Some(window) = self.window {
            let required = n.abs_diff(m);
            if window < required {
                return Err(AlignmentError::InfeasibleWindow { window, required });
            }
        }

        let distances = pairwise_distances(a, b);
        let cost = match self.window {
            Some(window) => fill_grid(
                &distances,
                |i| (i.saturating_sub(window).max(1), i + window + 1),
                cancel,
            )?,
            None => fill_grid(&distances, |_| (1, m + 1), cancel)?,
        };

        let total_cost = cost[[n, m]];
        let path = backtrack(&cost);
        let method = if self.window.is_some() {
            AlignmentMethod::Windowed
        } else {
            AlignmentMethod::Exact
        };
        Ok(DtwResult::from_cost(total_cost, path, method))
    }
}

impl SequenceAligner for WindowedDtw {
    fn align(&self, a: &FeatureMatrix, b: &FeatureMatrix) -> Result<DtwResult, AlignmentError> {
        self.align_with_cancel(a, b, None)
    }
}

/// Multi-resolution approximate DTW.
///
/// Halves both sequences, aligns the coarse pair recursively, projects the
/// coarse path back up, and re-solves exactly inside a window of `radius`
/// cells around the projection. Runtime is near-linear in sequence length;
/// the path may be suboptimal but satisfies the same shape contract.
#[derive(Debug, Clone)]
pub struct MultiResolutionDtw {
    radius: usize,
}

impl MultiResolutionDtw {
    /// Creates an aligner with the given refinement radius (minimum 1, so
    /// rows dropped by odd-length halving stay reachable).
    #[must_use]
    pub fn new(radius: usize) -> Self {
        Self {
            radius: radius.max(1),
        }
    }

    fn refine(
        &self,
        a: ArrayView2<'_, f64>,
        b: ArrayView2<'_, f64>,
    ) -> Result<(f64, AlignmentPath), AlignmentError> {
        let (n, m) = (a.nrows(), b.nrows());

        // small enough to solve exactly
        let min_size = self.radius + 2;
        if n <= min_size || m <= min_size {
            let distances = pairwise(a, b);
            let cost = fill_grid(&distances, |_| (1, m + 1), None)?;
            let total = cost[[n, m]];
            return Ok((total, backtrack(&cost)));
        }

        let coarse_a = halve(a);
        let coarse_b = halve(b);
        let (_, coarse_path) = self.refine(coarse_a.view(), coarse_b.view())?;

        let bounds = project_bounds(&coarse_path, n, m, self.radius);
        let grid = fill_banded(a, b, &bounds);

        let total = grid.get(n, m);
        if !total.is_finite() {
            return Err(AlignmentError::ApproximationFailed {
                reason: format!("projected window disconnected for {n}x{m} grid"),
            });
        }
        Ok((total, backtrack_banded(&grid, n, m)))
    }
}

impl Default for MultiResolutionDtw {
    fn default() -> Self {
        Self::new(DEFAULT_RADIUS)
    }
}

impl SequenceAligner for MultiResolutionDtw {
    fn align(&self, a: &FeatureMatrix, b: &FeatureMatrix) -> Result<DtwResult, AlignmentError> {
        if a.num_frames() == 0 || b.num_frames() == 0 {
            return Ok(DtwResult::degenerate());
        }
        check_dims(a, b)?;
        let (total, path) = self.refine(a.data().view(), b.data().view())?;
        Ok(DtwResult::from_cost(total, path, AlignmentMethod::Approximate))
    }
}

/// Averages consecutive row pairs, dropping a trailing odd row.
fn halve(x: ArrayView2<'_, f64>) -> Array2<f64> {
    let pairs = x.nrows() / 2;
    let cols = x.ncols();
    let mut out = Array2::zeros((pairs, cols));
    for p in 0..pairs {
        for c in 0..cols {
            out[[p, c]] = (x[[2 * p, c]] + x[[2 * p + 1, c]]) * 0.5;
        }
    }
    out
}

/// Projects a coarse path to double resolution and returns inclusive
/// per-row column ranges, inflated by `radius` in both dimensions.
fn project_bounds(
    coarse_path: &[(usize, usize)],
    n: usize,
    m: usize,
    radius: usize,
) -> Vec<(usize, usize)> {
    let mut lo = vec![usize::MAX; n];
    let mut hi = vec![0usize; n];

    for &(ci, cj) in coarse_path {
        for di in 0..2 {
            let i = 2 * ci + di;
            if i >= n {
                continue;
            }
            let j_lo = (2 * cj).min(m - 1);
            let j_hi = (2 * cj + 1).min(m - 1);
            lo[i] = lo[i].min(j_lo);
            hi[i] = hi[i].max(j_hi);
        }
    }

    // inflate by radius across rows and columns
    let mut bounds = Vec::with_capacity(n);
    for i in 0..n {
        let row_start = i.saturating_sub(radius);
        let row_end = (i + radius).min(n - 1);
        let mut row_lo = usize::MAX;
        let mut row_hi = 0usize;
        for r in row_start..=row_end {
            if lo[r] != usize::MAX {
                row_lo = row_lo.min(lo[r]);
                row_hi = row_hi.max(hi[r]);
            }
        }
        if row_lo == usize::MAX {
            // no projected coverage within radius; allow the whole row
            row_lo = 0;
            row_hi = m - 1;
        }
        bounds.push((row_lo.saturating_sub(radius), (row_hi + radius).min(m - 1)));
    }

    // the endpoints must always be inside the window
    bounds[0].0 = 0;
    bounds[n - 1].1 = m - 1;
    bounds
}

/// Aligns two feature matrices using the strategy the configuration
/// selects: multi-resolution approximation for long sequences when enabled
/// (falling back to windowed exact DTW if the refinement fails), otherwise
/// exact DTW with the resolved band.
///
/// # Errors
///
/// Propagates non-recoverable [`AlignmentError`]s; recoverable approximate
/// failures are logged and retried on the exact path.
pub fn align_with_config(
    a: &FeatureMatrix,
    b: &FeatureMatrix,
    config: &CompareConfig,
) -> Result<DtwResult, AlignmentError> {
    let longest = a.num_frames().max(b.num_frames());

    if config.use_approximate && longest > config.approximate_threshold {
        return align_with_fallback(&MultiResolutionDtw::default(), a, b, config);
    }

    WindowedDtw::new(config.window_for(longest)).align(a, b)
}

/// Runs the given approximate aligner and retries on the exact path when it
/// fails recoverably. Non-recoverable errors propagate unchanged, so the
/// result's method tag always reflects the strategy that actually ran.
fn align_with_fallback<A: SequenceAligner>(
    approximate: &A,
    a: &FeatureMatrix,
    b: &FeatureMatrix,
    config: &CompareConfig,
) -> Result<DtwResult, AlignmentError> {
    match approximate.align(a, b) {
        Ok(result) => Ok(result),
        Err(err) if err.is_recoverable() => {
            tracing::warn!(error = %err, "approximate alignment failed, using windowed exact DTW");
            let longest = a.num_frames().max(b.num_frames());
            WindowedDtw::new(config.window_for(longest)).align(a, b)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion_coach_core::is_valid_path;

    fn wave_matrix(rows: usize, cols: usize, phase: f64) -> FeatureMatrix {
        FeatureMatrix::new(Array2::from_shape_fn((rows, cols), |(i, j)| {
            ((i as f64 * 0.37 + phase) + j as f64 * 0.11).sin()
        }))
    }

    #[test]
    fn test_self_alignment_is_diagonal() {
        let a = wave_matrix(12, 4, 0.0);
        let result = WindowedDtw::new(None).align(&a, &a).unwrap();
        assert!(result.total_cost.abs() < 1e-12);
        assert!((result.similarity - 1.0).abs() < 1e-12);
        assert_eq!(result.method, AlignmentMethod::Exact);
        assert_eq!(result.path.len(), 12);
        for (step, &(i, j)) in result.path.iter().enumerate() {
            assert_eq!((i, j), (step, step));
        }
    }

    #[test]
    fn test_path_contract_on_unequal_lengths() {
        let a = wave_matrix(9, 4, 0.0);
        let b = wave_matrix(6, 4, 0.8);
        let result = WindowedDtw::new(None).align(&a, &b).unwrap();
        assert!(is_valid_path(&result.path, 9, 6));
        assert!(result.total_cost >= 0.0);
        assert!(result.similarity > 0.0 && result.similarity <= 1.0);
    }

    #[test]
    fn test_tie_break_prefers_diagonal() {
        // identical all-zero matrices tie everywhere; the deterministic
        // preference must yield the pure diagonal
        let a = FeatureMatrix::new(Array2::zeros((5, 3)));
        let result = WindowedDtw::new(None).align(&a, &a).unwrap();
        let expected: AlignmentPath = (0..5).map(|i| (i, i)).collect();
        assert_eq!(result.path, expected);
    }

    #[test]
    fn test_degenerate_empty_input() {
        let empty = FeatureMatrix::new(Array2::zeros((0, 4)));
        let full = wave_matrix(5, 4, 0.0);
        for (a, b) in [(&empty, &full), (&full, &empty)] {
            let result = WindowedDtw::new(None).align(a, b).unwrap();
            assert!(result.total_cost.is_infinite());
            assert_eq!(result.similarity, 0.0);
            assert!(result.path.is_empty());
            assert_eq!(result.method, AlignmentMethod::Degenerate);
        }
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let a = wave_matrix(5, 4, 0.0);
        let b = wave_matrix(5, 3, 0.0);
        let err = WindowedDtw::new(None).align(&a, &b).unwrap_err();
        assert!(matches!(
            err,
            AlignmentError::DimensionMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_infeasible_window_detected() {
        let a = wave_matrix(10, 4, 0.0);
        let b = wave_matrix(3, 4, 0.0);
        let err = WindowedDtw::new(Some(2)).align(&a, &b).unwrap_err();
        assert!(matches!(
            err,
            AlignmentError::InfeasibleWindow {
                window: 2,
                required: 7
            }
        ));
    }

    #[test]
    fn test_band_only_restricts_search() {
        let a = wave_matrix(20, 4, 0.0);
        let b = wave_matrix(20, 4, 1.3);
        let exact = WindowedDtw::new(None).align(&a, &b).unwrap();
        let banded = WindowedDtw::new(Some(2)).align(&a, &b).unwrap();
        assert!(banded.total_cost >= exact.total_cost - 1e-12);
        assert_eq!(banded.method, AlignmentMethod::Windowed);
        assert!(is_valid_path(&banded.path, 20, 20));
    }

    #[test]
    fn test_cancellation_aborts_fill() {
        let a = wave_matrix(50, 4, 0.0);
        let flag = AtomicBool::new(true);
        let err = WindowedDtw::new(None)
            .align_with_cancel(&a, &a, Some(&flag))
            .unwrap_err();
        assert!(matches!(err, AlignmentError::Cancelled));
    }

    #[test]
    fn test_multi_resolution_matches_contract() {
        let a = wave_matrix(48, 4, 0.0);
        let b = wave_matrix(40, 4, 0.9);
        let exact = WindowedDtw::new(None).align(&a, &b).unwrap();
        let approx = MultiResolutionDtw::default().align(&a, &b).unwrap();

        assert_eq!(approx.method, AlignmentMethod::Approximate);
        assert!(is_valid_path(&approx.path, 48, 40));
        // approximate cost never beats the exact optimum
        assert!(approx.total_cost >= exact.total_cost - 1e-9);
        assert!(approx.similarity > 0.0 && approx.similarity <= 1.0);
    }

    #[test]
    fn test_multi_resolution_self_alignment() {
        let a = wave_matrix(64, 4, 0.0);
        let result = MultiResolutionDtw::default().align(&a, &a).unwrap();
        assert!(result.total_cost.abs() < 1e-9);
        assert!((result.similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_banded_fill_matches_full_grid_when_unrestricted() {
        let a = wave_matrix(10, 4, 0.0);
        let b = wave_matrix(7, 4, 0.6);

        // a band covering every column must reproduce the dense fill exactly
        let bounds = vec![(0usize, 6usize); 10];
        let banded = fill_banded(a.data().view(), b.data().view(), &bounds);

        let distances = pairwise_distances(&a, &b);
        let dense = fill_grid(&distances, |_| (1, 8), None).unwrap();

        for i in 0..=10 {
            for j in 0..=7 {
                let expected = dense[[i, j]];
                let actual = banded.get(i, j);
                if expected.is_finite() {
                    assert!((expected - actual).abs() < 1e-12, "cell ({i}, {j})");
                } else {
                    assert!(actual.is_infinite(), "cell ({i}, {j})");
                }
            }
        }
    }

    #[test]
    fn test_banded_cells_outside_window_stay_unreachable() {
        let a = wave_matrix(6, 4, 0.0);
        // a 2-wide diagonal band
        let bounds: Vec<(usize, usize)> = (0..6usize).map(|i| (i.saturating_sub(1), (i + 1).min(5))).collect();
        let grid = fill_banded(a.data().view(), a.data().view(), &bounds);

        assert!(grid.get(6, 6).is_finite());
        assert!(grid.get(1, 6).is_infinite());
        assert!(grid.get(6, 1).is_infinite());

        let path = backtrack_banded(&grid, 6, 6);
        assert!(is_valid_path(&path, 6, 6));
    }

    struct UnstableAligner;

    impl SequenceAligner for UnstableAligner {
        fn align(&self, _: &FeatureMatrix, _: &FeatureMatrix) -> Result<DtwResult, AlignmentError> {
            Err(AlignmentError::ApproximationFailed {
                reason: "refinement produced no path".to_string(),
            })
        }
    }

    struct RejectingAligner;

    impl SequenceAligner for RejectingAligner {
        fn align(&self, a: &FeatureMatrix, b: &FeatureMatrix) -> Result<DtwResult, AlignmentError> {
            Err(AlignmentError::DimensionMismatch {
                expected: a.feature_dim(),
                actual: b.feature_dim(),
            })
        }
    }

    #[test]
    fn test_failed_approximation_falls_back_to_exact() {
        let a = wave_matrix(12, 4, 0.0);
        let b = wave_matrix(12, 4, 0.5);
        let config = CompareConfig::balanced();

        let result = align_with_fallback(&UnstableAligner, &a, &b, &config).unwrap();
        // the tag reflects the strategy that actually produced the path
        assert_eq!(result.method, AlignmentMethod::Exact);
        assert!(is_valid_path(&result.path, 12, 12));
    }

    #[test]
    fn test_non_recoverable_errors_do_not_fall_back() {
        let a = wave_matrix(12, 4, 0.0);
        let config = CompareConfig::balanced();

        let err = align_with_fallback(&RejectingAligner, &a, &a, &config).unwrap_err();
        assert!(matches!(err, AlignmentError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_config_selects_approximate_over_threshold() {
        let mut config = CompareConfig::balanced();
        config.use_approximate = true;
        config.approximate_threshold = 16;

        let a = wave_matrix(24, 4, 0.0);
        let b = wave_matrix(24, 4, 0.4);
        let result = align_with_config(&a, &b, &config).unwrap();
        assert_eq!(result.method, AlignmentMethod::Approximate);

        let short_a = wave_matrix(10, 4, 0.0);
        let result = align_with_config(&short_a, &short_a, &config).unwrap();
        // below the threshold the exact search runs (no auto window under
        // 500 frames)
        assert_eq!(result.method, AlignmentMethod::Exact);
    }
}
