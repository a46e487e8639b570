use ndarray::{Array2, ArrayView1, ArrayView2, Axis, Zip};
use num_traits::Float;

use crate::diagonal::Diagonal;
use crate::error::{ApError, Result};

/// Determine the similarity between two data points.
pub trait Similarity<F>: Sync
where
    F: Float + Send + Sync,
{
    /// Affinity of point `a` to candidate exemplar `b`. Larger means more similar.
    fn similarity(&self, a: &ArrayView1<F>, b: &ArrayView1<F>) -> F;
}

/// Perform similarity calculation as `-1 * sum((row_i - row_j)**2)`
///
///     use ndarray::arr1;
///     use affprop::{NegEuclidean, Similarity};
///
///     let a = arr1(&[1., 1., 1.]);
///     let b = arr1(&[3., 3., 3.]);
///     let s: f64 = NegEuclidean::default().similarity(&a.view(), &b.view());
///     assert!((s + 12.).abs() < 1e-8);
#[derive(Debug, Default, Clone)]
pub struct NegEuclidean;

impl<F> Similarity<F> for NegEuclidean
where
    F: Float + Send + Sync,
{
    fn similarity(&self, a: &ArrayView1<F>, b: &ArrayView1<F>) -> F {
        Zip::from(a).and(b).fold(F::zero(), |acc, &x, &y| {
            let d = x - y;
            acc - d * d
        })
    }
}

/// Perform similarity calculation as `-1 * (row_i . row_j)/(|row_i|*|row_j|)`
///
///     use ndarray::arr1;
///     use affprop::{NegCosine, Similarity};
///
///     let a = arr1(&[3., 2., 0., 5.]);
///     let b = arr1(&[1., 0., 0., 0.]);
///     let s: f64 = NegCosine::default().similarity(&a.view(), &b.view());
///     assert!((s + 0.4866).abs() < 1e-4);
#[derive(Debug, Default, Clone)]
pub struct NegCosine;

impl<F> Similarity<F> for NegCosine
where
    F: Float + Send + Sync,
{
    fn similarity(&self, a: &ArrayView1<F>, b: &ArrayView1<F>) -> F {
        let dot_product = Zip::from(a).and(b).fold(F::zero(), |acc, &x, &y| acc + x * y);
        let a_magnitude = a.fold(F::zero(), |acc, &x| acc + x * x).sqrt();
        let b_magnitude = b.fold(F::zero(), |acc, &x| acc + x * x).sqrt();
        -dot_product / a_magnitude / b_magnitude
    }
}

/// Square N x N matrix in which each (i,k) index is the affinity of point i to
/// candidate exemplar k.
///
/// Construction checks the shape, so a `SimilarityMatrix` is always square with
/// at least one point.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix<F> {
    data: Array2<F>,
}

impl<F> SimilarityMatrix<F>
where
    F: Float + Send + Sync,
{
    /// Wrap a precalculated similarity matrix.
    pub fn new(data: Array2<F>) -> Result<Self> {
        let (rows, cols) = data.dim();
        if rows == 0 || cols == 0 {
            return Err(ApError::Empty);
        }
        if rows != cols {
            return Err(ApError::NotSquare { rows, cols });
        }
        Ok(Self { data })
    }

    /// Wrap a precalculated similarity matrix given as rows.
    pub fn from_rows(rows: Vec<Vec<F>>) -> Result<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(ApError::Empty);
        }
        if let Some(row) = rows.iter().find(|r| r.len() != n) {
            return Err(ApError::NotSquare {
                rows: n,
                cols: row.len(),
            });
        }
        let flat: Vec<F> = rows.into_iter().flatten().collect();
        let data = Array2::from_shape_vec((n, n), flat).map_err(|_| ApError::NotSquare {
            rows: n,
            cols: n,
        })?;
        Self::new(data)
    }

    /// Build from raw point vectors. Every point must have the same number of dimensions.
    pub fn from_points<S>(points: &[Vec<F>], metric: &S, diagonal: Diagonal<F>) -> Result<Self>
    where
        S: Similarity<F>,
    {
        let first = points.first().ok_or(ApError::Empty)?;
        let d = first.len();
        if let Some((index, p)) = points.iter().enumerate().find(|(_, p)| p.len() != d) {
            return Err(ApError::DimensionMismatch {
                index,
                expected: d,
                found: p.len(),
            });
        }
        let flat: Vec<F> = points.iter().flatten().copied().collect();
        let x = Array2::from_shape_vec((points.len(), d), flat).map_err(|_| {
            ApError::DimensionMismatch {
                index: 0,
                expected: d,
                found: d,
            }
        })?;
        Self::from_array(&x, metric, diagonal)
    }

    /// Build from a 2-D array of (rows=samples, cols=attr_values).
    pub fn from_array<S>(x: &Array2<F>, metric: &S, diagonal: Diagonal<F>) -> Result<Self>
    where
        S: Similarity<F>,
    {
        let n = x.dim().0;
        if n == 0 {
            return Err(ApError::Empty);
        }
        let mut out = Array2::<F>::zeros((n, n));
        Zip::indexed(&mut out).par_for_each(|(i, k), v| {
            if i != k {
                *v = metric.similarity(&x.row(i), &x.row(k));
            }
        });
        Ok(Self { data: out }.with_diagonal(diagonal))
    }

    /// Overwrite every self-similarity according to `diagonal`. The value is
    /// computed from the off-diagonal entries before any are replaced.
    pub fn with_diagonal(mut self, diagonal: Diagonal<F>) -> Self {
        let value = diagonal.resolve(&self.data);
        self.data.diag_mut().fill(value);
        self
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.data.dim().0
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn view(&self) -> ArrayView2<'_, F> {
        self.data.view()
    }

    pub(crate) fn row_max(&self) -> Vec<F> {
        self.data
            .axis_iter(Axis(0))
            .map(|row| row.fold(F::neg_infinity(), |m, &v| m.max(v)))
            .collect()
    }

    pub(crate) fn column_max(&self) -> Vec<F> {
        self.data
            .axis_iter(Axis(1))
            .map(|col| col.fold(F::neg_infinity(), |m, &v| m.max(v)))
            .collect()
    }
}
