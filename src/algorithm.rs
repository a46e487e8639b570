use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis, Zip};
use num_traits::Float;

use crate::affinity_propagation::Initialization;
use crate::error::Result;
use crate::scheduler::JobScheduler;
use crate::similarity::SimilarityMatrix;

/// Message-passing state for one `fit` call.
///
/// Every phase reads only matrices settled by the previous phase and writes one
/// disjoint row (responsibility) or column (availability) per job.
pub(crate) struct Calculation<'a, F> {
    pub(crate) similarity: ArrayView2<'a, F>,
    pub(crate) responsibility: Array2<F>,
    pub(crate) availability: Array2<F>,
}

impl<'a, F> Calculation<'a, F>
where
    F: Float + Send + Sync,
{
    pub(crate) fn new(
        s: &'a SimilarityMatrix<F>,
        initialization: Initialization,
        scheduler: &JobScheduler,
    ) -> Result<Self> {
        let s_dim = (s.len(), s.len());
        let mut calculation = Self {
            similarity: s.view(),
            responsibility: Array2::zeros(s_dim),
            availability: Array2::zeros(s_dim),
        };
        if initialization == Initialization::Similarity {
            calculation.init_from_similarity(s.row_max(), s.column_max(), scheduler)?;
        }
        Ok(calculation)
    }

    pub(crate) fn update(&mut self, scheduler: &JobScheduler) -> Result<()> {
        self.update_r(scheduler)?;
        self.update_a(scheduler)
    }

    /// For each point, the first candidate maximizing `R[i][k] + A[i][k]`.
    pub(crate) fn generate_labels(&self) -> Vec<usize> {
        self.responsibility
            .axis_iter(Axis(0))
            .zip(self.availability.axis_iter(Axis(0)))
            .map(|(r, a)| Self::max_argmax(r, a).0)
            .collect()
    }

    fn init_from_similarity(
        &mut self,
        row_max: Vec<F>,
        column_max: Vec<F>,
        scheduler: &JobScheduler,
    ) -> Result<()> {
        let similarity = self.similarity;
        let column_max = ArrayView1::from(&column_max[..]);
        let rows: Vec<(ArrayViewMut1<F>, ArrayViewMut1<F>)> = self
            .responsibility
            .axis_iter_mut(Axis(0))
            .zip(self.availability.axis_iter_mut(Axis(0)))
            .collect();
        scheduler.phase("initialization", move |phase| {
            for ((i, (r, a)), &s_max) in rows.into_iter().enumerate().zip(row_max.iter()) {
                let s = similarity.index_axis_move(Axis(0), i);
                phase.submit(move || {
                    Zip::from(r)
                        .and(a)
                        .and(&s)
                        .and(&column_max)
                        .for_each(|r, a, &s, &a_max| {
                            *r = excess(s, s_max);
                            *a = excess(s, a_max);
                        });
                });
            }
        })
    }

    fn update_r(&mut self, scheduler: &JobScheduler) -> Result<()> {
        let similarity = self.similarity;
        let availability = self.availability.view();
        let rows: Vec<ArrayViewMut1<F>> = self.responsibility.axis_iter_mut(Axis(0)).collect();
        scheduler.phase("responsibility", move |phase| {
            for (i, r) in rows.into_iter().enumerate() {
                let s = similarity.index_axis_move(Axis(0), i);
                let a = availability.index_axis_move(Axis(0), i);
                phase.submit(move || responsibility_row(s, a, r));
            }
        })
    }

    fn update_a(&mut self, scheduler: &JobScheduler) -> Result<()> {
        let responsibility = self.responsibility.view();
        let columns: Vec<ArrayViewMut1<F>> = self.availability.axis_iter_mut(Axis(1)).collect();
        scheduler.phase("availability", move |phase| {
            for (k, a) in columns.into_iter().enumerate() {
                let r = responsibility.index_axis_move(Axis(1), k);
                phase.submit(move || availability_column(k, r, a));
            }
        })
    }

    fn max_argmax(r: ArrayView1<F>, a: ArrayView1<F>) -> (usize, F) {
        let mut max_pos = 0;
        let mut max: F = r[0] + a[0];
        Zip::indexed(&r).and(&a).for_each(|idx, &r, &a| {
            let val = r + a;
            if val > max {
                max = val;
                max_pos = idx;
            }
        });
        (max_pos, max)
    }
}

/// `R[i][k] = S[i][k] - max_{k' != k}(A[i][k'] + S[i][k'])` for a whole row.
///
/// Only the best and runner-up of `A + S` are needed: the excluded maximum is the
/// runner-up at the best's index and the best everywhere else.
pub(crate) fn responsibility_row<F>(s: ArrayView1<F>, a: ArrayView1<F>, r: ArrayViewMut1<F>)
where
    F: Float,
{
    let mut best = F::neg_infinity();
    let mut best_idx = None;
    let mut second = F::neg_infinity();
    Zip::indexed(&s).and(&a).for_each(|k, &s, &a| {
        let val = a + s;
        if best_idx.is_none() || val > best {
            second = best;
            best = val;
            best_idx = Some(k);
        } else if val > second {
            second = val;
        }
    });
    Zip::indexed(r).and(&s).for_each(|k, r, &s| {
        let competitor = if Some(k) == best_idx { second } else { best };
        // No competitor left: the evidence is the similarity alone
        *r = if competitor == F::neg_infinity() {
            s
        } else {
            s - competitor
        };
    });
}

/// Availability for candidate exemplar `k`, given column `k` of R.
///
/// - `A[k][k] = sum_{i' != k} max(0, R[i'][k])`
/// - `A[i][k] = min(0, R[k][k] + sum_{i' not in {i, k}} max(0, R[i'][k]))`
pub(crate) fn availability_column<F>(k: usize, r: ArrayView1<F>, a: ArrayViewMut1<F>)
where
    F: Float,
{
    let zero = F::zero();
    let support = Zip::indexed(&r).fold(zero, |acc, i, &v| {
        if i == k {
            acc
        } else {
            acc + v.max(zero)
        }
    });
    let self_responsibility = r[k];
    Zip::indexed(a).and(&r).for_each(|i, a, &r| {
        *a = if i == k {
            support
        } else {
            (self_responsibility + (support - r.max(zero))).min(zero)
        };
    });
}

// Infinite maxima equal their source cell, so this stays NaN free
fn excess<F>(v: F, max: F) -> F
where
    F: Float,
{
    if v == max {
        F::zero()
    } else {
        v - max
    }
}
