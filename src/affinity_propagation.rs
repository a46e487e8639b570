use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Instant;

use ndarray::{Array2, ArrayView2};
use num_traits::Float;
use tracing::{debug, info, warn};

use crate::algorithm::Calculation;
use crate::error::{ApError, Result};
use crate::scheduler::JobScheduler;
use crate::similarity::SimilarityMatrix;

/// Starting value of the responsibility and availability matrices.
///
/// - Zeros: both start at `0`
/// - Similarity: `R[i][k] = S[i][k] - max_k' S[i][k']` and `A[i][k] = S[i][k] - max_i' S[i'][k]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Initialization {
    #[default]
    Zeros,
    Similarity,
}

impl FromStr for Initialization {
    type Err = ApError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zeros" | "zero" => Ok(Initialization::Zeros),
            "similarity" => Ok(Initialization::Similarity),
            _ => Err(ApError::InvalidInitialization(s.to_string())),
        }
    }
}

/// Solver parameters.
///
/// - rounds: number of responsibility/availability cycles, run unconditionally
/// - workers: pool size, `0` for one worker per hardware thread
/// - initialization: starting state of R and A
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub rounds: usize,
    pub workers: usize,
    pub initialization: Initialization,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rounds: 200,
            workers: 0,
            initialization: Initialization::Zeros,
        }
    }
}

struct Fitted<F> {
    responsibility: Array2<F>,
    availability: Array2<F>,
    labels: Vec<usize>,
}

/// Affinity Propagation over a borrowed similarity matrix.
///
///     use ndarray::arr2;
///     use affprop::{AffinityPropagation, Diagonal, NegEuclidean, SimilarityMatrix};
///
///     let x = arr2(&[[1., 1.], [1.2, 1.], [8., 8.], [8., 8.3]]);
///     let s = SimilarityMatrix::from_array(&x, &NegEuclidean, Diagonal::Median).unwrap();
///     let mut ap = AffinityPropagation::new(&s, 50);
///     ap.fit().unwrap();
///     assert_eq!(ap.labels().unwrap().len(), 4);
pub struct AffinityPropagation<'a, F> {
    similarity: &'a SimilarityMatrix<F>,
    config: Config,
    fitted: Option<Fitted<F>>,
}

impl<'a, F> AffinityPropagation<'a, F>
where
    F: Float + Send + Sync,
{
    /// Run exactly `rounds` cycles on a pool sized to the hardware.
    pub fn new(similarity: &'a SimilarityMatrix<F>, rounds: usize) -> Self {
        Self::with_config(
            similarity,
            Config {
                rounds,
                ..Config::default()
            },
        )
    }

    pub fn with_config(similarity: &'a SimilarityMatrix<F>, config: Config) -> Self {
        Self {
            similarity,
            config,
            fitted: None,
        }
    }

    /// Run the full algorithm to completion.
    ///
    /// Worker threads live only for the duration of the call. If the pool cannot be
    /// started, the same jobs run inline on the calling thread. A failing job aborts the
    /// fit and leaves no labels behind.
    pub fn fit(&mut self) -> Result<()> {
        let mut scheduler = JobScheduler::new(self.config.workers);
        if let Err(e) = scheduler.start() {
            warn!(error = %e, "worker pool unavailable, running jobs inline");
        }
        self.fit_with(&mut scheduler)
    }

    fn fit_with(&mut self, scheduler: &mut JobScheduler) -> Result<()> {
        self.fitted = None;
        let start = Instant::now();
        info!(
            n = self.similarity.len(),
            rounds = self.config.rounds,
            workers = scheduler.workers(),
            initialization = ?self.config.initialization,
            "starting affinity propagation"
        );

        let result = self.run(scheduler);
        scheduler.stop();
        let fitted = result?;

        info!(
            exemplars = unique(&fitted.labels).len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "affinity propagation complete"
        );
        self.fitted = Some(fitted);
        Ok(())
    }

    fn run(&self, scheduler: &JobScheduler) -> Result<Fitted<F>> {
        let mut calculation =
            Calculation::new(self.similarity, self.config.initialization, scheduler)?;
        for round in 0..self.config.rounds {
            calculation.update(scheduler)?;
            debug!(round = round + 1, "round complete");
        }
        let labels = calculation.generate_labels();
        Ok(Fitted {
            responsibility: calculation.responsibility,
            availability: calculation.availability,
            labels,
        })
    }

    /// Exemplar index selected for each point.
    pub fn labels(&self) -> Result<&[usize]> {
        self.fitted
            .as_ref()
            .map(|f| f.labels.as_slice())
            .ok_or(ApError::NotFitted)
    }

    /// Sorted, deduplicated exemplar indices.
    pub fn unique_exemplars(&self) -> Result<Vec<usize>> {
        self.labels().map(unique)
    }

    /// Members of every cluster, keyed by exemplar index.
    pub fn clusters(&self) -> Result<BTreeMap<usize, Vec<usize>>> {
        let mut clusters: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        self.labels()?
            .iter()
            .enumerate()
            .for_each(|(idx, exemplar)| clusters.entry(*exemplar).or_default().push(idx));
        Ok(clusters)
    }

    pub fn responsibility(&self) -> Result<ArrayView2<'_, F>> {
        self.fitted
            .as_ref()
            .map(|f| f.responsibility.view())
            .ok_or(ApError::NotFitted)
    }

    pub fn availability(&self) -> Result<ArrayView2<'_, F>> {
        self.fitted
            .as_ref()
            .map(|f| f.availability.view())
            .ok_or(ApError::NotFitted)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of cycles `fit` runs
    pub fn rounds(&self) -> usize {
        self.config.rounds
    }

    /// Number of points being clustered
    pub fn len(&self) -> usize {
        self.similarity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.similarity.is_empty()
    }
}

fn unique(labels: &[usize]) -> Vec<usize> {
    let mut exemplars = labels.to_vec();
    exemplars.sort_unstable();
    exemplars.dedup();
    exemplars
}
