use std::collections::BTreeSet;

use affprop::{AffinityPropagation, Config, Diagonal, Initialization, NegEuclidean, SimilarityMatrix};

/// Deterministic scatter of `n` points in three loose groups
fn scatter(n: usize) -> Vec<Vec<f64>> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % 10_000) as f64 / 1_000.
    };
    (0..n)
        .map(|i| {
            let offset = (i % 3) as f64 * 25.;
            vec![offset + next(), offset - next(), next()]
        })
        .collect()
}

fn fit(s: &SimilarityMatrix<f64>, workers: usize, rounds: usize) -> AffinityPropagation<'_, f64> {
    let mut ap = AffinityPropagation::with_config(
        s,
        Config {
            rounds,
            workers,
            initialization: Initialization::Zeros,
        },
    );
    ap.fit().unwrap();
    ap
}

#[test]
fn worker_count_invariance() {
    let s = SimilarityMatrix::from_points(&scatter(40), &NegEuclidean, Diagonal::Median).unwrap();
    let reference = fit(&s, 1, 30);
    for workers in [2, 0] {
        let other = fit(&s, workers, 30);
        assert_eq!(reference.responsibility().unwrap(), other.responsibility().unwrap());
        assert_eq!(reference.availability().unwrap(), other.availability().unwrap());
        assert_eq!(reference.labels().unwrap(), other.labels().unwrap());
    }
}

#[test]
fn repeated_runs_match() {
    let s = SimilarityMatrix::from_points(&scatter(25), &NegEuclidean, Diagonal::Min).unwrap();
    let first = fit(&s, 4, 50);
    let second = fit(&s, 4, 50);
    assert_eq!(first.responsibility().unwrap(), second.responsibility().unwrap());
    assert_eq!(first.labels().unwrap(), second.labels().unwrap());
}

#[test]
fn shape_invariants() {
    for (n, rounds) in [(1, 3), (2, 0), (7, 1), (33, 12)] {
        let s = SimilarityMatrix::from_points(&scatter(n), &NegEuclidean, Diagonal::Median).unwrap();
        let ap = fit(&s, 3, rounds);
        assert_eq!(ap.responsibility().unwrap().dim(), (n, n));
        assert_eq!(ap.availability().unwrap().dim(), (n, n));
        let labels = ap.labels().unwrap();
        assert_eq!(labels.len(), n);
        assert!(labels.iter().all(|l| *l < n));
    }
}

#[test]
fn unique_exemplars_are_the_image_of_labels() {
    let s = SimilarityMatrix::from_points(&scatter(30), &NegEuclidean, Diagonal::Median).unwrap();
    let ap = fit(&s, 0, 40);
    let image: BTreeSet<usize> = ap.labels().unwrap().iter().copied().collect();
    assert_eq!(ap.unique_exemplars().unwrap(), image.into_iter().collect::<Vec<_>>());
    let members: usize = ap.clusters().unwrap().values().map(|m| m.len()).sum();
    assert_eq!(members, 30);
}

#[test]
fn infinite_diagonals_stay_finite_or_infinite() {
    for diagonal in [Diagonal::Inf, Diagonal::NegInf] {
        let s = SimilarityMatrix::from_points(&scatter(12), &NegEuclidean, diagonal).unwrap();
        let ap = fit(&s, 2, 15);
        assert!(ap.responsibility().unwrap().iter().all(|v| !v.is_nan()));
        assert!(ap.availability().unwrap().iter().all(|v| !v.is_nan()));
        assert!(ap.labels().unwrap().iter().all(|l| *l < 12));
    }
}
