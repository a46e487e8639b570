use std::cmp::Ordering;
use std::str::FromStr;

use ndarray::{Array2, Axis};
use num_traits::Float;

use crate::error::ApError;

/// Diagonal is the self-similarity written to every `S[i][i]`. It is the degree to which
/// a data point will act as its own exemplar, with lower (more negative) values yielding
/// fewer clusters.
///
/// - Min: smallest off-diagonal similarity
/// - Max: largest off-diagonal similarity
/// - Median: median off-diagonal similarity
/// - Inf / NegInf: positive or negative infinity
/// - Zero: `0`
/// - Value: assign all members the same provided value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Diagonal<F>
where
    F: Float,
{
    Min,
    Max,
    Median,
    Inf,
    NegInf,
    Zero,
    Value(F),
}

impl<F> Default for Diagonal<F>
where
    F: Float,
{
    fn default() -> Self {
        Diagonal::Min
    }
}

impl<F> Diagonal<F>
where
    F: Float,
{
    /// Resolve the policy against the off-diagonal entries of `s`.
    ///
    /// A 1 x 1 matrix has no off-diagonal entries, so Min, Max and Median fall back to zero.
    pub(crate) fn resolve(&self, s: &Array2<F>) -> F {
        match self {
            Diagonal::Inf => F::infinity(),
            Diagonal::NegInf => F::neg_infinity(),
            Diagonal::Zero => F::zero(),
            Diagonal::Value(v) => *v,
            Diagonal::Min | Diagonal::Max | Diagonal::Median => {
                let mut values = off_diagonal(s);
                if values.is_empty() {
                    return F::zero();
                }
                match self {
                    Diagonal::Min => values.iter().fold(F::infinity(), |m, &v| m.min(v)),
                    Diagonal::Max => values.iter().fold(F::neg_infinity(), |m, &v| m.max(v)),
                    _ => {
                        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
                        values[values.len() / 2]
                    }
                }
            }
        }
    }
}

fn off_diagonal<F>(s: &Array2<F>) -> Vec<F>
where
    F: Float,
{
    s.axis_iter(Axis(0))
        .enumerate()
        .flat_map(|(i, row)| {
            row.into_iter()
                .enumerate()
                .filter(move |(j, _)| *j != i)
                .map(|(_, v)| *v)
        })
        .collect()
}

impl<F> FromStr for Diagonal<F>
where
    F: Float + FromStr,
{
    type Err = ApError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "min" => Ok(Diagonal::Min),
            "max" => Ok(Diagonal::Max),
            "median" => Ok(Diagonal::Median),
            "inf" => Ok(Diagonal::Inf),
            "neg-inf" | "neginf" | "-inf" => Ok(Diagonal::NegInf),
            "zero" => Ok(Diagonal::Zero),
            other => other
                .parse::<F>()
                .map(Diagonal::Value)
                .map_err(|_| ApError::InvalidDiagonal(s.to_string())),
        }
    }
}
