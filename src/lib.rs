pub use affinity_propagation::{AffinityPropagation, Config, Initialization};
pub use diagonal::Diagonal;
pub use error::{ApError, Result};
pub use scheduler::{JobScheduler, Phase};
pub use similarity::{NegCosine, NegEuclidean, Similarity, SimilarityMatrix};

mod affinity_propagation;
mod algorithm;
mod diagonal;
mod error;
mod scheduler;
mod similarity;
