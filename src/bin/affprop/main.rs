#[macro_use]
extern crate clap;

use std::io::{stdout, BufWriter};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use num_traits::Float;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use affprop::{AffinityPropagation, Config, Diagonal, Initialization, NegEuclidean, SimilarityMatrix};

use crate::ops::{display_results, from_file};

mod ops;

struct Args {
    input: PathBuf,
    delimiter: String,
    header: bool,
    precalculated: bool,
    diagonal: Option<String>,
    config: Config,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "affprop=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let matches = clap_app!(affprop =>
        (version: "0.1.0")
        (about: "Phase-synchronized parallel Affinity Propagation")
        (@arg INPUT: -i --input +takes_value +required "Path to input file")
        (@arg DELIMITER: -l --delimiter +takes_value "Field delimiter, default=,")
        (@arg HEADER: -H --header "Skip the first line of the input")
        (@arg PRECALCULATED: -s --precalculated "Input is a precalculated N x N similarity matrix")
        (@arg DIAGONAL: -d --diagonal +takes_value +allow_hyphen_values "Self-similarity: min, max, median, inf, neg-inf, zero or a value, default=min")
        (@arg ROUNDS: -r --rounds +takes_value "Responsibility/availability rounds, default=200")
        (@arg THREADS: -t --threads +takes_value "Number of worker threads, 0 for all cores, default=0")
        (@arg INIT: -n --init +takes_value "Initial R/A state: zeros or similarity, default=zeros")
        (@arg PRECISION: -p --precision +takes_value "Set f32 or f64 precision, default=f32")
    )
    .get_matches();

    let input = PathBuf::from(matches.value_of("INPUT").unwrap_or_default());
    if !input.exists() {
        bail!("unable to locate input file {}", input.display());
    }
    let rounds = matches
        .value_of("ROUNDS")
        .unwrap_or("200")
        .parse::<usize>()
        .context("unable to parse rounds")?;
    let workers = matches
        .value_of("THREADS")
        .unwrap_or("0")
        .parse::<usize>()
        .context("unable to parse threads")?;
    let initialization = matches
        .value_of("INIT")
        .unwrap_or("zeros")
        .parse::<Initialization>()?;
    let args = Args {
        input,
        delimiter: matches.value_of("DELIMITER").unwrap_or(",").to_string(),
        header: matches.is_present("HEADER"),
        precalculated: matches.is_present("PRECALCULATED"),
        diagonal: matches.value_of("DIAGONAL").map(|d| d.to_string()),
        config: Config {
            rounds,
            workers,
            initialization,
        },
    };

    match matches.value_of("PRECISION").unwrap_or("f32") {
        "f64" => run::<f64>(&args),
        "f32" => run::<f32>(&args),
        other => bail!("unsupported precision {}", other),
    }
}

fn run<F>(args: &Args) -> Result<()>
where
    F: Float + FromStr + Send + Sync,
{
    let (rows, labels) = from_file::<F>(&args.input, &args.delimiter, args.header, args.precalculated)
        .with_context(|| format!("unable to load {}", args.input.display()))?;
    let similarity = if args.precalculated {
        let s = SimilarityMatrix::from_rows(rows)?;
        match &args.diagonal {
            Some(d) => s.with_diagonal(d.parse::<Diagonal<F>>()?),
            None => s,
        }
    } else {
        let diagonal = match &args.diagonal {
            Some(d) => d.parse::<Diagonal<F>>()?,
            None => Diagonal::default(),
        };
        SimilarityMatrix::from_points(&rows, &NegEuclidean, diagonal)?
    };

    let mut ap = AffinityPropagation::with_config(&similarity, args.config);
    ap.fit()?;

    let mut writer = BufWriter::new(stdout());
    display_results(&mut writer, &ap.clusters()?, &labels).context("unable to write results")?;
    Ok(())
}
