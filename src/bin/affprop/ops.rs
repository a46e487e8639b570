use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::str::FromStr;

use num_traits::Float;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum FileParseError {
    #[error("unable to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("input file contains no records")]
    Empty,
}

/// Reads in a file formatted as (delimiter separated):
///     id1 val1 val2 val3
///     id2 val1 val2 val3
///
/// An optional header line is skipped. Precalculated input has no id column and is
/// labelled by row index. Row lengths are checked later, when the similarity matrix
/// is built.
pub(crate) fn from_file<F>(
    p: &Path,
    d: &str,
    has_header: bool,
    is_precalculated: bool,
) -> Result<(Vec<Vec<F>>, Vec<String>), FileParseError>
where
    F: Float + FromStr,
{
    let reader = BufReader::new(File::open(p)?);
    let mut labels = Vec::new();
    let mut data = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if idx == 0 && has_header {
            continue;
        }
        if line.trim().is_empty() {
            return Err(FileParseError::Format {
                line: idx + 1,
                message: "blank line".to_string(),
            });
        }
        let mut fields = line.split(d);
        // ID as first col if not precalculated
        if is_precalculated {
            labels.push(data.len().to_string());
        } else {
            match fields.next() {
                Some(id) => labels.push(id.trim().to_string()),
                None => {
                    return Err(FileParseError::Format {
                        line: idx + 1,
                        message: "missing record id".to_string(),
                    })
                }
            }
        }
        let mut entry: Vec<F> = vec![];
        for field in fields {
            match field.trim().parse::<F>() {
                Ok(v) => entry.push(v),
                Err(_) => {
                    return Err(FileParseError::Format {
                        line: idx + 1,
                        message: format!("unable to parse {:?} as a number", field),
                    })
                }
            }
        }
        data.push(entry);
    }
    if data.is_empty() {
        return Err(FileParseError::Empty);
    }
    Ok((data, labels))
}

pub(crate) fn display_results<W>(
    writer: &mut W,
    clusters: &BTreeMap<usize, Vec<usize>>,
    labels: &[String],
) -> std::io::Result<()>
where
    W: Write,
{
    // Output header
    writeln!(
        writer,
        "nClusters={} nSamples={}",
        clusters.len(),
        clusters.values().map(|v| v.len()).sum::<usize>()
    )?;
    for (idx, (exemplar, members)) in clusters.iter().enumerate() {
        writeln!(
            writer,
            ">Cluster={} size={} exemplar={}",
            idx + 1,
            members.len(),
            labels[*exemplar]
        )?;
        let members: Vec<&str> = members.iter().map(|m| labels[*m].as_str()).collect();
        writeln!(writer, "{}", members.join(","))?;
    }
    writer.flush()
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::{display_results, from_file, FileParseError};

    #[test]
    fn valid_load() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "name,f1,f2,f3,f4,f5").unwrap();
        writeln!(file, "a,3,4,3,2,1").unwrap();
        writeln!(file, "b,4,3,5,1,1").unwrap();
        writeln!(file, "c,3,5,3,3,3").unwrap();
        writeln!(file, "d,2,1,3,3,2").unwrap();
        writeln!(file, "e,1,1,3,2,3").unwrap();
        let (data, labels) = from_file::<f32>(file.path(), ",", true, false).unwrap();
        assert_eq!(labels, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(data[0], vec![3., 4., 3., 2., 1.]);
        assert_eq!(data[4], vec![1., 1., 3., 2., 3.]);
    }

    #[test]
    fn tab_delimited_without_header() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id1\t1.0\t5.0\t1.0").unwrap();
        writeln!(file, "id2\t2.0\t4.0\t2.0").unwrap();
        let (data, labels) = from_file::<f64>(file.path(), "\t", false, false).unwrap();
        assert_eq!(labels, vec!["id1", "id2"]);
        assert_eq!(data, vec![vec![1., 5., 1.], vec![2., 4., 2.]]);
    }

    #[test]
    fn invalid_load_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let result = from_file::<f32>(file.path(), ",", false, false);
        assert!(matches!(result, Err(FileParseError::Empty)));
    }

    #[test]
    fn header_only_is_empty() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "name,f1,f2").unwrap();
        let result = from_file::<f32>(file.path(), ",", true, false);
        assert!(matches!(result, Err(FileParseError::Empty)));
    }

    #[test]
    fn invalid_load_invalid_data() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id1,1.0,5.0,1.0").unwrap();
        writeln!(file, "id2,a,b,c").unwrap();
        let result = from_file::<f32>(file.path(), ",", false, false);
        assert!(matches!(result, Err(FileParseError::Format { line: 2, .. })));
    }

    #[test]
    fn invalid_blank_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id1,1.0,5.0,1.0").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "id3,1.0,5.0,1.0").unwrap();
        let result = from_file::<f32>(file.path(), ",", false, false);
        assert!(matches!(result, Err(FileParseError::Format { line: 2, .. })));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = from_file::<f32>(&dir.path().join("absent.csv"), ",", false, false);
        assert!(matches!(result, Err(FileParseError::Io(_))));
    }

    #[test]
    fn precalculated_file_format() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0.0 -3.0 -12.0").unwrap();
        writeln!(file, "-3.0 0.0 -3.0").unwrap();
        writeln!(file, "-12.0 -3.0 0.0").unwrap();
        let (data, y) = from_file::<f32>(file.path(), " ", false, true).unwrap();
        assert_eq!(y, vec!["0", "1", "2"]);
        assert_eq!(data[2], vec![-12., -3., 0.]);
    }

    #[test]
    fn precalculated_single_point() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "-3.0").unwrap();
        let (data, y) = from_file::<f64>(file.path(), " ", false, true).unwrap();
        assert_eq!(y, vec!["0"]);
        assert_eq!(data, vec![vec![-3.]]);
    }

    #[test]
    fn single_field_rows_without_delimiter() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a").unwrap();
        writeln!(file, "b").unwrap();
        let (data, labels) = from_file::<f32>(file.path(), ",", false, false).unwrap();
        assert_eq!(labels, vec!["a", "b"]);
        assert!(data.iter().all(|row| row.is_empty()));
    }

    #[test]
    fn results_format() {
        let mut clusters = BTreeMap::new();
        clusters.insert(0, vec![0, 1, 2]);
        clusters.insert(3, vec![3, 4]);
        let labels: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        display_results(&mut out, &clusters, &labels).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "nClusters=2 nSamples=5\n>Cluster=1 size=3 exemplar=a\na,b,c\n>Cluster=2 size=2 exemplar=d\nd,e\n"
        );
    }
}
