use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{info, warn};
use ndarray::{Array2, ArrayView1};

use super::TrainingError;
use crate::classifier::normalize_symptom;

/// A labeled symptom table: one row per patient record, one column per symptom.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Normalized symptom names in column order
    pub symptoms: Vec<String>,
    /// Binary presence matrix, `labels.len()` rows by `symptoms.len()` columns
    pub samples: Array2<f64>,
    pub labels: Vec<String>,
}

fn split_line(line: &str) -> Vec<String> {
    line.split(',')
        .map(|cell| cell.trim().trim_matches('"').trim().to_string())
        .collect()
}

impl Dataset {
    pub fn from_csv_path(
        path: impl AsRef<Path>,
        label_column: &str,
    ) -> Result<Self, TrainingError> {
        let path = path.as_ref();
        info!("Reading training data from {:?}", path);
        let file = File::open(path)?;
        Self::from_csv_reader(BufReader::new(file), label_column)
    }

    /// Parses a comma separated table with a header row.
    ///
    /// Feature columns with an empty cell in any row are dropped entirely,
    /// the way exported spreadsheets often carry a trailing empty column.
    /// Remaining cells must be numeric; any non-zero value counts as present.
    /// Columns whose names normalize to the same symptom are merged: the
    /// symptom is present when any of them is.
    pub fn from_csv_reader<R: BufRead>(
        reader: R,
        label_column: &str,
    ) -> Result<Self, TrainingError> {
        let mut lines = reader
            .lines()
            .enumerate()
            .map(|(i, line)| line.map(|l| (i + 1, l)))
            .filter(|line| !matches!(line, Ok((_, l)) if l.trim().is_empty()));

        let (_, header_line) = lines
            .next()
            .transpose()?
            .ok_or_else(|| TrainingError::Dataset("Training data is empty".into()))?;
        let header = split_line(&header_line);
        let label_index = header
            .iter()
            .position(|h| h == label_column)
            .ok_or_else(|| {
                TrainingError::Dataset(format!("Label column '{}' not found", label_column))
            })?;

        let mut rows: Vec<(usize, Vec<String>)> = Vec::new();
        let mut labels = Vec::new();
        for line in lines {
            let (line_no, line) = line?;
            let mut cells = split_line(&line);
            if cells.len() > header.len() {
                return Err(TrainingError::Parse {
                    line: line_no,
                    message: format!("{} cells for {} columns", cells.len(), header.len()),
                });
            }
            cells.resize(header.len(), String::new());

            let label = std::mem::take(&mut cells[label_index]);
            if label.is_empty() {
                return Err(TrainingError::Parse {
                    line: line_no,
                    message: "missing label".into(),
                });
            }
            labels.push(label);
            rows.push((line_no, cells));
        }

        if rows.is_empty() {
            return Err(TrainingError::Dataset("Training data has no rows".into()));
        }

        let columns: Vec<usize> = (0..header.len())
            .filter(|&c| c != label_index)
            .filter(|&c| {
                let complete = rows.iter().all(|(_, row)| !row[c].is_empty());
                if !complete {
                    warn!("Dropping column '{}': it has empty cells", header[c]);
                }
                complete
            })
            .collect();
        if columns.is_empty() {
            return Err(TrainingError::Dataset("No complete symptom columns".into()));
        }

        let mut symptoms: Vec<String> = Vec::with_capacity(columns.len());
        let mut targets = Vec::with_capacity(columns.len());
        for &c in &columns {
            let name = normalize_symptom(&header[c]);
            match symptoms.iter().position(|s| *s == name) {
                Some(j) => {
                    warn!("Merging duplicate column '{}' into symptom '{}'", header[c], name);
                    targets.push(j);
                }
                None => {
                    targets.push(symptoms.len());
                    symptoms.push(name);
                }
            }
        }

        let mut samples = Array2::zeros((rows.len(), symptoms.len()));
        for (r, (line_no, row)) in rows.iter().enumerate() {
            for (&c, &j) in columns.iter().zip(&targets) {
                let value: f64 = row[c].parse().map_err(|_| TrainingError::Parse {
                    line: *line_no,
                    message: format!("column '{}' is not numeric: '{}'", header[c], row[c]),
                })?;
                if value != 0.0 {
                    samples[[r, j]] = 1.0;
                }
            }
        }

        info!(
            "Read {} records with {} symptom columns",
            labels.len(),
            symptoms.len()
        );

        Ok(Self {
            symptoms,
            samples,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Names of the symptoms present in one row.
    pub fn present_symptoms<'a>(
        &'a self,
        row: ArrayView1<'a, f64>,
    ) -> impl Iterator<Item = &'a str> + 'a {
        row.into_iter()
            .zip(self.symptoms.iter())
            .filter(|(value, _)| **value != 0.0)
            .map(|(_, name)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "itching,Skin Rash,high_fever,prognosis,\n\
                       1,1,0,Fungal infection,\n\
                       0,0,1,Malaria,\n\
                       \n\
                       1,0,0,Fungal infection,\n";

    #[test]
    fn test_reads_and_drops_empty_column() {
        let dataset = Dataset::from_csv_reader(CSV.as_bytes(), "prognosis").unwrap();
        assert_eq!(dataset.symptoms, vec!["itching", "skin_rash", "high_fever"]);
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.labels[1], "Malaria");
        assert_eq!(dataset.samples.row(0).to_vec(), vec![1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_present_symptoms() {
        let dataset = Dataset::from_csv_reader(CSV.as_bytes(), "prognosis").unwrap();
        let present: Vec<&str> = dataset.present_symptoms(dataset.samples.row(0)).collect();
        assert_eq!(present, vec!["itching", "skin_rash"]);
    }

    #[test]
    fn test_missing_label_column() {
        let err = Dataset::from_csv_reader(CSV.as_bytes(), "disease").unwrap_err();
        assert!(matches!(err, TrainingError::Dataset(_)));
    }

    #[test]
    fn test_non_numeric_cell() {
        let csv = "fever,prognosis\nyes,Flu\n";
        let err = Dataset::from_csv_reader(csv.as_bytes(), "prognosis").unwrap_err();
        assert!(matches!(err, TrainingError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_duplicate_columns_are_merged() {
        let csv = "fever,cough,Fever,prognosis\n1,0,0,Flu\n0,1,1,Cold\n0,1,0,Cold\n";
        let dataset = Dataset::from_csv_reader(csv.as_bytes(), "prognosis").unwrap();
        assert_eq!(dataset.symptoms, vec!["fever", "cough"]);
        assert_eq!(dataset.samples.row(0).to_vec(), vec![1.0, 0.0]);
        assert_eq!(dataset.samples.row(1).to_vec(), vec![1.0, 1.0]);
        assert_eq!(dataset.samples.row(2).to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_parse_error_reports_file_line() {
        let csv = "fever,prognosis\n1,Flu\n\n2x,Flu\n";
        let err = Dataset::from_csv_reader(csv.as_bytes(), "prognosis").unwrap_err();
        assert!(matches!(err, TrainingError::Parse { line: 4, .. }));
    }

    #[test]
    fn test_empty_input() {
        assert!(Dataset::from_csv_reader("".as_bytes(), "prognosis").is_err());
        assert!(Dataset::from_csv_reader("fever,prognosis\n".as_bytes(), "prognosis").is_err());
    }
}
