//! Delimited-text datasets: one header row, numeric feature columns and an
//! optional integer label column.
use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;
use ndarray::{Array2, ArrayView2};

/// Parsed dataset ready for training or inference.
#[derive(Debug, Clone)]
pub struct CsvDataset {
    pub x: Array2<f64>,
    /// Present when the label column exists in the file.
    pub y: Option<Vec<i32>>,
    pub feature_names: Vec<String>,
}

impl CsvDataset {
    pub fn labels(&self) -> Result<&[i32]> {
        self.y
            .as_deref()
            .ok_or_else(|| anyhow!("Dataset has no label column"))
    }
}

/// Configuration for reading CSV datasets.
#[derive(Debug, Clone)]
pub struct CsvReaderConfig {
    /// Column name holding integer class labels.
    pub label_column: String,
    /// Optional list of feature columns to load (in order).
    /// When `None`, every column except the label is a feature.
    pub feature_columns: Option<Vec<String>>,
    pub delimiter: u8,
}

impl Default for CsvReaderConfig {
    fn default() -> Self {
        Self {
            label_column: "label".to_string(),
            feature_columns: None,
            delimiter: b',',
        }
    }
}

/// Read a dataset whose label column is mandatory.
pub fn read_labeled_csv<P: AsRef<Path>>(path: P, config: &CsvReaderConfig) -> Result<CsvDataset> {
    let data = read_csv_dataset(&path, config)?;
    if data.y.is_none() {
        return Err(anyhow!(
            "Missing label column '{}' in {}",
            config.label_column,
            path.as_ref().display()
        ));
    }
    Ok(data)
}

/// Read a dataset; the label column is loaded when present.
pub fn read_csv_dataset<P: AsRef<Path>>(path: P, config: &CsvReaderConfig) -> Result<CsvDataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(&path)
        .with_context(|| format!("Failed to open dataset: {}", path.as_ref().display()))?;

    let headers = reader
        .headers()
        .context("Failed to read dataset header row")?
        .clone();

    let label_idx = find_column(&headers, &config.label_column);
    let feature_indices = resolve_feature_indices(&headers, config, label_idx)?;
    if feature_indices.is_empty() {
        return Err(anyhow!("No feature columns detected in dataset header"));
    }

    let mut features = Vec::new();
    let mut labels = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        if let Some(idx) = label_idx {
            let label = record
                .get(idx)
                .ok_or_else(|| anyhow!("Missing label value at row {}", row_idx + 1))?
                .parse::<i32>()
                .with_context(|| format!("Invalid label at row {}", row_idx + 1))?;
            labels.push(label);
        }

        for &idx in &feature_indices {
            let value = record
                .get(idx)
                .ok_or_else(|| anyhow!("Missing feature value at row {}", row_idx + 1))?;
            let parsed = value.parse::<f64>().with_context(|| {
                format!(
                    "Invalid feature '{}' at row {}",
                    headers.get(idx).unwrap_or(""),
                    row_idx + 1
                )
            })?;
            features.push(parsed);
        }
    }

    let n_samples = features.len() / feature_indices.len();
    let x = Array2::from_shape_vec((n_samples, feature_indices.len()), features)
        .context("Failed to build feature matrix")?;

    let feature_names = feature_indices
        .iter()
        .map(|&idx| headers.get(idx).unwrap_or("").to_string())
        .collect();

    log::debug!(
        "Read {} samples x {} features from {}",
        x.nrows(),
        x.ncols(),
        path.as_ref().display()
    );

    Ok(CsvDataset {
        x,
        y: label_idx.map(|_| labels),
        feature_names,
    })
}

/// Write one row per sample: the predicted class, then `proba_<class>` for
/// every class in `classes` order.
pub fn write_predictions<W: Write>(
    writer: W,
    classes: &[i32],
    predictions: &[i32],
    proba: ArrayView2<f64>,
) -> Result<()> {
    if proba.nrows() != predictions.len() || proba.ncols() != classes.len() {
        return Err(anyhow!(
            "Probability matrix {:?} does not match {} predictions over {} classes",
            proba.dim(),
            predictions.len(),
            classes.len()
        ));
    }

    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec!["prediction".to_string()];
    header.extend(classes.iter().map(|c| format!("proba_{}", c)));
    wtr.write_record(&header)
        .context("Failed to write prediction header")?;

    for (prediction, row) in predictions.iter().zip(proba.rows()) {
        let mut record = vec![prediction.to_string()];
        record.extend(row.iter().map(|p| p.to_string()));
        wtr.write_record(&record)
            .context("Failed to write prediction row")?;
    }
    wtr.flush().context("Failed to flush predictions")?;
    Ok(())
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(name))
}

fn resolve_feature_indices(
    headers: &StringRecord,
    config: &CsvReaderConfig,
    label_idx: Option<usize>,
) -> Result<Vec<usize>> {
    if let Some(names) = &config.feature_columns {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let idx = find_column(headers, name)
                .ok_or_else(|| anyhow!("Missing feature column '{}'", name))?;
            indices.push(idx);
        }
        return Ok(indices);
    }

    Ok((0..headers.len())
        .filter(|&idx| Some(idx) != label_idx)
        .collect())
}
