use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use mtmkl_classifiers::config::MtmklConfig;
use mtmkl_classifiers::io::CsvReaderConfig;

use crate::util::{delimiter_for, validate_tsv_or_csv_file};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TrainConfig {
    pub train_data: String,
    pub output_file: String,
    pub label_column: String,
    /// Feature columns to use, in order. Every non-label column when unset.
    pub feature_columns: Option<Vec<String>>,
    pub scale_features: bool,
    pub model: MtmklConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            train_data: String::new(),
            output_file: String::from("mtmkl_model.json"),
            label_column: String::from("label"),
            feature_columns: None,
            scale_features: true,
            model: MtmklConfig::default(),
        }
    }
}

impl TrainConfig {
    pub fn from_arguments(config_path: &PathBuf, matches: &ArgMatches) -> Result<Self> {
        let config_json = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let mut config: TrainConfig = serde_json::from_str(&config_json)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        // Apply CLI overrides
        if let Some(train_data) = matches.get_one::<String>("train_data") {
            validate_tsv_or_csv_file(train_data)?;
            config.train_data = train_data.clone();
        } else {
            validate_tsv_or_csv_file(&config.train_data)?;
        }

        if let Some(output_file) = matches.get_one::<String>("output_file") {
            config.output_file = output_file.clone();
        }

        Ok(config)
    }

    pub fn reader_config(&self) -> CsvReaderConfig {
        CsvReaderConfig {
            label_column: self.label_column.clone(),
            feature_columns: self.feature_columns.clone(),
            delimiter: delimiter_for(&self.train_data),
        }
    }
}
