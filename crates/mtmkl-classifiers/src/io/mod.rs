pub mod csv_dataset;

pub use csv_dataset::{read_csv_dataset, read_labeled_csv, write_predictions, CsvDataset, CsvReaderConfig};
