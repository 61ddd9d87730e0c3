use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use mtmkl_cli::inference::inference;
use mtmkl_cli::train::input::TrainConfig;
use mtmkl_cli::train::trainer;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("MTMKL_LOG", "error,mtmkl=info"))
        .init();

    let matches = Command::new("mtmkl")
        .version(clap::crate_version!())
        .author("Justin Sing <justincsing@gmail.com>")
        .about("MTMKL - multi-task multiple-kernel-learning classifier")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train a classifier from a labeled CSV/TSV file")
                .arg(
                    Arg::new("config")
                        .help("Path to training configuration file")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("train_data")
                        .short('d')
                        .long("train_data")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to training data. Overrides the training data file \
                             specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output_file")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "File path that the trained model (JSON) will be written to. \
                             Overrides the path specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Predict classes and class probabilities with a trained model")
                .arg(model_arg())
                .arg(data_arg("Path to the input data file"))
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output_file")
                        .help("Path to the output CSV file for predictions. Defaults to stdout.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(label_column_arg()),
        )
        .subcommand(
            Command::new("score")
                .about("Report accuracy of a trained model on labeled data")
                .arg(model_arg())
                .arg(data_arg("Path to the labeled data file"))
                .arg(label_column_arg()),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Written by {author-with-newline}Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        Some(("score", sub_m)) => handle_score(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn model_arg() -> Arg {
    Arg::new("model_path")
        .short('m')
        .long("model")
        .help("Path to the trained model file (*.json)")
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn data_arg(help: &'static str) -> Arg {
    Arg::new("data")
        .short('d')
        .long("data")
        .help(help)
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn label_column_arg() -> Arg {
    Arg::new("label_column")
        .long("label-column")
        .help("Name of the label column")
        .default_value("label")
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let Some(config_path) = matches.get_one::<PathBuf>("config") else {
        eprintln!("[MTMKL::Train] No config file provided; printing a template configuration.");
        println!("{}", serde_json::to_string_pretty(&TrainConfig::default())?);
        return Ok(());
    };
    log::info!("[MTMKL::Train] Training from config: {:?}", config_path);

    let params = TrainConfig::from_arguments(config_path, matches)?;

    match trainer::run_training(&params) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let (model_path, data_path, label_column) = common_paths(matches)?;
    let output_path: Option<&PathBuf> = matches.get_one("output_file");
    log::info!("[MTMKL::Predict] Predicting {:?} with {:?}", data_path, model_path);

    match inference::run_prediction(
        model_path,
        data_path,
        output_path.map(|p| p.as_path()),
        label_column,
    ) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("Prediction failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_score(matches: &ArgMatches) -> Result<()> {
    let (model_path, data_path, label_column) = common_paths(matches)?;

    match inference::run_scoring(model_path, data_path, label_column) {
        Ok(summary) => {
            println!("samples\t{}", summary.n_samples);
            println!("accuracy\t{:.4}", summary.accuracy);
            println!("majority_baseline\t{:.4}", summary.baseline_accuracy);
            Ok(())
        }
        Err(e) => {
            log::error!("Scoring failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn common_paths(matches: &ArgMatches) -> Result<(&PathBuf, &PathBuf, &str)> {
    let model_path: &PathBuf = matches
        .get_one("model_path")
        .ok_or_else(|| anyhow::anyhow!("--model is required"))?;
    let data_path: &PathBuf = matches
        .get_one("data")
        .ok_or_else(|| anyhow::anyhow!("--data is required"))?;
    let label_column = matches
        .get_one::<String>("label_column")
        .map(String::as_str)
        .unwrap_or("label");
    Ok((model_path, data_path, label_column))
}
