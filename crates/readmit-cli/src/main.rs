use std::path::PathBuf;

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use serde::Serialize;

use readmit_classifiers::inference::PatientRecord;
use readmit_cli::serve;
use readmit_cli::serve::input::ServeConfig;
use readmit_cli::train::input::TrainConfig;
use readmit_cli::train::trainer;
use readmit_cli::ui;
use readmit_cli::ui::input::UiConfig;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("READMIT_LOG", "error,readmit=info"))
        .init();

    let config_arg = |help: &'static str| {
        Arg::new("config")
            .help(help)
            .required(false)
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath)
    };
    let api_url_arg = Arg::new("api_url")
        .long("api-url")
        .help("Base URL of the inference API. Overrides the configuration file.")
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
        .value_hint(ValueHint::Url);
    let timeout_arg = Arg::new("timeout")
        .long("timeout")
        .help("Seconds to wait for the inference API before giving up.")
        .value_parser(clap::value_parser!(u64));
    let host_arg = Arg::new("host")
        .long("host")
        .help("Address to bind. Overrides the configuration file.")
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
        .value_hint(ValueHint::Hostname);
    let port_arg = Arg::new("port")
        .short('p')
        .long("port")
        .help("Port to listen on. Overrides the configuration file.")
        .value_parser(clap::value_parser!(u16));
    let artifact_dir_arg = Arg::new("artifact_dir")
        .short('o')
        .long("artifact-dir")
        .help("Directory holding the model, imputer and scaler artifacts.")
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
        .value_hint(ValueHint::DirPath);

    let matches = Command::new("readmit")
        .version(clap::crate_version!())
        .about("\u{1F3E5} readmit - 30-day hospital readmission risk scoring")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Fit the imputer, scaler and both tree ensembles, then write the artifacts")
                .arg(config_arg("Path to training configuration file"))
                .arg(
                    Arg::new("train_data")
                        .short('d')
                        .long("train-data")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to the training table (CSV or TSV). Overrides the training \
                             data file specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(artifact_dir_arg.clone())
                .arg(
                    Arg::new("target_column")
                        .long("target")
                        .help("Name of the 0/1 label column.")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for the train/validation split.")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("report_file")
                        .long("report")
                        .help("Path of the HTML training report.")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("no_report")
                        .long("no-report")
                        .help("Disable HTML report generation.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("serve")
                .about("Serve the inference API (POST /predict, GET /health)")
                .arg(config_arg("Path to service configuration file"))
                .arg(host_arg.clone())
                .arg(port_arg.clone())
                .arg(artifact_dir_arg),
        )
        .subcommand(
            Command::new("ui")
                .about("Serve the patient form that calls the inference API")
                .arg(config_arg("Path to UI configuration file"))
                .arg(host_arg)
                .arg(port_arg)
                .arg(api_url_arg.clone())
                .arg(timeout_arg.clone()),
        )
        .subcommand(
            Command::new("predict")
                .about("Score one patient through the inference API")
                .arg(
                    Arg::new("age")
                        .long("age")
                        .required(true)
                        .help("Age in years.")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("bmi")
                        .long("bmi")
                        .required(true)
                        .help("Body mass index.")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("num_prior_admissions")
                        .long("prior-admissions")
                        .required(true)
                        .help("Number of prior admissions.")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(api_url_arg)
                .arg(timeout_arg),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("serve", sub_m)) => handle_serve(sub_m),
        Some(("ui", sub_m)) => handle_ui(sub_m),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

/// Print the default configuration so it can be saved and edited.
fn print_template<T: Serialize>(config: &T) -> Result<()> {
    eprintln!("[readmit] No config file provided; printing the default configuration template.");
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Runtime::new()?)
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config_path = matches.get_one::<PathBuf>("config");
    if config_path.is_none() && matches.get_one::<String>("train_data").is_none() {
        return print_template(&TrainConfig::default());
    }
    if let Some(path) = config_path {
        log::info!("[readmit::train] Training from config: {:?}", path);
    }

    let params = TrainConfig::from_arguments(config_path, matches)?;
    match trainer::run_training(&params) {
        Ok(summary) => {
            eprintln!(
                "[readmit::train] Trained on features: {}",
                summary.feature_columns.join(", ")
            );
            for (name, report) in &summary.reports {
                eprintln!(
                    "[readmit::train] {} validation accuracy: {:.3}",
                    name, report.accuracy
                );
            }
            for path in summary.artifacts.all() {
                eprintln!("[readmit::train] Wrote {}", path.display());
            }
            if let Some(report_file) = &summary.report_file {
                eprintln!("[readmit::train] Report: {}", report_file.display());
            }
            Ok(())
        }
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_serve(matches: &ArgMatches) -> Result<()> {
    let params = ServeConfig::from_arguments(matches.get_one::<PathBuf>("config"), matches)?;
    match runtime()?.block_on(serve::run(&params)) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("Inference API failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_ui(matches: &ArgMatches) -> Result<()> {
    let params = UiConfig::from_arguments(matches.get_one::<PathBuf>("config"), matches)?;
    match runtime()?.block_on(ui::run(&params)) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("Form UI failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let params = UiConfig::from_arguments(None, matches)?;
    let record = PatientRecord {
        age: *matches.get_one::<f64>("age").unwrap_or(&45.0),
        bmi: *matches.get_one::<f64>("bmi").unwrap_or(&25.0),
        num_prior_admissions: *matches.get_one::<u32>("num_prior_admissions").unwrap_or(&0),
    };
    match runtime()?.block_on(ui::run_predict(&params, record)) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Prediction failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
