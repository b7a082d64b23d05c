//! aqpipe: config-driven classification CLI
//!
//! Validates the pipeline config, loads the dataset, splits and scales it,
//! trains the configured model and reports metrics on the test partition.

use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use aqpipe::cli::Cli;
use aqpipe::config::load_config;
use aqpipe::pipeline::{Pipeline, StepTimings};
use aqpipe::report::{display_classification_report, display_confusion_matrix, display_run_summary, export_run_report};
use aqpipe::utils::{
    abandon, create_spinner, finish_with_success, finish_with_warning, init_logging, print_banner, print_completion,
    print_config, print_error, print_info, print_step_header, print_step_time, print_success,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let quiet = cli.quiet;
    if !quiet {
        print_banner(env!("CARGO_PKG_VERSION"));
    }

    let mut config =
        load_config(&cli.config).with_context(|| format!("Invalid config file: {}", cli.config.display()))?;
    if let Some(target) = &cli.target {
        config = config
            .with_target_column(target.as_str())
            .context("Invalid --target override")?;
    }
    if !quiet {
        print_config(&cli.config, &config);
    }

    let pipeline = Pipeline::from_config(config);
    let source = pipeline.config().data_loader();
    let mut timings = StepTimings::default();

    // Step 1: Load dataset
    if !quiet {
        print_step_header(1, "Load Dataset");
    }
    let step_start = Instant::now();
    let spinner = create_spinner(&format!("Reading {} file...", source.file_type()), quiet);
    let df = match pipeline.load() {
        Ok(df) => df,
        Err(e) => {
            abandon(&spinner);
            return Err(e).with_context(|| format!("Failed to load {}", source.file_path().display()));
        }
    };
    finish_with_success(&spinner, "Dataset loaded");
    timings.load = step_start.elapsed();
    if !quiet {
        println!("\n    {} Dataset Statistics:", style("✧").cyan());
        println!("      Rows: {}", df.height());
        println!("      Columns: {}", df.width());
        print_step_time(timings.load);
    }

    let mut model = pipeline.build_model().context("Failed to resolve model")?;

    // Step 2: Preprocess
    if !quiet {
        print_step_header(2, "Preprocess");
    }
    let step_start = Instant::now();
    let split = pipeline.preprocess(&df).context("Preprocessing failed")?;
    timings.preprocess = step_start.elapsed();
    if !quiet {
        print_success(&format!(
            "Split {} rows into {} train / {} test",
            df.height(),
            split.train_rows(),
            split.test_rows()
        ));
        match &split.scaler {
            Some(scaler) => print_info(&format!(
                "Scaled {} column(s) with {} scaling",
                scaler.columns().len(),
                scaler.method()
            )),
            None => print_info("Normalization disabled"),
        }
        print_step_time(timings.preprocess);
    }

    // Step 3: Train
    if !quiet {
        print_step_header(3, "Train Model");
    }
    let step_start = Instant::now();
    let spinner = create_spinner(&format!("Training {}...", pipeline.config().model().kind()), quiet);
    if let Err(e) = pipeline.train(&mut model, &split) {
        abandon(&spinner);
        return Err(e).context("Training failed");
    }
    finish_with_success(&spinner, "Model trained");
    timings.train = step_start.elapsed();
    if !quiet {
        print_step_time(timings.train);
    }

    // Step 4: Predict
    if !quiet {
        print_step_header(4, "Predict");
    }
    let step_start = Instant::now();
    let spinner = create_spinner("Predicting test rows...", quiet);
    let predictions = match pipeline.predict(&model, &split) {
        Ok(predictions) => predictions,
        Err(e) => {
            abandon(&spinner);
            return Err(e).context("Prediction failed");
        }
    };
    if predictions.is_empty() {
        finish_with_warning(&spinner, "Test partition is empty; nothing to predict");
    } else {
        finish_with_success(&spinner, &format!("{} predictions", predictions.len()));
    }
    timings.predict = step_start.elapsed();
    if !quiet {
        print_step_time(timings.predict);
    }

    let outcome = pipeline.outcome(df.height(), &split, &model, predictions, timings)?;

    if !quiet {
        display_run_summary(&outcome);
        display_classification_report(&outcome.metrics);
        display_confusion_matrix(&outcome.metrics);
    }

    if let Some(report_path) = &cli.report {
        export_run_report(&outcome, Some(&cli.config), report_path)?;
        if !quiet {
            println!();
            print_success(&format!("Report written to {}", report_path.display()));
        }
    }

    if !quiet {
        print_completion();
    }

    Ok(())
}
