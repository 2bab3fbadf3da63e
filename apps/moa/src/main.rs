use std::process::ExitCode;

use anyhow::{Context, Result};
use driver::{cli_output, Command, Driver, DriverError, Format};
use env_logger::Env;
use log::LevelFilter;
use manifest::Config;

const LOG_ENV: &str = "MOA_LOG";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let format = if has_flag(&args, "--json") {
        Format::Json
    } else {
        Format::Text
    };
    init_logging(has_flag(&args, "--verbose"));

    let filtered: Vec<String> = args
        .into_iter()
        .filter(|a| a != "--json" && a != "--verbose")
        .collect();
    let command = Command::parse(&filtered);

    match run(&command, format) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&command, format, &err);
            ExitCode::FAILURE
        }
    }
}

fn run(command: &Command, format: Format) -> Result<()> {
    if let Some(output) = driver::local_output(command) {
        print!("{}", cli_output::render_success(format, command, &output));
        return Ok(());
    }

    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let config = Config::discover(&cwd).context("failed to load configuration")?;
    log::debug!(
        "toolchain={} scratch_dir={}",
        config.program(),
        config.scratch_dir().display()
    );
    let driver = Driver::new(&config);
    let output = driver.dispatch(command)?;
    print!("{}", cli_output::render_success(format, command, &output));
    Ok(())
}

fn report(command: &Command, format: Format, err: &anyhow::Error) {
    if let Some(driver_err) = err.downcast_ref::<DriverError>() {
        print!("{}", cli_output::render_failure(format, command, driver_err));
        if format == Format::Text {
            eprintln!("error: {driver_err}");
        }
        return;
    }
    match format {
        Format::Text => eprintln!("error: {err:#}"),
        Format::Json => println!(
            "{}",
            serde_json::json!({
                "command": command.name(),
                "status": "error",
                "error": "config",
                "message": format!("{err:#}"),
            })
        ),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let mut builder = env_logger::Builder::from_env(
        Env::new().filter_or(LOG_ENV, default_level.as_str()),
    );
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}
