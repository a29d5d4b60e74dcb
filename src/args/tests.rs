use super::parsers::{parse_duration_arg, parse_timeout_arg};
use super::*;
use crate::error::{AppError, AppResult};
use crate::test_support::parse_cli;
use clap::Parser;
use std::path::Path;
use std::time::Duration;

#[test]
fn parse_args_defaults() -> AppResult<()> {
    let args = parse_cli(["loadmix"])?;
    if args.command.is_some() {
        return Err(AppError::validation("Expected no subcommand"));
    }
    if args.duration.is_some() {
        return Err(AppError::validation("Expected no duration"));
    }
    if args.verbose || args.no_color {
        return Err(AppError::validation("Expected logging flags off"));
    }
    Ok(())
}

#[test]
fn parse_args_config_and_timeouts() -> AppResult<()> {
    let args = parse_cli([
        "loadmix",
        "--config",
        "custom.json",
        "--timeout-normal",
        "750ms",
        "--timeout-bad",
        "12.5",
        "--duration",
        "2m",
    ])?;
    if args.config != Path::new("custom.json") {
        return Err(AppError::validation("Unexpected config path"));
    }
    let timeouts = args.timeouts();
    if timeouts.normal != Duration::from_millis(750) {
        return Err(AppError::validation(format!(
            "Unexpected normal timeout: {:?}",
            timeouts.normal
        )));
    }
    if timeouts.expensive != Duration::from_millis(12_500) {
        return Err(AppError::validation(format!(
            "Unexpected expensive timeout: {:?}",
            timeouts.expensive
        )));
    }
    if args.duration != Some(Duration::from_secs(120)) {
        return Err(AppError::validation("Unexpected duration"));
    }
    Ok(())
}

#[test]
fn parse_args_worker_subcommand() -> AppResult<()> {
    let args = parse_cli([
        "loadmix",
        "--config",
        "run.json",
        "worker",
        "--target",
        "http://127.0.0.1:8080",
        "--index",
        "3",
    ])?;
    match args.command {
        Some(Command::Worker(worker)) => {
            if worker.target != "http://127.0.0.1:8080" {
                return Err(AppError::validation("Unexpected worker target"));
            }
            if worker.index != 3 {
                return Err(AppError::validation("Unexpected worker index"));
            }
        }
        None => return Err(AppError::validation("Expected worker subcommand")),
    }
    if args.config != Path::new("run.json") {
        return Err(AppError::validation("Global config flag was not kept"));
    }
    Ok(())
}

#[test]
fn parse_args_global_flags_after_subcommand() -> AppResult<()> {
    let args = parse_cli([
        "loadmix",
        "worker",
        "--target",
        "http://localhost:8080",
        "--timeout-normal",
        "1",
        "--verbose",
    ])?;
    if args.timeout_normal != Duration::from_secs(1) {
        return Err(AppError::validation("Unexpected normal timeout"));
    }
    if !args.verbose {
        return Err(AppError::validation("Expected verbose"));
    }
    Ok(())
}

#[test]
fn worker_subcommand_requires_target() -> AppResult<()> {
    if LoadArgs::try_parse_from(["loadmix", "worker"]).is_ok() {
        return Err(AppError::validation("Expected missing --target error"));
    }
    Ok(())
}

#[test]
fn parse_timeout_accepts_fractional_seconds() -> AppResult<()> {
    let cases = [
        ("2.5", Duration::from_millis(2_500)),
        ("0.25s", Duration::from_millis(250)),
        ("30", Duration::from_secs(30)),
        ("1500ms", Duration::from_millis(1_500)),
        ("1m", Duration::from_secs(60)),
    ];
    for (raw, expected) in cases {
        let parsed = parse_timeout_arg(raw)?;
        if parsed != expected {
            return Err(AppError::validation(format!(
                "Unexpected timeout for '{}': {:?}",
                raw, parsed
            )));
        }
    }
    Ok(())
}

#[test]
fn parse_timeout_rejects_non_positive() -> AppResult<()> {
    for raw in ["0", "-1", "0.0", "", "soon"] {
        if parse_timeout_arg(raw).is_ok() {
            return Err(AppError::validation(format!(
                "Expected error for timeout '{}'",
                raw
            )));
        }
    }
    Ok(())
}

#[test]
fn parse_duration_units() -> AppResult<()> {
    if parse_duration_arg("10")? != Duration::from_secs(10) {
        return Err(AppError::validation("Bare number should be seconds"));
    }
    if parse_duration_arg("2h")? != Duration::from_secs(7_200) {
        return Err(AppError::validation("Unexpected hour conversion"));
    }
    if parse_duration_arg("5d").is_ok() {
        return Err(AppError::validation("Expected unit error"));
    }
    if parse_duration_arg("0ms").is_ok() {
        return Err(AppError::validation("Expected zero duration error"));
    }
    Ok(())
}
