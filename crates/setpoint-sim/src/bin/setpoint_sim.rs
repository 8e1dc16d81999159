use anyhow::{bail, Context, Result};
use std::time::Duration;

use setpoint_sim::{run, PathConfig, ScenarioConfig};
use setpoint_transport::config::SetpointConfig;

fn usage() -> &'static str {
    "usage: setpoint-sim [--scenario drop|walk] [--seed N] [--duration-ms N] [--step-ms N] \
     [--config FILE] [--trace]"
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut args = std::env::args().skip(1);

    let mut scenario_name = String::from("drop");
    let mut seed = 1u64;
    let mut duration_ms = None;
    let mut step_ms = None;
    let mut config_path = None;
    let mut trace = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--scenario" => {
                scenario_name = args.next().context("missing --scenario value")?;
            }
            "--seed" => {
                seed = args.next().context("missing --seed value")?.parse()?;
            }
            "--duration-ms" => {
                duration_ms = Some(args.next().context("missing --duration-ms value")?.parse::<u64>()?);
            }
            "--step-ms" => {
                step_ms = Some(args.next().context("missing --step-ms value")?.parse::<u64>()?);
            }
            "--config" => {
                config_path = Some(args.next().context("missing --config value")?);
            }
            "--trace" => trace = true,
            "-h" | "--help" => {
                println!("{}", usage());
                return Ok(());
            }
            other => bail!("unknown argument {other:?}\n{}", usage()),
        }
    }

    let cfg = match &config_path {
        Some(path) => SetpointConfig::from_file(path)?,
        None => {
            let mut cfg = SetpointConfig::default();
            cfg.controller.enabled = true;
            cfg
        }
    };

    let mut scenario = match scenario_name.as_str() {
        "drop" => ScenarioConfig::capacity_drop(seed),
        "walk" => ScenarioConfig::random_walk(
            seed,
            Duration::from_millis(duration_ms.unwrap_or(30_000)),
            PathConfig::default(),
            0.25,
            4.0,
        ),
        other => bail!("unknown scenario {other:?} (expected drop or walk)"),
    };
    if let Some(ms) = duration_ms {
        scenario.duration = Duration::from_millis(ms);
    }
    if let Some(ms) = step_ms {
        scenario.step = Duration::from_millis(ms.max(1));
    }
    scenario.record_trace = trace;

    tracing::info!(
        scenario = %scenario_name,
        seed,
        enabled = cfg.controller.enabled,
        gain = cfg.controller.gain,
        target = cfg.controller.target_latency_ms,
        "starting simulation"
    );

    let report = run(&scenario, &cfg.controller, &cfg.window);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
