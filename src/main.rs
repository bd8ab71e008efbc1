//! Merit-order calculator entry point: CLI wiring and config-driven order construction.

use std::path::Path;
use std::process;

use tracing::info;
use tracing_subscriber::EnvFilter;

use merit_order::calc::Calculate;
use merit_order::config::ScenarioConfig;
use merit_order::io::export::export_csv;
use merit_order::summary::RunSummary;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    loads_out: Option<String>,
}

fn print_help() {
    eprintln!("merit-order: merit-order dispatch over a planning horizon");
    eprintln!();
    eprintln!("Usage: merit-order [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Override random seed for generated profiles");
    eprintln!("  --loads-out <path>       Export per-point loads to CSV");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        loads_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --scenario requires a path argument");
                    process::exit(1);
                }
                cli.scenario_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--loads-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --loads-out requires a path argument");
                    process::exit(1);
                }
                cli.loads_out = Some(args[i].clone());
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    if cli.scenario_path.is_some() && cli.preset.is_some() {
        eprintln!("error: --scenario and --preset are mutually exclusive");
        process::exit(1);
    }

    cli
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();

    // --scenario takes priority, then --preset, then baseline
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::baseline()
    };

    if let Some(seed) = cli.seed_override {
        scenario.horizon.seed = seed;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let (mut order, calculator) = match (scenario.build_order(), scenario.build_calculator()) {
        (Ok(order), Ok(calculator)) => (order, calculator),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    info!(
        points = order.points(),
        producers = order.producers().len(),
        users = order.users().len(),
        calculator = calculator.name(),
        "running merit order"
    );

    if let Err(e) = calculator.calculate(&mut order) {
        eprintln!("error: {e}");
        process::exit(1);
    }

    println!("{}", RunSummary::from_order(&order));

    if let Some(ref path) = cli.loads_out {
        if let Err(e) = export_csv(&order, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Loads written to {path}");
    }
}
