use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use doodle_game::sim::{run_simulator, SimulatorConfig};
use doodle_game::GameConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let cli = Command::new("doodle")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Doodle Rush drawing-guessing game engine")
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("simulate")
                .about("Play one seeded game with a simulated artist and classifier")
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("skill")
                        .long("skill")
                        .default_value("0.5")
                        .value_parser(value_parser!(f64))
                        .help("How quickly sketches become recognisable (0-1)"),
                )
                .arg(
                    Arg::new("latency-ms")
                        .long("latency-ms")
                        .default_value("40")
                        .value_parser(value_parser!(u64))
                        .help("Simulated inference latency"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Game config TOML file"),
                )
                .arg(
                    Arg::new("fail-load")
                        .long("fail-load")
                        .action(ArgAction::SetTrue)
                        .help("Make the classifier fail to load"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Print the effective game config as TOML")
                .arg(
                    Arg::new("path")
                        .long("path")
                        .value_parser(value_parser!(PathBuf))
                        .help("Config file to load and validate"),
                ),
        );

    let matches = cli.get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("simulate", args)) => simulate(args),
        Some(("config", args)) => {
            let config = load_config(args.get_one::<PathBuf>("path"))?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        _ => {
            println!("Doodle Rush");
            println!("Run with --help for usage");
            Ok(())
        }
    }
}

fn simulate(args: &ArgMatches) -> anyhow::Result<()> {
    let config = SimulatorConfig {
        seed: args.get_one::<u64>("seed").copied().unwrap_or(42),
        skill: args.get_one::<f64>("skill").copied().unwrap_or(0.5),
        latency: Duration::from_millis(args.get_one::<u64>("latency-ms").copied().unwrap_or(40)),
        fail_load: args.get_flag("fail-load"),
        game: load_config(args.get_one::<PathBuf>("config"))?,
    };

    // Game time is simulated; the paused clock jumps to the next timer
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .context("failed to build tokio runtime")?;
    let report = runtime.block_on(run_simulator(config))?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.generate_text());
    }

    std::process::exit(if report.passed() { 0 } else { 1 });
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<GameConfig> {
    match path {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("cannot use config {}", path.display())),
        None => Ok(GameConfig::default()),
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
