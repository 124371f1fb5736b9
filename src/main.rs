use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use log::info;
use tracing_subscriber::EnvFilter;

use polymix::debug::dump_object;
use polymix::{list_methods_of, Composer, ComposerConfig, ConfigError, ObjectError, ObjectRef, Value};

mod scenarios;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    /// Eukaryote, Bacteria and NanoProbe mixed into Animal.
    Cells,
    /// Beeper and LaserShark mixed into KillerApp.
    KillerApp,
}

#[derive(Debug, Parser)]
#[command(name = "polymix", version, about = "Builds a mixin demo host and prints what it carries")]
struct Cli {
    #[arg(value_enum, default_value_t = Scenario::Cells)]
    scenario: Scenario,

    /// Merge strategy for the flat composition step (overrides config and env).
    #[arg(long)]
    strategy: Option<String>,

    /// TOML composer configuration.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<ComposerConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => ComposerConfig::load(path)?,
        None => ComposerConfig::default(),
    };
    config.apply_env()?;
    if let Some(strategy) = &cli.strategy {
        config.apply_strategy_override(strategy)?;
    }
    Ok(config)
}

fn print_host(host: &ObjectRef) {
    println!("{}", dump_object(host));
    #[cfg(feature = "debug_print_objects")]
    println!("{}", polymix::debug::describe_object(host));
    println!("methods: {}", list_methods_of(&Value::Object(host.clone())));
}

fn print_namespace(host: &ObjectRef, namespace: &str) {
    println!("{}: {}", namespace, list_methods_of(&host.get(namespace)));
}

fn run(scenario: Scenario, composer: &Composer) -> Result<(), ObjectError> {
    match scenario {
        Scenario::Cells => {
            let cells = scenarios::Cells::define();
            let host = cells.host()?;
            print_host(&host);
            print_namespace(&host, "NP");
            print_namespace(&host, "Bact");
            println!("{}", host.invoke("identify", &[])?);

            let probe = cells.nano_probe.construct(&[])?;
            println!("{}", probe.invoke("borgCapability1", &[Value::Number(41.0)])?);
        }
        Scenario::KillerApp => {
            let app = scenarios::KillerApp::define();
            let host = app.host()?;
            print_host(&host);
            print_namespace(&host, "Beeper");
            print_namespace(&host, "LaserShark");
            host.invoke("speak", &["Hello, world".into()])?;
            let beeper = host.get("Beeper");
            if let Some(beeper) = beeper.as_object() {
                beeper.invoke("beep", &[Value::Number(440.0)])?;
            }

            info!("composing LaserShark flat onto the host ({})", composer.strategy());
            let donor = app.flat_donor()?;
            let host_value = Value::Object(host.clone());
            match composer.compose(&host_value, &[donor.into()]) {
                Ok(_) => println!("lastPropertyToSetup: {}", host.get("lastPropertyToSetup")),
                Err(error @ (ObjectError::Conflict { .. } | ObjectError::NamespaceRequired { .. })) => {
                    println!("flat composition refused: {}", error)
                }
                Err(error) => return Err(error),
            }
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{}", error);
            process::exit(65);
        }
    };

    if let Err(error) = run(cli.scenario, &Composer::from_config(&config)) {
        eprintln!("{}", error);
        process::exit(70);
    }
}
