use std::str::FromStr;

use clap::{App, Arg, ArgMatches};
use ne_core::evolution::{EvolutionConfig, FailurePolicy};
use ne_core::ConfigError;
use ne_models::activation;
use thiserror::Error;

use super::model_params::ModelParams;

/// Trait to add new arguments to the current app
pub trait ArgAugmenter {
    /// Type of struct to output from this parser
    type Output;

    /// Specifies arguments to add
    fn add_args<'a, 'b>(&self, app: App<'a, 'b>) -> App<'a, 'b>;

    /// Parses the arguments
    fn load_from_args<'a>(&self, args: &ArgMatches<'a>) -> Self::Output;
}

#[derive(Debug, Error)]
/// Failures turning command line arguments into settings
pub enum ArgsError {
    /// Value could not be parsed
    #[error(transparent)]
    Clap(#[from] clap::Error),

    /// Config file could not be read or the result is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// Parses `name` if it was given
fn optional<T: FromStr>(args: &ArgMatches, name: &str) -> Result<Option<T>, clap::Error> {
    if args.is_present(name) {
        value_t!(args, name, T).map(Some)
    } else {
        Ok(None)
    }
}

/// Struct defining the evolution settings using ArgAugmenter.  A JSON config file is
/// read first and individual flags override its fields.
pub struct EvolutionArgs;

impl ArgAugmenter for EvolutionArgs {
    type Output = Result<EvolutionConfig, ArgsError>;

    fn add_args<'a, 'b>(&self, app: App<'a, 'b>) -> App<'a, 'b> {
        app
      .arg(Arg::with_name("config")
           .short("c")
           .long("config")
           .takes_value(true)
           .help("JSON file with evolution settings.  Missing fields use defaults"))
      .arg(Arg::with_name("population")
           .short("p")
           .long("population")
           .takes_value(true)
           .help("Number of genomes per generation"))
      .arg(Arg::with_name("keep")
           .long("keep")
           .takes_value(true)
           .help("Leaders carried over unmutated"))
      .arg(Arg::with_name("random_add")
           .long("random-add")
           .takes_value(true)
           .help("Brand new genomes per generation"))
      .arg(Arg::with_name("random_mutate")
           .long("random-mutate")
           .takes_value(true)
           .help("Mutants of randomly chosen members per generation"))
      .arg(Arg::with_name("best_n")
           .long("best-n")
           .takes_value(true)
           .help("Size of the elite the remaining mutants are drawn from"))
      .arg(Arg::with_name("learning_rate")
           .short("l")
           .long("learning-rate")
           .takes_value(true)
           .help("Mutation bound at generation zero"))
      .arg(Arg::with_name("decay")
           .long("decay")
           .takes_value(true)
           .help("Per generation factor applied to the learning rate"))
      .arg(Arg::with_name("mutation_chance")
           .short("m")
           .long("mutation-chance")
           .takes_value(true)
           .help("Probability that a single parameter is perturbed"))
      .arg(Arg::with_name("seed")
           .long("seed")
           .takes_value(true)
           .help("Seed for a reproducible run"))
      .arg(Arg::with_name("sequential")
           .long("sequential")
           .help("Evaluate genomes on the calling thread"))
      .arg(Arg::with_name("penalize")
           .long("penalize")
           .help("Rank failing genomes last instead of aborting"))
    }

    fn load_from_args<'a>(&self, args: &ArgMatches<'a>) -> Self::Output {
        let mut config = match args.value_of("config") {
            Some(path) => EvolutionConfig::from_json_file(path)?,
            None => EvolutionConfig::default(),
        };

        if let Some(v) = optional(args, "population")? {
            config.set_population_size(v);
        }
        if let Some(v) = optional(args, "keep")? {
            config.set_keep(v);
        }
        if let Some(v) = optional(args, "random_add")? {
            config.set_random_add(v);
        }
        if let Some(v) = optional(args, "random_mutate")? {
            config.set_random_mutate(v);
        }
        if let Some(v) = optional(args, "best_n")? {
            config.set_best_n(v);
        }
        if let Some(v) = optional(args, "learning_rate")? {
            config.set_learning_rate_base(v);
        }
        if let Some(v) = optional(args, "decay")? {
            config.set_learning_rate_factor(v);
        }
        if let Some(v) = optional(args, "mutation_chance")? {
            config.set_mutation_chance(v);
        }
        if let Some(seed) = optional::<u64>(args, "seed")? {
            config.set_seed(Some(seed));
        }
        if args.is_present("sequential") {
            config.set_parallel(false);
        }
        if args.is_present("penalize") {
            config.set_on_failure(FailurePolicy::Penalize);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Where a run is persisted
#[derive(Clone, Debug, PartialEq)]
pub struct StoreMeta {
    /// Folder holding snapshots and exports
    pub folder: String,
    /// Name of the run, used in file names
    pub name: String,
    /// Whether to continue from the latest snapshot
    pub resume: bool,
    /// Whether to export the best network at the end
    pub export: bool,
}

/// Struct defining the store arguments using ArgAugmenter
pub struct StoreArgs;

impl ArgAugmenter for StoreArgs {
    type Output = StoreMeta;

    fn add_args<'a, 'b>(&self, app: App<'a, 'b>) -> App<'a, 'b> {
        app.arg(
            Arg::with_name("folder")
                .short("f")
                .long("folder")
                .takes_value(true)
                .help("Folder for snapshots and exports.  Defaults to `data`"),
        )
        .arg(
            Arg::with_name("name")
                .short("n")
                .long("name")
                .takes_value(true)
                .help("Name of the run.  Defaults to `xor`"),
        )
        .arg(
            Arg::with_name("resume")
                .long("resume")
                .help("Continue from the latest snapshot, if there is one"),
        )
        .arg(
            Arg::with_name("export")
                .long("export")
                .help("Export the best network when done"),
        )
    }

    fn load_from_args<'a>(&self, args: &ArgMatches<'a>) -> Self::Output {
        StoreMeta {
            folder: args.value_of("folder").unwrap_or("data").to_string(),
            name: args.value_of("name").unwrap_or("xor").to_string(),
            resume: args.is_present("resume"),
            export: args.is_present("export"),
        }
    }
}

/// Struct defining the network arguments using ArgAugmenter
pub struct ModelArgs;

impl ArgAugmenter for ModelArgs {
    type Output = Result<ModelParams, ArgsError>;

    fn add_args<'a, 'b>(&self, app: App<'a, 'b>) -> App<'a, 'b> {
        let names: Vec<&'static str> = activation::names().collect();
        app.arg(
            Arg::with_name("hidden")
                .long("hidden")
                .takes_value(true)
                .multiple(true)
                .help("Hidden layer sizes"),
        )
        .arg(
            Arg::with_name("activation")
                .short("a")
                .long("activation")
                .takes_value(true)
                .possible_values(&names)
                .help("Activation function for every neuron"),
        )
        .arg(
            Arg::with_name("weight")
                .long("weight")
                .takes_value(true)
                .allow_hyphen_values(true)
                .help("Fixed initial weight instead of a random one"),
        )
        .arg(
            Arg::with_name("bias")
                .long("bias")
                .takes_value(true)
                .allow_hyphen_values(true)
                .help("Fixed initial bias instead of a random one"),
        )
    }

    fn load_from_args<'a>(&self, args: &ArgMatches<'a>) -> Self::Output {
        let mut params = ModelParams::default();
        if args.is_present("hidden") {
            params.hidden_nodes = values_t!(args, "hidden", usize)?;
        }
        if let Some(name) = args.value_of("activation") {
            params.activation = name.to_string();
        }
        params.weight = optional(args, "weight")?;
        params.bias = optional(args, "bias")?;
        Ok(params)
    }
}
