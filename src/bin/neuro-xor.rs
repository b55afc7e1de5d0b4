#[macro_use]
extern crate clap;
extern crate ne;
extern crate ne_core;

use anyhow::{Context, Result};
use clap::{App, Arg};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ne_core::evolution::NeuroEvolution;

use ne::bin_utils::args::{ArgAugmenter, EvolutionArgs, ModelArgs, StoreArgs};
use ne::example::{xor_builder, XorEnvironment, XOR_TABLE};
use ne::store::FileStore;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let app = App::new("neuro-xor")
        .version(crate_version!())
        .about("Evolves a neural network that computes exclusive or")
        .arg(
            Arg::with_name("generations")
                .short("g")
                .long("generations")
                .takes_value(true)
                .help("Number of generations to run.  Defaults to 100"),
        )
        .arg(
            Arg::with_name("target")
                .short("t")
                .long("target")
                .takes_value(true)
                .allow_hyphen_values(true)
                .help("Stop once the best score reaches this value"),
        );
    let app = ModelArgs.add_args(StoreArgs.add_args(EvolutionArgs.add_args(app)));
    let args = app.get_matches();

    let config = EvolutionArgs.load_from_args(&args)?;
    let model = ModelArgs.load_from_args(&args)?;
    let store_meta = StoreArgs.load_from_args(&args);
    let generations = if args.is_present("generations") {
        value_t!(args, "generations", usize)?
    } else {
        100
    };
    let target = if args.is_present("target") {
        Some(value_t!(args, "target", f32)?)
    } else {
        None
    };

    let store = FileStore::new(store_meta.folder.as_str(), store_meta.name.as_str())?;
    let builder = xor_builder(&model.hidden_nodes, model.defaults())?;
    let mut engine = NeuroEvolution::new(config, builder, XorEnvironment);
    if store_meta.resume {
        engine.setup_auto(&store)?;
    } else {
        engine.setup_from_scratch()?;
    }

    let reports = engine.run(generations, |engine, report| -> Result<bool> {
        store
            .save(&engine.snapshot(), None)
            .with_context(|| format!("saving generation {}", report.generation))?;
        Ok(target.map_or(true, |t| report.highscore < t))
    })?;
    info!(generations = reports.len(), "run finished");

    if let Some(best) = engine.best() {
        for (inputs, expected) in XOR_TABLE.iter() {
            let out = best.network().feed_forward(inputs)?;
            info!(a = inputs[0], b = inputs[1], expected = *expected, output = out[0], "xor");
        }
    }

    if store_meta.export {
        if let Some(export) = engine.export_best() {
            store.export(&export, None)?;
        }
    }
    Ok(())
}
