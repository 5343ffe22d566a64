pub mod cli;
pub mod engine;
pub mod group;
pub mod index;
pub mod intent;
pub mod normalize;
pub mod resolve;
pub mod roles;
pub mod source;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, InputArgs},
    engine::DatasetManager,
    intent::Modifiers,
    source::CsvTableSource,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("stock_query", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Roles(args) => handle_roles(&args),
        Commands::Query(args) => handle_query(&args),
        Commands::Suggest(args) => handle_suggest(&args),
    }
}

fn manager_for(input: &InputArgs) -> Result<DatasetManager> {
    let encoding = source::resolve_encoding(input.input_encoding.as_deref())?;
    let source = CsvTableSource::new(input.input.clone(), input.delimiter, encoding);
    Ok(DatasetManager::new(Box::new(source)))
}

fn handle_roles(args: &cli::RolesArgs) -> Result<()> {
    let manager = manager_for(&args.input)?;
    let snapshot = manager
        .reload()
        .with_context(|| format!("Loading {:?}", args.input.input))?;
    info!(
        "Inferred {} role(s) over {} record(s)",
        snapshot.roles().len(),
        snapshot.records().len()
    );
    let assignments: serde_json::Map<String, serde_json::Value> = snapshot
        .roles()
        .entries()
        .map(|(role, column)| (role.as_str().to_string(), serde_json::json!(column)))
        .collect();
    println!("{}", serde_json::to_string_pretty(&assignments)?);
    Ok(())
}

fn handle_query(args: &cli::QueryArgs) -> Result<()> {
    let manager = manager_for(&args.input)?;
    let modifiers = Modifiers {
        stock_only: args.stock_only,
        negative_only: args.negative_only,
        single_unit_only: args.single_unit,
        brand: args.brand.clone(),
        category: args.category.clone(),
        size_min: args.size_min,
        size_max: args.size_max,
    };
    let result = manager
        .query(&args.question, &modifiers)
        .with_context(|| format!("Answering '{}'", args.question))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn handle_suggest(args: &cli::SuggestArgs) -> Result<()> {
    let manager = manager_for(&args.input)?;
    let suggestions = manager
        .suggest(&args.prefix)
        .with_context(|| format!("Completing '{}'", args.prefix))?;
    println!("{}", serde_json::to_string_pretty(&suggestions)?);
    Ok(())
}
