//! Model Validation CLI
//!
//! Checks model metadata files and validates JSON documents against them.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use familiar_validation::adapter::{ParseResult, StandardSchema};
use familiar_validation::metadata::load_models_dir;
use familiar_validation::{decode, ModelMetadata, Schema, SchemaCompiler, ValidatorConfig};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "model-validate")]
#[command(about = "Check model metadata and validate documents against it")]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and compile models, listing their fields
    Check {
        /// Model file or directory (defaults to loader.models_dir)
        path: Option<PathBuf>,
    },

    /// Validate a JSON document against a model
    Validate {
        /// Model metadata file
        #[arg(short, long)]
        model: PathBuf,
        /// Input document ("-" for stdin)
        #[arg(short, long, default_value = "-")]
        input: String,
        /// Validate a single field only
        #[arg(short, long)]
        field: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match ValidatorConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to load configuration: {}", e);
            std::process::exit(2);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command, &config) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn run(command: Commands, config: &ValidatorConfig) -> anyhow::Result<bool> {
    let compiler = SchemaCompiler::from_config(config);

    match command {
        Commands::Check { path } => {
            let path = match path.or_else(|| config.models_dir()) {
                Some(path) => path,
                None => bail!("no model path given and loader.models_dir is not configured"),
            };

            let models = if path.is_dir() {
                load_models_dir(&path)?
            } else {
                let model = ModelMetadata::from_path(&path)
                    .with_context(|| format!("loading {}", path.display()))?;
                vec![model]
            };

            for model in &models {
                let schema = compiler.compile(model);
                println!("✅ {} ({} fields)", model.name, schema.len());
                for field in &model.fields {
                    let compiled = compiler.compile_field(field);
                    println!(
                        "  └─ {}: {}{}{}",
                        field.name,
                        field.field_type.data_type,
                        if compiled.is_optional() { "" } else { ", required" },
                        constraint_note(&compiled),
                    );
                }
            }
            Ok(true)
        }

        Commands::Validate { model, input, field } => {
            let model = ModelMetadata::from_path(&model)
                .with_context(|| format!("loading {}", model.display()))?;
            let document = read_input(&input)?;
            let schema = compiler.compile(&model);

            let result = match field {
                Some(name) => match decode::validate_field(&schema, &name, document.get(&name)) {
                    Ok(value) => ParseResult::success(value.unwrap_or(Value::Null)),
                    Err(error) => ParseResult::failure(decode::field_failure_errors(
                        &name,
                        error,
                        compiler.generic_message(),
                    )),
                },
                None => compiler.adapter(schema).parse(&document),
            };

            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(result.success)
        }
    }
}

fn constraint_note(schema: &Schema) -> String {
    match schema.constraints().len() {
        0 => String::new(),
        1 => ", 1 constraint".to_string(),
        n => format!(", {} constraints", n),
    }
}

fn read_input(input: &str) -> anyhow::Result<Value> {
    let content = if input == "-" {
        std::io::read_to_string(std::io::stdin()).context("reading stdin")?
    } else {
        std::fs::read_to_string(Path::new(input)).with_context(|| format!("reading {}", input))?
    };
    Ok(serde_json::from_str(&content)?)
}
