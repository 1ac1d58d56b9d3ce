use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use config::{GenerateConfig, Settings};
use repogen_analyzer::analyze;
use repogen_resolver::{GenerationResolver, OutputSpec};
use std::path::PathBuf;

mod config;

#[derive(Parser)]
#[command(name = "repogen")]
#[command(about = "Resolve Go repository interfaces into generation models", long_about = None)]
#[command(version)]
struct Cli {
    /// Source file with the repository interface definition
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Repository interface symbol
    #[arg(short, long)]
    repository: Option<String>,

    /// Destination for the generated file
    #[arg(short, long)]
    destination: Option<PathBuf>,

    /// Package name for the generated file
    #[arg(short, long)]
    package: Option<String>,

    /// Implementation symbol for the generated repository
    #[arg(short, long)]
    implementation: Option<String>,

    /// TOML file providing any of the settings above (flags take precedence)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// What to print on stdout
    #[arg(long, value_enum, default_value_t = Emit::Model)]
    emit: Emit,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Generation model for the emitter
    Model,
    /// Raw interface descriptor from the analyzer
    Descriptor,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let file = match &self.config {
            Some(path) => GenerateConfig::load(path)?,
            None => GenerateConfig::default(),
        };
        let flags = GenerateConfig {
            source: self.source.clone(),
            repository: self.repository.clone(),
            destination: self.destination.clone(),
            package: self.package.clone(),
            implementation: self.implementation.clone(),
        };
        Ok(file.merge(flags).validate()?)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let settings = cli.settings()?;
    println!("{}", run(&settings, cli.emit)?);
    Ok(())
}

fn run(settings: &Settings, emit: Emit) -> Result<String> {
    let descriptor = analyze(&settings.source, &settings.repository).with_context(|| {
        format!(
            "Failed to analyze {} in {}",
            settings.repository,
            settings.source.display()
        )
    })?;
    log::info!(
        "Analyzed {}: {} methods",
        descriptor.qualified_name(),
        descriptor.methods.len()
    );

    if emit == Emit::Descriptor {
        return Ok(serde_json::to_string_pretty(&descriptor)?);
    }

    let output = OutputSpec::new(
        settings.package.clone(),
        settings.implementation.clone(),
        settings.destination.clone(),
    );
    let output = match output.clone().locate_package() {
        Ok(located) => located,
        Err(e) => {
            log::warn!(
                "Cannot locate package of {}: {e}; comparing package names instead",
                settings.destination.display()
            );
            output
        }
    };
    let model = GenerationResolver::new()
        .resolve(descriptor, &output)
        .with_context(|| format!("Failed to resolve {}", settings.repository))?;

    Ok(serde_json::to_string_pretty(&model)?)
}
