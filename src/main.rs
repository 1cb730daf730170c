use std::fs;

use clap::Parser;
use miette::{bail, IntoDiagnostic, NamedSource, Report, Result};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use spargel::parsing::{self, parse_lenient};
use spargel::{compile, lower, parse, CompileError, ModuleRegistry};

mod cli;

use cli::{Args, Mode};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().without_time())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();

    if !args.input_file.is_file() {
        bail!("No proper input file: {:?}", args.input_file);
    }

    let source = fs::read_to_string(&args.input_file).into_diagnostic()?;
    let name = args.input_file.display().to_string();
    let report = |err: CompileError| {
        Report::new(err).with_source_code(NamedSource::new(name.clone(), source.clone()))
    };

    match args.mode {
        Mode::Tokens => {
            for token in parsing::lex(&source) {
                println!("{token}");
            }
        }
        Mode::Concrete => {
            // show the repaired tree even if tokens had to be inserted
            let (file, errors) = parse_lenient(&source);
            if let Some(file) = file {
                print!("{}", file.dump_tree().render().into_diagnostic()?);
            }
            if !errors.is_empty() {
                return Err(report(errors.into()));
            }
        }
        Mode::Abstract => {
            let file = parse(&source).map_err(|errs| report(errs.into()))?;
            print!("{}", lower(&file).dump_tree().render().into_diagnostic()?);
        }
        Mode::Emit => {
            let output = compile(&source, &ModuleRegistry::with_std()).map_err(report)?;
            info!("Compilation successful");
            print!("{output}");
        }
    }

    Ok(())
}
