//! scormify - H5P to SCORM 1.2 converter
//!
//! The main entry point, handling:
//! - One-shot conversion of a package file
//! - The HTTP conversion endpoint
//! - Archive name derivation
//! - Shell completions

use chrono::{NaiveDate, Utc};
use clap::{Args, CommandFactory, Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

use sf_archive::archive_file_name;
use sf_core::config::ConverterConfig;
use sf_core::exit_codes::ExitCode;
use sf_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use sf_core::{suggested_file_name, ConvertError, ConvertRequest, Converter};

/// Convert H5P packages into SCORM 1.2 archives
#[derive(Parser)]
#[command(name = "scormify")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to scormify.toml
    #[arg(long, global = true, env = "SCORMIFY_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a package file into a SCORM 1.2 archive
    Convert(ConvertArgs),

    /// Serve the HTTP conversion endpoint
    #[cfg(feature = "server")]
    Serve(ServeArgs),

    /// Print the archive name derived from a title
    Filename(FilenameArgs),

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Source package (.h5p)
    input: PathBuf,

    /// Score (0-100) a learner needs to pass
    #[arg(long)]
    mastery_score: Option<String>,

    /// Horizontal padding in pixels
    #[arg(long)]
    margin_x: Option<u32>,

    /// Vertical padding in pixels
    #[arg(long)]
    margin_y: Option<u32>,

    /// Maximum content width in pixels
    #[arg(long)]
    max_width: Option<u32>,

    /// Center the content and cap it at --max-width
    #[arg(long)]
    restrict_width_and_center: bool,

    /// Show the rights/license frame
    #[arg(long)]
    show_rights: bool,

    /// Output file (default: <input stem>.zip in the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[cfg(feature = "server")]
#[derive(Args, Debug)]
struct ServeArgs {
    /// Bind address (default from config: 127.0.0.1:8088)
    #[arg(long)]
    bind: Option<String>,
}

#[derive(Args, Debug)]
struct FilenameArgs {
    /// Content title
    #[arg(long)]
    title: String,

    /// Package version
    #[arg(long = "version", default_value = "1.0.0")]
    package_version: String,

    /// Date stamp (default: today, UTC)
    #[arg(long)]
    date: Option<NaiveDate>,
}

fn main() {
    let cli = Cli::parse();

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let result = match &cli.command {
        Commands::Convert(args) => run_convert(&cli.global, args),
        #[cfg(feature = "server")]
        Commands::Serve(args) => run_serve(&cli.global, args),
        Commands::Filename(args) => {
            run_filename(args);
            Ok(())
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "scormify",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    let exit_code = match result {
        Ok(()) => ExitCode::Clean,
        Err(e) => {
            eprintln!("scormify: {e}");
            ExitCode::from(&e)
        }
    };
    std::process::exit(exit_code.as_i32());
}

fn load_config(global: &GlobalOpts) -> Result<ConverterConfig, ConvertError> {
    ConverterConfig::resolve(global.config.as_deref()).map(|(config, _)| config)
}

fn run_convert(global: &GlobalOpts, args: &ConvertArgs) -> Result<(), ConvertError> {
    let request = ConvertRequest {
        file_path: Some(Value::String(args.input.to_string_lossy().into_owned())),
        margin_x: args.margin_x.map(Value::from),
        margin_y: args.margin_y.map(Value::from),
        mastery_score: args.mastery_score.clone().map(Value::String),
        max_width: args.max_width.map(Value::from),
        restrict_width_and_center: Some(Value::Bool(args.restrict_width_and_center)),
        show_rights: Some(Value::Bool(args.show_rights)),
    };
    let (path, options) = request.validate()?;

    let converter = Converter::from_config(&load_config(global)?)?;
    let buffer = fs::read(&path)?;
    let converted = converter.convert_detailed(&buffer, &options)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(suggested_file_name(&path)));
    fs::write(&output, &converted.bytes)?;
    println!("{}", output.display());
    Ok(())
}

#[cfg(feature = "server")]
fn run_serve(global: &GlobalOpts, args: &ServeArgs) -> Result<(), ConvertError> {
    let config = load_config(global)?;
    let bind = args.bind.clone().unwrap_or_else(|| config.server.bind.clone());
    let converter = Converter::from_config(&config)?;
    let server = sf_core::ConvertServer::start(&bind, std::sync::Arc::new(converter))?;
    eprintln!("scormify: listening on http://{}", server.addr());
    server.wait();
    Ok(())
}

fn run_filename(args: &FilenameArgs) {
    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
    println!(
        "{}",
        archive_file_name(&args.title, &args.package_version, &date.format("%Y-%m-%d").to_string())
    );
}
