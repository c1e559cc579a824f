use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use zdl_core::{compile, BuildOptions, Diagnostic, Error, Language, Model};

/// Output format for errors and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// ZDL/ZFL model builder.
#[derive(Parser)]
#[command(name = "zdl", version, about = "ZDL entity and ZFL flow model builder")]
struct Cli {
    /// Output format for errors and diagnostics (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a .zdl or .zfl file and print its document as JSON
    Build {
        /// Path to the source file
        file: PathBuf,
        /// Source language; inferred from the file extension when omitted
        #[arg(long)]
        lang: Option<Language>,
        /// Fail when any construct was skipped
        #[arg(long)]
        strict: bool,
    },

    /// Report skipped constructs without printing the document
    Check {
        /// Path to the source file
        file: PathBuf,
        /// Source language; inferred from the file extension when omitted
        #[arg(long)]
        lang: Option<Language>,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Build { file, lang, strict } => {
            cmd_build(&file, lang, strict, cli.output, cli.quiet);
        }
        Commands::Check { file, lang } => {
            cmd_check(&file, lang, cli.output, cli.quiet);
        }
    }
}

fn cmd_build(file: &Path, lang: Option<Language>, strict: bool, output: OutputFormat, quiet: bool) {
    let options = BuildOptions {
        strict,
        ..BuildOptions::default()
    };
    let model = load(file, lang, &options, output, quiet);
    if !quiet {
        report_diagnostics(file, &model.diagnostics, output);
    }
    let pretty = serde_json::to_string_pretty(&model.document)
        .unwrap_or_else(|e| format!("serialization error: {}", e));
    println!("{}", pretty);
}

fn cmd_check(file: &Path, lang: Option<Language>, output: OutputFormat, quiet: bool) {
    let model = load(file, lang, &BuildOptions::default(), output, quiet);
    if model.diagnostics.is_empty() {
        if !quiet && output == OutputFormat::Text {
            println!("{}: ok", file.display());
        }
        return;
    }
    if !quiet {
        report_diagnostics(file, &model.diagnostics, output);
    }
    process::exit(1);
}

/// Read and compile `file`, exiting with status 1 on any failure.
fn load(
    file: &Path,
    lang: Option<Language>,
    options: &BuildOptions,
    output: OutputFormat,
    quiet: bool,
) -> Model {
    let Some(language) = lang.or_else(|| Language::from_path(file)) else {
        report_error(
            &format!(
                "cannot infer the language of '{}'; pass --lang zdl or --lang zfl",
                file.display()
            ),
            output,
            quiet,
        );
        process::exit(1);
    };
    let src = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            report_error(&format!("error reading '{}': {}", file.display(), e), output, quiet);
            process::exit(1);
        }
    };
    let filename = file.display().to_string();
    tracing::debug!(file = %filename, ?language, "compiling");

    match compile(language, &src, &filename, options) {
        Ok(model) => model,
        Err(e) => {
            if !quiet {
                match output {
                    OutputFormat::Json => {
                        let err_json = serde_json::to_string_pretty(&e.to_json_value())
                            .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", e));
                        eprintln!("{}", err_json);
                    }
                    OutputFormat::Text => {
                        eprintln!("{}", e);
                        if let Error::Strict { diagnostics } = &e {
                            report_diagnostics(file, diagnostics, output);
                        }
                    }
                }
            }
            process::exit(1);
        }
    }
}

fn report_diagnostics(file: &Path, diagnostics: &[Diagnostic], output: OutputFormat) {
    match output {
        OutputFormat::Text => {
            for d in diagnostics {
                eprintln!("{}:{}", file.display(), d);
            }
        }
        OutputFormat::Json => {
            if diagnostics.is_empty() {
                return;
            }
            let json = serde_json::json!({ "diagnostics": diagnostics });
            let pretty = serde_json::to_string_pretty(&json)
                .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e));
            eprintln!("{}", pretty);
        }
    }
}

fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
