use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use fusion_alert_core::Alert;
use fusion_alert_extract::batch::{BatchConfig, BatchEntry, parse_files};
use fusion_alert_extract::output::{OutputFormat, format_document};
use fusion_alert_extract::{ParseOptions, SectionPolicy, analyze, parse_alert_with_options};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "fusion-alert", version)]
#[command(about = "Parse FusionReactor alert reports and rank the running requests")]
struct Cli {
    /// Log parser progress and skipped lines to stderr.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse one alert file.
    ParseFile(ParseFileArgs),
    /// Parse an alert read from stdin.
    ParseStdin(ParseStdinArgs),
    /// Parse many alert files in parallel, writing one document per input.
    Batch(BatchArgs),
    /// Parse alert files and report counts, diagnostics and consistency findings.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct ParseSettings {
    /// Accept alerts that lack one of the two sections.
    #[arg(long)]
    lenient: bool,
    /// YAML file with parse options.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ParseSettings {
    fn options(&self) -> Result<ParseOptions, String> {
        let mut options = match &self.config {
            Some(path) => ParseOptions::load(path)
                .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
            None => ParseOptions::default(),
        };
        if self.lenient {
            options.sections = SectionPolicy::Lenient;
        }
        Ok(options)
    }
}

#[derive(Debug, Args)]
struct ParseFileArgs {
    /// Alert text file.
    #[arg(long)]
    input: PathBuf,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
    #[command(flatten)]
    settings: ParseSettings,
}

#[derive(Debug, Args)]
struct ParseStdinArgs {
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
    #[command(flatten)]
    settings: ParseSettings,
}

#[derive(Debug, Args)]
struct BatchArgs {
    /// Alert text files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Directory for the per-input documents.
    #[arg(long)]
    output: PathBuf,
    /// Output format for the documents.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
    /// Number of parallel parse jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    #[command(flatten)]
    settings: ParseSettings,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Alert text files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Number of parallel parse jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    #[command(flatten)]
    settings: ParseSettings,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::ParseFile(args) => run_parse_file(args),
        Command::ParseStdin(args) => run_parse_stdin(args),
        Command::Batch(args) => run_batch(args),
        Command::Check(args) => run_check(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run_parse_file(args: ParseFileArgs) -> Result<(), String> {
    let text = fs::read_to_string(&args.input)
        .map_err(|err| format!("Failed to read '{}': {err}", args.input.display()))?;
    run_parse_text(&text, &args.settings.options()?, args.format)
}

fn run_parse_stdin(args: ParseStdinArgs) -> Result<(), String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .map_err(|err| format!("Failed to read stdin: {err}"))?;
    run_parse_text(&text, &args.settings.options()?, args.format)
}

fn run_parse_text(text: &str, options: &ParseOptions, format: OutputFormat) -> Result<(), String> {
    let alert = parse_alert_with_options(text, options).map_err(|err| err.to_string())?;
    let rendered = format_document(&analyze(&alert), format)?;
    println!("{}", rendered.trim_end());
    Ok(())
}

fn run_batch(args: BatchArgs) -> Result<(), String> {
    fs::create_dir_all(&args.output).map_err(|err| {
        format!(
            "Failed to create output directory '{}': {err}",
            args.output.display()
        )
    })?;

    let config = BatchConfig {
        inputs: args.inputs,
        jobs: args.jobs,
        options: args.settings.options()?,
    };
    let entries = parse_files(&config).map_err(|err| err.to_string())?;

    let mut used_names = HashSet::new();
    let mut written = 0usize;
    let mut failed = 0usize;
    for entry in &entries {
        let alert = match &entry.result {
            Ok(alert) => alert,
            Err(err) => {
                eprintln!("error: {err}");
                failed += 1;
                continue;
            }
        };

        let rendered = format_document(&analyze(alert), args.format)?;
        let name = output_name(&entry.path, args.format, &mut used_names);
        let path = args.output.join(name);
        fs::write(&path, rendered)
            .map_err(|err| format!("Failed to write '{}': {err}", path.display()))?;
        tracing::debug!(input = %entry.path.display(), output = %path.display(), "wrote alert document");
        written += 1;
    }

    println!(
        "Parsed {written} of {} alert file(s) into '{}'.",
        entries.len(),
        args.output.display()
    );

    if failed > 0 {
        return Err(format!("{failed} alert file(s) failed to parse"));
    }
    Ok(())
}

/// Output file name for an input, unique within one batch run.
fn output_name(input: &Path, format: OutputFormat, used: &mut HashSet<String>) -> String {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "alert".to_string());

    let mut name = format!("{stem}.{}", format.extension());
    let mut suffix = 2;
    while !used.insert(name.clone()) {
        name = format!("{stem}-{suffix}.{}", format.extension());
        suffix += 1;
    }
    name
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let config = BatchConfig {
        inputs: args.inputs,
        jobs: args.jobs,
        options: args.settings.options()?,
    };
    let entries = parse_files(&config).map_err(|err| err.to_string())?;

    let mut failed = 0usize;
    for entry in &entries {
        match &entry.result {
            Ok(alert) => print_check(entry, alert),
            Err(err) => {
                println!("FAIL {err}");
                failed += 1;
            }
        }
    }

    println!(
        "Checked {} alert file(s): {} ok, {failed} failed.",
        entries.len(),
        entries.len() - failed
    );

    if failed > 0 {
        return Err(format!("{failed} alert file(s) failed to parse"));
    }
    Ok(())
}

fn print_check(entry: &BatchEntry, alert: &Alert) {
    let document = analyze(alert);
    println!(
        "OK   {}: {} request(s), {} thread(s), {} active ColdFusion thread(s)",
        entry.path.display(),
        alert.running_requests().len(),
        alert.java_threads().len(),
        document.coldfusion_threads.len()
    );
    for section in alert.missing_sections() {
        println!("     missing section: {section}");
    }
    for diagnostic in &document.diagnostics {
        println!("     {diagnostic}");
    }
    for finding in &document.validation {
        println!("     {finding}");
    }
}
