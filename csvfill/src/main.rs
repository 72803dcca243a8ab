//! csvfill CLI - Expand CSV rows into text documents
//!
//! # Commands
//!
//! ```bash
//! csvfill run sampleXml                 # Run a script over its input files
//! csvfill run sampleXml --sample=3      # Preview the first 3 statements on stdout
//! csvfill run scripts/orders.json       # Run a JSON script document by path
//! csvfill list                          # List available scripts
//! csvfill functions                     # Show computed functions and operations
//! csvfill example-script                # Show an example JSON script
//! ```

use clap::{Args, Parser, Subcommand};
use csvfill::logs::{log_error, LOGGER};
use csvfill::script::ScriptSource;
use csvfill::{
    builtin_descriptions, example_script, operations_description, parse_sample, run_script, FunctionRegistry, Marker,
    RunConfig, ScriptCatalog,
};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "csvfill")]
#[command(about = "Expand CSV rows into text documents using conversion scripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a conversion script
    Run(RunArgs),

    /// List available scripts
    List {
        /// Scripts directory (default: $CSVFILL_SCRIPTS_DIR or ./scripts)
        #[arg(long)]
        scripts_dir: Option<PathBuf>,
    },

    /// Show built-in computed functions and declarative operations
    Functions,

    /// Show an example JSON script document
    ExampleScript {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Script name, or path to a JSON script document
    script: String,

    /// Append to existing output files instead of replacing them
    #[arg(long)]
    append: bool,

    /// Also write the output to stdout
    #[arg(long)]
    verbose: bool,

    /// Write the first N statements to stdout instead of the output files (`--sample` alone means 1, `--sample=N` for more)
    #[arg(
        long,
        value_name = "N",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "1",
        value_parser = parse_sample
    )]
    sample: Option<NonZeroUsize>,

    /// Input file, replacing the one declared by the script
    #[arg(long)]
    input: Option<String>,

    /// Output file, replacing the one declared by the script
    #[arg(long)]
    output: Option<String>,

    /// Terminate every unit with a newline
    #[arg(long, conflicts_with = "nonewline")]
    newline: bool,

    /// Do not terminate units with a newline
    #[arg(long)]
    nonewline: bool,

    /// Placeholder marker, replacing the script's
    #[arg(long)]
    marker: Option<Marker>,

    /// CSV delimiter (auto-detect if not specified)
    #[arg(short, long)]
    delimiter: Option<char>,

    /// Only print warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Input directory (default: $CSVFILL_INPUT_DIR or ./input)
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Output directory (default: $CSVFILL_OUTPUT_DIR or ./output)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Scripts directory (default: $CSVFILL_SCRIPTS_DIR or ./scripts)
    #[arg(long)]
    scripts_dir: Option<PathBuf>,
}

impl RunArgs {
    fn into_config(self) -> (String, RunConfig) {
        let mut config = RunConfig::from_env();

        config.marker = self.marker;
        config.sample = self.sample;
        config.verbose = self.verbose;
        config.append = self.append;
        config.newline_override = match (self.newline, self.nonewline) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        config.input_override = self.input;
        config.output_override = self.output;
        config.delimiter = self.delimiter;
        if let Some(dir) = self.input_dir {
            config.input_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(dir) = self.scripts_dir {
            config.scripts_dir = dir;
        }

        (self.script, config)
    }
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::List { scripts_dir } => cmd_list(scripts_dir),
        Commands::Functions => cmd_functions(),
        Commands::ExampleScript { output } => cmd_example_script(output.as_deref()),
    };

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn cmd_run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    LOGGER.set_quiet(args.quiet);
    let (script_name, config) = args.into_config();

    let mut catalog = ScriptCatalog::with_dir(&config.scripts_dir);
    let script = catalog.resolve(&script_name)?;

    eprintln!("📄 Script: {}", script.name());
    if let Some(n) = config.sample {
        eprintln!("   Sample: {} statement(s) to stdout", n);
    }

    let summary = run_script(script, &config)?;

    match config.sample {
        None => eprintln!("\n✨ Done! Output in {}", config.output_dir.display()),
        Some(_) if summary.sample_reached => eprintln!("\n✨ Sample complete"),
        Some(_) => eprintln!("\n✨ Input exhausted before the sample size was reached"),
    }
    Ok(())
}

fn cmd_list(scripts_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let scripts_dir = scripts_dir.unwrap_or_else(|| RunConfig::from_env().scripts_dir);
    let catalog = ScriptCatalog::with_dir(&scripts_dir);

    eprintln!("📋 Scripts available ({}):\n", catalog.len());
    for info in catalog.list() {
        let source = match info.source {
            ScriptSource::Builtin => "built-in".to_string(),
            ScriptSource::File(path) => path.display().to_string(),
        };
        println!("  📄 {} ({})", info.name, source);
        if !info.description.is_empty() {
            println!("     {}", info.description);
        }
    }
    Ok(())
}

fn cmd_functions() -> Result<(), Box<dyn std::error::Error>> {
    println!("Built-in computed functions:\n");
    for (name, description) in builtin_descriptions() {
        println!("  ~{}~ / ~{}:column~  {}", name, name, description);
    }
    println!("\nBuilt-in header hooks:\n");
    for name in FunctionRegistry::new().hook_names() {
        println!("  {}", name);
    }
    println!("\n{}", operations_description());
    Ok(())
}

fn cmd_example_script(output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let json = example_script().to_json()?;
    match output {
        Some(p) => {
            fs::write(p, &json)?;
            eprintln!("💾 Example written to: {}", p.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> RunArgs {
        match Cli::try_parse_from(args).unwrap().command {
            Commands::Run(run) => run,
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_sample_flag_keeps_script_name() {
        let run = run_args(&["csvfill", "run", "--sample", "sampleXml"]);
        assert_eq!(run.script, "sampleXml");
        assert_eq!(run.sample.map(NonZeroUsize::get), Some(1));

        let run = run_args(&["csvfill", "run", "sampleXml", "--sample=3"]);
        assert_eq!(run.sample.map(NonZeroUsize::get), Some(3));

        let run = run_args(&["csvfill", "run", "sampleXml"]);
        assert!(run.sample.is_none());
    }

    #[test]
    fn test_sample_rejects_zero() {
        assert!(Cli::try_parse_from(["csvfill", "run", "sampleXml", "--sample=0"]).is_err());
    }
}
