//! dprep CLI
//!
//! A thin wrapper around the dprep library.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dprep::{Grid, Rule, SplitOptions};

#[derive(Parser)]
#[command(name = "dprep")]
#[command(about = "Preview delimited files and describe data-preparation rules")]
#[command(after_help = "\
EXAMPLES:
    # Show the first 20 rows of a semicolon-separated file
    dprep preview --delimiter ';' --limit 20 ./sales.csv

    # Describe a rule
    dprep summarize \"settype col: a, b, c type: long\"
    #   set type 3 columns to long

    # Describe a rule already stored as JSON
    dprep summarize --json-input '{\"name\": \"header\", \"rownum\": 1}'

    # Serialize rule text
    dprep json \"rename col: a to: 'b'\"
")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a delimited file as a table
    Preview {
        path: PathBuf,

        #[command(flatten)]
        split: SplitArgs,

        /// Maximum data rows to show. Use 0 for unlimited.
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Treat the first line as data rather than column names
        #[arg(long)]
        no_header: bool,

        /// Emit the grid as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Split a single line and print one field per line
    Split {
        line: String,

        #[command(flatten)]
        split: SplitArgs,
    },

    /// Describe a rule in one sentence
    Summarize {
        rule: String,

        /// The rule is rule JSON rather than rule text
        #[arg(long)]
        json_input: bool,
    },

    /// Convert rule text to rule JSON
    Json { rule: String },
}

#[derive(clap::Args)]
struct SplitArgs {
    /// Field delimiter (may be several characters)
    #[arg(short, long, default_value = ",")]
    delimiter: String,

    /// Quote marker (may be several characters)
    #[arg(short, long, default_value = "\"")]
    quote: String,
}

impl SplitArgs {
    fn options(&self) -> SplitOptions {
        SplitOptions::default()
            .with_delimiter(&self.delimiter)
            .with_quote(&self.quote)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match args.command {
        Command::Preview {
            path,
            split,
            limit,
            no_header,
            json,
        } => {
            let mut options = split.options().with_header(!no_header);
            if limit > 0 {
                options = options.with_limit(limit);
            }
            let grid = dprep::load_grid(&path, &options)?;
            log::info!(
                "Loaded {} rows x {} columns from {}",
                grid.rows.len(),
                grid.width(),
                path.display()
            );
            print_grid(&grid, json)?;
        }
        Command::Split { line, split } => {
            for field in split.options().split(&line) {
                println!("{}", field);
            }
        }
        Command::Summarize { rule, json_input } => {
            let summary = if json_input {
                dprep::short_rule_string(&rule)?
            } else {
                dprep::short_rule_summary(&rule)?
            };
            println!("{}", summary);
        }
        Command::Json { rule } => {
            let rule: Rule = dprep::parse_rule(&rule)?;
            println!("{}", serde_json::to_string_pretty(&rule.to_json())?);
        }
    }

    Ok(())
}

fn print_grid(grid: &Grid, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(grid)?);
    } else {
        print!("{}", grid);
    }
    Ok(())
}
