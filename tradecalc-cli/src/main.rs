//! TradeCalc CLI: evaluate and build calculator links.
//!
//! Commands:
//! - `eval`: evaluate a shared URL (or bare query string) and print the report
//! - `link`: build a shareable URL for a tool from `key=value` edits
//! - `tools`: list the calculators and their URL parameters

mod export;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use tradecalc_core::config::CONFIG_FILE_NAME;
use tradecalc_core::params::LocationStore;
use tradecalc_core::tools::{apply_text, mount_form, FieldId, Tool, ToolDefaults, ToolForm};
use tradecalc_core::AppConfig;

#[derive(Parser)]
#[command(name = "tradecalc", about = "TradeCalc CLI: position sizing and trade planning calculators")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Log filter, e.g. `debug` or `tradecalc_core=trace`. RUST_LOG wins when set.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a calculator link and print its report.
    Eval {
        /// Full URL or bare query string. Empty evaluates the defaults.
        #[arg(default_value = "")]
        link: String,

        /// Tool to evaluate. Defaults to the link's `#/route`, then position sizing.
        #[arg(long)]
        tool: Option<Tool>,

        /// Extra edits applied before evaluating (repeatable), e.g. `--set entry=101`.
        #[arg(long = "set", value_name = "KEY=VALUE")]
        edits: Vec<String>,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Build a shareable link for a tool.
    Link {
        tool: Tool,

        /// Start from an existing link instead of the configured base URL.
        #[arg(long)]
        from: Option<String>,

        /// Edits to apply (repeatable), e.g. `--set sl=90`.
        #[arg(long = "set", value_name = "KEY=VALUE")]
        edits: Vec<String>,
    },
    /// List the calculators and their URL parameters.
    Tools,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
    Csv,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = AppConfig::load(&cli.config)?;
    match cli.command {
        Commands::Eval {
            link,
            tool,
            edits,
            format,
        } => run_eval(&config, &link, tool, &edits, format),
        Commands::Link { tool, from, edits } => {
            run_link(&config, tool, from.as_deref(), &edits)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tools => {
            print_tools(&config.defaults);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_eval(config: &AppConfig, link: &str, tool: Option<Tool>, edits: &[String], format: Format) -> Result<ExitCode> {
    let mut store = LocationStore::open(link);
    let tool = tool
        .or_else(|| store.fragment().and_then(Tool::from_route))
        .unwrap_or(Tool::PositionSizing);
    tracing::debug!(%tool, href = %store.href(), "evaluating link");

    let mut form = mount_form(tool, &store, &config.defaults);
    apply_edits(form.as_mut(), &mut store, edits)?;

    let report = match form.report() {
        Ok(report) => report,
        Err(err) => {
            // Not a program failure: the numbers describe an impossible trade.
            eprintln!("Check your numbers: {err}");
            return Ok(ExitCode::from(2));
        }
    };

    let href = store.href();
    let output = match format {
        Format::Text => export::render_text(tool, &href, &report),
        Format::Json => export::export_json(&href, &report)?,
        Format::Csv => export::export_csv(&report)?,
    };
    print!("{output}");
    if format == Format::Json {
        println!();
    }
    Ok(ExitCode::SUCCESS)
}

fn run_link(config: &AppConfig, tool: Tool, from: Option<&str>, edits: &[String]) -> Result<()> {
    let mut store = match from {
        Some(link) => LocationStore::open(link),
        None => LocationStore::parse(&config.base_url)
            .with_context(|| format!("base_url '{}' is not a valid URL", config.base_url))?,
    };
    store.set_fragment(Some(tool.route()));

    let mut form = mount_form(tool, &store, &config.defaults);
    apply_edits(form.as_mut(), &mut store, edits)?;
    println!("{}", store.href());
    Ok(())
}

fn apply_edits(form: &mut dyn ToolForm, store: &mut LocationStore, edits: &[String]) -> Result<()> {
    for edit in edits {
        let Some((key, value)) = edit.split_once('=') else {
            bail!("edit '{edit}' is not KEY=VALUE");
        };
        let changed = apply_text(form, store, key.trim(), value)?;
        tracing::debug!(key, value, changed, "edit applied");
    }
    Ok(())
}

fn print_tools(defaults: &ToolDefaults) {
    let store = LocationStore::default();
    for tool in Tool::ALL {
        let form = mount_form(tool, &store, defaults);
        println!("{:<16} #{}", tool.to_string(), tool.route());
        for field in form.fields() {
            if let FieldId::Param(key) = field.id {
                println!("    {key:<10} {}", field.label);
            }
        }
    }
}
