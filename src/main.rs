//! sheetcalc - A command-line spreadsheet with incremental recompute

mod command;
mod config;
mod error;
mod logging;
mod output;

use anyhow::Context;
use sheetcalc_core::storage::parser::parse_sheet;
use sheetcalc_core::{FileStore, MemStore, SpreadsheetServices, SpreadsheetStore};
use std::env;
use std::io::Read;
use std::path::PathBuf;

use command::{Command, script_lines};
use config::Config;
use error::CliError;
use output::{Outcome, OutputFormat};

fn print_usage() {
    eprintln!("Usage: sheetcalc [OPTIONS] <SHEET> [COMMAND...]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <SHEET>                   Spreadsheet name ([A-Za-z0-9_-]+)");
    eprintln!("  [COMMAND...]              Command to run; read from stdin if omitted");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  set <cell> <formula>      Set a cell and print every changed value (alias: eval)");
    eprintln!("  get <cell>                Print a cell's value and formula");
    eprintln!("  rm <cell>                 Remove a cell's formula");
    eprintln!("  copy <dest> <src>         Copy a formula, shifting relative references");
    eprintln!("  clear                     Remove every cell");
    eprintln!("  dump [values]             Print every formula, precedents first");
    eprintln!("  load <file>               Replace the sheet with a .sheet file's formulas");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -d, --data-dir <DIR>      Directory holding .sheet files");
    eprintln!("  -m, --memory              Keep everything in memory (no persistence)");
    eprintln!("  --config <FILE>           Load configuration from TOML file");
    eprintln!("  --no-config               Ignore the user config file");
    eprintln!("  --json                    Print results as JSON");
    eprintln!("  -h, --help                Print help");
    eprintln!();
    eprintln!("Logging is controlled by the {} environment variable.", logging::LOG_ENV);
}

struct Options {
    sheet: String,
    command: Vec<String>,
    data_dir: Option<PathBuf>,
    memory: bool,
    format: OutputFormat,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut sheet: Option<String> = None;
    let mut command: Vec<String> = Vec::new();
    let mut data_dir: Option<PathBuf> = None;
    let mut memory = false;
    let mut config_file: Option<PathBuf> = None;
    let mut no_config = false;
    let mut format = OutputFormat::Plain;

    let mut i = 1;
    while i < args.len() {
        // Everything after the sheet name belongs to the command, even if
        // it looks like an option (`set a1 -5`).
        if sheet.is_some() {
            command.push(args[i].clone());
            i += 1;
            continue;
        }
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-d" | "--data-dir" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --data-dir requires a directory");
                    std::process::exit(1);
                }
                data_dir = Some(PathBuf::from(&args[i]));
            }
            "-m" | "--memory" => memory = true,
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a file path");
                    std::process::exit(1);
                }
                config_file = Some(PathBuf::from(&args[i]));
            }
            "--no-config" => no_config = true,
            "--json" => format = OutputFormat::Json,
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            _ => sheet = Some(args[i].clone()),
        }
        i += 1;
    }

    let Some(sheet) = sheet else {
        eprintln!("Error: Missing spreadsheet name");
        print_usage();
        std::process::exit(1);
    };

    let (config, mut warnings) = if no_config {
        (Config::default(), Vec::new())
    } else {
        config::load_config(config_file.as_ref())
    };
    warnings.extend(logging::init(config.log.filter.as_deref()));
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let options = Options {
        sheet,
        command,
        data_dir,
        memory,
        format,
    };
    let status = match run(&options, &config) {
        Ok(status) => status,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    std::process::exit(status);
}

/// Pick the store and run the commands. Returns the exit status.
fn run(options: &Options, config: &Config) -> anyhow::Result<i32> {
    let bounds = config.bounds();
    if options.memory {
        let services = SpreadsheetServices::with_bounds(MemStore::new(), bounds);
        return execute(&services, options);
    }

    let dir = options
        .data_dir
        .clone()
        .or_else(|| config.data_dir())
        .context("No data directory available; pass --data-dir or --memory")?;
    let store = FileStore::open(&dir)
        .with_context(|| format!("Cannot open data directory {}", dir.display()))?;
    let services = SpreadsheetServices::with_bounds(store, bounds);
    execute(&services, options)
}

fn execute<S: SpreadsheetStore>(
    services: &SpreadsheetServices<S>,
    options: &Options,
) -> anyhow::Result<i32> {
    if !options.command.is_empty() {
        let line = options.command.join(" ");
        return Ok(match run_line(services, options, &line) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("error[{}]: {}", e.code(), e);
                e.exit_code()
            }
        });
    }

    let mut script = String::new();
    std::io::stdin()
        .read_to_string(&mut script)
        .context("Failed to read commands from stdin")?;

    // Keep going after a failure; the first one decides the exit status.
    let mut status = 0;
    for (line_num, line) in script_lines(&script) {
        if let Err(e) = run_line(services, options, line) {
            eprintln!("error[{}]: line {}: {}", e.code(), line_num, e);
            if status == 0 {
                status = e.exit_code();
            }
        }
    }
    Ok(status)
}

fn run_line<S: SpreadsheetStore>(
    services: &SpreadsheetServices<S>,
    options: &Options,
    line: &str,
) -> Result<(), CliError> {
    let sheet = options.sheet.as_str();
    let outcome = match Command::parse(line)? {
        Command::Set { cell, formula } => Outcome::Updates(services.evaluate(sheet, &cell, &formula)?),
        Command::Get { cell } => {
            let info = services.query(sheet, &cell)?;
            let name = cell.parse::<sheetcalc_core::CellId>().map_or(cell, |id| id.to_string());
            Outcome::Cell(name, info)
        }
        Command::Remove { cell } => Outcome::Updates(services.remove(sheet, &cell)?),
        Command::Copy { dest, src } => Outcome::Updates(services.copy(sheet, &dest, &src)?),
        Command::Clear => {
            services.clear(sheet)?;
            Outcome::Done
        }
        Command::Dump { values: false } => Outcome::Dump(services.dump(sheet)?),
        Command::Dump { values: true } => Outcome::DumpValues(services.dump_with_values(sheet)?),
        Command::Load { path } => {
            if !path.is_file() {
                return Err(CliError::Usage(format!("File not found: {}", path.display())));
            }
            let cells = parse_sheet(&path)?;
            services.load(sheet, cells.iter().map(|(id, formula)| (id.to_string(), formula)))?;
            Outcome::Done
        }
    };
    tracing::trace!(sheet, command = line, "ran command");
    if let Some(text) = output::render(options.format, &outcome)? {
        println!("{}", text);
    }
    Ok(())
}
