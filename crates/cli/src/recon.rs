//! `rankmerge run|merge|validate`: load inputs, reconcile, write results.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use clap::Subcommand;
use rankmerge_recon::{
    PriorityRanking, ReconConfig, ReconError, Reconciler, RecordSet, Reconciliation, Side,
};

use crate::exit_codes::{
    EXIT_ERROR, EXIT_RECON_INVALID_CONFIG, EXIT_RECON_IO, EXIT_RECON_SCHEMA, EXIT_USAGE,
};
use crate::CliError;

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Reconcile the target and source named in a TOML config file
    #[command(after_help = "\
Examples:
  rankmerge run hosts.recon.toml
  rankmerge run hosts.recon.toml --output merged.csv
  rankmerge run hosts.recon.toml --json > report.json
  rankmerge run hosts.recon.toml --strict")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Print the JSON evidence report to stdout instead of the CSV
        #[arg(long)]
        json: bool,

        /// Write the reconciled CSV here (overrides [output] csv)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Fail on a missing key/value column instead of passing the target through
        #[arg(long)]
        strict: bool,
    },

    /// Reconcile two CSV files without a config file
    #[command(after_help = "\
Examples:
  rankmerge merge inventory.csv scan.csv --key ip --key computer_name --value ценность
  rankmerge merge a.csv b.csv --key id --value tier --priority-file tiers.toml -o merged.csv")]
    Merge {
        /// Collection to update
        target: PathBuf,

        /// Collection supplying candidate replacements
        source: PathBuf,

        /// Key column (repeat for a composite key)
        #[arg(long = "key", required = true)]
        keys: Vec<String>,

        /// Column whose category decides which side wins
        #[arg(long)]
        value: String,

        /// TOML file with a [priority] table (default: built-in ranking)
        #[arg(long)]
        priority_file: Option<PathBuf>,

        /// Write the reconciled CSV here (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print the JSON evidence report to stdout instead of the CSV
        #[arg(long)]
        json: bool,

        /// Fail on a missing key/value column instead of passing the target through
        #[arg(long)]
        strict: bool,
    },

    /// Validate a config (and the headers of its inputs, when present)
    #[command(after_help = "\
Examples:
  rankmerge validate hosts.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },
}

pub fn cmd_recon(cmd: ReconCommands) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Run { config, json, output, strict } => cmd_run(config, json, output, strict),
        ReconCommands::Merge {
            target,
            source,
            keys,
            value,
            priority_file,
            output,
            json,
            strict,
        } => cmd_merge(target, source, keys, value, priority_file, output, json, strict),
        ReconCommands::Validate { config } => cmd_validate(config),
    }
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

// ---------------------------------------------------------------------------
// Shared pipeline
// ---------------------------------------------------------------------------

/// Everything one reconciliation run needs, however it was configured.
struct Job {
    name: String,
    reconciler: Reconciler,
    target: PathBuf,
    source: PathBuf,
    csv_out: Option<PathBuf>,
    report_out: Option<PathBuf>,
    json_stdout: bool,
    strict: bool,
}

fn execute(job: Job) -> Result<(), CliError> {
    let target = read_csv(&job.target)?;
    let source = read_csv(&job.source)?;

    let result = match job.reconciler.try_reconcile(&target, &source) {
        Ok(result) => Some(result),
        Err(e @ ReconError::MissingColumns { .. }) if job.strict => {
            return Err(recon_err(EXIT_RECON_SCHEMA, e.to_string())
                .with_hint("drop --strict to write the target unchanged instead"));
        }
        Err(e) => {
            log::warn!("{e}; target written unchanged");
            None
        }
    };

    let records = result.as_ref().map(|r| &r.records).unwrap_or(&target);

    match &job.csv_out {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                recon_err(EXIT_RECON_IO, format!("cannot write {}: {e}", path.display()))
            })?;
            records
                .write_csv(io::BufWriter::new(file))
                .map_err(|e| recon_err(EXIT_RECON_IO, format!("cannot write {}: {e}", path.display())))?;
            eprintln!("wrote {}", path.display());
        }
        None if !job.json_stdout => {
            records
                .write_csv(io::stdout().lock())
                .map_err(|e| recon_err(EXIT_RECON_IO, e.to_string()))?;
        }
        None => {}
    }

    if let Some(result) = &result {
        if job.json_stdout || job.report_out.is_some() {
            let json_str = report_json(&job, result)?;
            if let Some(path) = &job.report_out {
                std::fs::write(path, &json_str).map_err(|e| {
                    recon_err(EXIT_RECON_IO, format!("cannot write {}: {e}", path.display()))
                })?;
                eprintln!("wrote {}", path.display());
            }
            if job.json_stdout {
                writeln!(io::stdout().lock(), "{json_str}")
                    .map_err(|e| recon_err(EXIT_RECON_IO, e.to_string()))?;
            }
        }

        let s = &result.summary;
        eprintln!(
            "{}: {} row(s): {} replaced, {} kept, {} unmatched ({} multi-match, {} source-only)",
            job.name, s.target_rows, s.replaced, s.kept, s.unmatched, s.multi_match, s.source_only,
        );
    }

    Ok(())
}

fn report_json(job: &Job, result: &Reconciliation) -> Result<String, CliError> {
    let report = result.report(job.reconciler.meta(&job.name));
    serde_json::to_string_pretty(&report)
        .map_err(|e| recon_err(EXIT_ERROR, format!("JSON serialization error: {e}")))
}

fn read_csv(path: &Path) -> Result<RecordSet, CliError> {
    let file = File::open(path)
        .map_err(|e| recon_err(EXIT_RECON_IO, format!("cannot read {}: {e}", path.display())))?;
    RecordSet::from_csv_reader(BufReader::new(file))
        .map_err(|e| recon_err(EXIT_RECON_IO, format!("{}: {e}", path.display())))
}

// ---------------------------------------------------------------------------
// Config-driven commands
// ---------------------------------------------------------------------------

fn load_config(path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| recon_err(EXIT_RECON_IO, format!("cannot read config: {e}")))?;
    ReconConfig::from_toml(&config_str).map_err(|e| recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string()))
}

/// Resolve `[target]`/`[source]` file paths relative to the config's directory.
fn input_paths(config: &ReconConfig, config_path: &Path) -> Result<(PathBuf, PathBuf), CliError> {
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let missing = |section: &str| {
        recon_err(EXIT_RECON_INVALID_CONFIG, format!("config has no [{section}] section"))
            .with_hint(format!("add [{section}] with file = \"<path>.csv\", or use `rankmerge merge`"))
    };
    let target = config.target.as_ref().ok_or_else(|| missing("target"))?;
    let source = config.source.as_ref().ok_or_else(|| missing("source"))?;
    Ok((base_dir.join(&target.file), base_dir.join(&source.file)))
}

fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    strict: bool,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let (target, source) = input_paths(&config, &config_path)?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let reconciler = Reconciler::from_config(&config)
        .map_err(|e| recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string()))?;

    execute(Job {
        name: config.name.clone(),
        reconciler,
        target,
        source,
        csv_out: output_file.or_else(|| config.output.csv.as_ref().map(|p| base_dir.join(p))),
        report_out: config.output.json.as_ref().map(|p| base_dir.join(p)),
        json_stdout: json_output,
        strict,
    })
}

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let reconciler = Reconciler::from_config(&config)
        .map_err(|e| recon_err(EXIT_RECON_INVALID_CONFIG, e.to_string()))?;

    // Header checks only when both inputs are configured.
    if config.target.is_some() && config.source.is_some() {
        let (target, source) = input_paths(&config, &config_path)?;
        for (path, side) in [(target, Side::Target), (source, Side::Source)] {
            let set = read_csv(&path)?;
            reconciler
                .validate(&set, side)
                .map_err(|e| recon_err(EXIT_RECON_SCHEMA, format!("{}: {e}", path.display())))?;
        }
    }

    eprintln!(
        "ok: '{}' key [{}], value '{}', {} ranked categor{}",
        config.name,
        reconciler.key_columns().join(", "),
        reconciler.value_column(),
        reconciler.ranking().len(),
        if reconciler.ranking().len() == 1 { "y" } else { "ies" },
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Ad-hoc merge
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
struct PriorityFile {
    priority: BTreeMap<String, u32>,
}

fn load_priority_file(path: &Path) -> Result<PriorityRanking, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| recon_err(EXIT_RECON_IO, format!("cannot read {}: {e}", path.display())))?;
    let file: PriorityFile = toml::from_str(&text).map_err(|e| {
        recon_err(EXIT_RECON_INVALID_CONFIG, format!("{}: {e}", path.display()))
            .with_hint("expected a [priority] table of category = rank")
    })?;
    PriorityRanking::new(file.priority.iter().map(|(k, &v)| (k, v)))
        .map_err(|e| recon_err(EXIT_RECON_INVALID_CONFIG, format!("{}: {e}", path.display())))
}

#[allow(clippy::too_many_arguments)]
fn cmd_merge(
    target: PathBuf,
    source: PathBuf,
    keys: Vec<String>,
    value: String,
    priority_file: Option<PathBuf>,
    output: Option<PathBuf>,
    json_output: bool,
    strict: bool,
) -> Result<(), CliError> {
    let ranking = match priority_file {
        Some(path) => load_priority_file(&path)?,
        None => PriorityRanking::default(),
    };
    let reconciler =
        Reconciler::new(keys, value, ranking).map_err(|e| recon_err(EXIT_USAGE, e.to_string()))?;

    execute(Job {
        name: "merge".into(),
        reconciler,
        target,
        source,
        csv_out: output,
        report_out: None,
        json_stdout: json_output,
        strict,
    })
}
