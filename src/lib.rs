//! Pkgconsole: a local-first console for package descriptors.
//!
//! Pkgconsole edits section-keyed package descriptors with reversible,
//! always-durable mutations, folds asynchronously produced descriptor
//! fragments into them by rule, and mirrors package metadata through three
//! store tiers so any operator can browse any other operator's work.
//!
//! # Architecture
//!
//! ## Descriptor store
//!
//! - Best-effort line parser and verbatim serializer ([`descriptor::parse`])
//! - Ordered section/entry model ([`descriptor::model`])
//! - Bounded undo/redo snapshots ([`descriptor::history`])
//! - Policy-driven auxiliary merge ([`descriptor::merge`])
//! - The editing session tying them to one file ([`descriptor::editor`])
//!
//! ## Metadata synchronization
//!
//! - Local per-key upsert store ([`sync::local`])
//! - Best-effort central mirror ([`sync::mirror`])
//! - Daily-idempotent master aggregation ([`sync::aggregate`])
//!
//! All store mutations route through the broker (`core::broker`) for
//! in-process serialization and an append-only audit trail.
//!
//! # Examples
//!
//! ```bash
//! # Scaffold config and the local store
//! pkgconsole init
//!
//! # Edit the descriptor
//! pkgconsole ini set --section "PRODUCT INFO" --entry APPNAME=Widget
//!
//! # Fold the async fragment in, then submit
//! pkgconsole ini merge
//! pkgconsole submit
//!
//! # Nightly fold of everyone's central stores
//! pkgconsole sync aggregate
//! ```

pub mod core;
pub mod descriptor;
pub mod sync;

use crate::core::cancel::CancelToken;
use crate::core::config::{CONFIG_FILE_NAME, ConsoleConfig};
use crate::core::error::ConsoleError;
use crate::core::schemas;
use crate::core::{output, time};
use crate::descriptor::editor::DescriptorEditor;
use crate::sync::{aggregate, local, mirror, record};

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "pkgconsole",
    version = env!("CARGO_PKG_VERSION"),
    about = "The local-first package descriptor console"
)]
struct Cli {
    /// Path to pkgconsole.toml (discovered upward from the working
    /// directory when omitted).
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scaffold configuration and the local metadata store
    #[clap(name = "init")]
    Init {
        /// Directory to initialize (defaults to the current working directory).
        #[clap(short, long)]
        dir: Option<PathBuf>,
        /// Overwrite an existing pkgconsole.toml.
        #[clap(long)]
        force: bool,
    },

    /// Inspect and edit the package descriptor
    #[clap(name = "ini", visible_alias = "i")]
    Ini(IniCli),

    /// Build a metadata record from the descriptor, upsert it locally, mirror it centrally
    #[clap(name = "submit", visible_alias = "s")]
    Submit {
        /// Descriptor file (defaults to the configured descriptor path).
        #[clap(long)]
        file: Option<PathBuf>,
    },

    /// Tier synchronization: mirror, aggregate, status
    #[clap(name = "sync")]
    Sync(SyncCli),

    /// Browse stores across operators
    #[clap(name = "view", visible_alias = "v")]
    View(ViewCli),
}

#[derive(clap::Args, Debug)]
struct IniCli {
    /// Descriptor file (defaults to the configured descriptor path).
    #[clap(long)]
    file: Option<PathBuf>,
    #[clap(subcommand)]
    command: IniCommand,
}

#[derive(Subcommand, Debug)]
enum IniCommand {
    /// List section names in render order
    Sections,
    /// Render the descriptor (or one section) from the in-memory model
    Show {
        #[clap(long)]
        section: Option<String>,
    },
    /// Replace a section's entries wholesale (creates the section if absent)
    Set {
        #[clap(long)]
        section: String,
        /// KEY=VALUE pair; repeat for multiple entries.
        #[clap(long = "entry", value_name = "KEY=VALUE")]
        entries: Vec<String>,
    },
    /// Upsert entries into an existing section
    Load {
        #[clap(long)]
        section: String,
        /// KEY=VALUE pair; repeat for multiple entries.
        #[clap(long = "entry", value_name = "KEY=VALUE")]
        entries: Vec<String>,
    },
    /// Copy an existing section to a new one placed right after it
    Copy {
        #[clap(long)]
        from: String,
        /// Target name; defaults to the next numbered name for the prefix.
        #[clap(long)]
        to: Option<String>,
    },
    /// Add the next numbered section for a prefix (INSTALL, UNINSTALL, UPGRADE, ARP, ...)
    Add {
        #[clap(long)]
        prefix: String,
    },
    /// Remove a whole section
    Remove {
        #[clap(long)]
        section: String,
    },
    /// Remove one key from a section
    RemoveKey {
        #[clap(long)]
        section: String,
        #[clap(long)]
        key: String,
    },
    /// Fold the auxiliary descriptor in, then delete it
    Merge {
        /// Auxiliary file (defaults to the configured aux descriptor path).
        #[clap(long)]
        aux: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct SyncCli {
    #[clap(subcommand)]
    command: SyncCommand,
}

#[derive(Subcommand, Debug)]
enum SyncCommand {
    /// Copy the local store over this operator's central file
    Mirror,
    /// Fold every operator's central store into the master store
    Aggregate {
        /// Run even if a merge already completed today.
        #[clap(long)]
        force: bool,
    },
    /// Show store paths, record count, and the last master merge time
    Status,
}

#[derive(clap::Args, Debug)]
struct ViewCli {
    #[clap(subcommand)]
    command: ViewCommand,
}

#[derive(Subcommand, Debug)]
enum ViewCommand {
    /// List operators discovered in the central tier
    Operators,
    /// List one operator's central store
    Operator { id: String },
    /// List the aggregated master store
    Master,
}

pub fn run() -> Result<(), ConsoleError> {
    let cli = Cli::parse();
    let current_dir = std::env::current_dir()?;

    if let Command::Init { dir, force } = &cli.command {
        let target = dir.clone().unwrap_or(current_dir);
        return run_init(&target, *force);
    }

    let config = match &cli.config {
        Some(path) => ConsoleConfig::load(path)?,
        None => ConsoleConfig::discover(&current_dir)?,
    };

    match cli.command {
        Command::Init { .. } => unreachable!(),
        Command::Ini(ini_cli) => run_ini(&config, ini_cli),
        Command::Submit { file } => run_submit(&config, file),
        Command::Sync(sync_cli) => match sync_cli.command {
            SyncCommand::Mirror => {
                let outcome = mirror::mirror_to_central(&config);
                if outcome.ok {
                    Ok(())
                } else {
                    Err(ConsoleError::ValidationError(
                        outcome
                            .detail
                            .unwrap_or_else(|| "mirror to central failed".to_string()),
                    ))
                }
            }
            SyncCommand::Aggregate { force } => {
                let report = aggregate::aggregate(&config, force, &CancelToken::new())?;
                println!("{}", serde_json::to_string_pretty(&report).unwrap());
                Ok(())
            }
            SyncCommand::Status => run_status(&config),
        },
        Command::View(view_cli) => run_view(&config, view_cli),
    }
}

fn run_init(target: &std::path::Path, force: bool) -> Result<(), ConsoleError> {
    fs::create_dir_all(target).map_err(ConsoleError::IoError)?;
    let config_path = target.join(CONFIG_FILE_NAME);
    if config_path.exists() && !force {
        println!(
            "{} {} already exists (use --force to overwrite)",
            "⚠".bright_yellow(),
            config_path.display()
        );
        return Ok(());
    }

    let written = ConsoleConfig::write_default(target)?;
    let config = ConsoleConfig::load(&written)?;
    local::initialize_local_db(&config)?;

    println!("{} {}", "●".bright_green(), written.display());
    println!(
        "{} {}",
        "●".bright_green(),
        config.local_db_path().display()
    );
    println!(
        "Operator '{}' ready. Central tier: {}",
        config.operator.bright_cyan(),
        config.central_metadata_dir().display()
    );
    Ok(())
}

fn run_ini(config: &ConsoleConfig, ini_cli: IniCli) -> Result<(), ConsoleError> {
    let file = ini_cli.file.unwrap_or_else(|| config.descriptor_path());
    let mut editor = DescriptorEditor::open(&file)?;
    for warning in editor.parse_warnings() {
        eprintln!("Warning: {} in '{}'", warning.describe(), file.display());
    }

    match ini_cli.command {
        IniCommand::Sections => {
            for name in editor.section_names() {
                println!("{}", name);
            }
            Ok(())
        }
        IniCommand::Show { section } => match section {
            Some(name) => {
                let entries = editor.entries(&name).ok_or_else(|| {
                    ConsoleError::NotFound(format!("section '{}' in '{}'", name, file.display()))
                })?;
                for (key, value) in entries {
                    println!("{}={}", key, value);
                }
                Ok(())
            }
            None => {
                print!("{}", editor.refresh());
                Ok(())
            }
        },
        IniCommand::Set { section, entries } => {
            let pairs = parse_entry_args(&entries)?;
            editor.replace_section(&section, &pairs)?;
            println!("Section '{}' updated ({} entries).", section, pairs.len());
            Ok(())
        }
        IniCommand::Load { section, entries } => {
            let pairs = parse_entry_args(&entries)?;
            editor.merge_entries(&section, &pairs)?;
            println!("Loaded {} entries into '{}'.", pairs.len(), section);
            Ok(())
        }
        IniCommand::Copy { from, to } => {
            let to = to.unwrap_or_else(|| editor.next_section_name(&from));
            editor.create_section_from(&from, &to)?;
            println!("Section '{}' copied to '{}'.", from, to);
            Ok(())
        }
        IniCommand::Add { prefix } => {
            let name = editor.add_section_for_prefix(&prefix)?;
            println!("Section '{}' added.", name);
            Ok(())
        }
        IniCommand::Remove { section } => {
            editor.remove_section(&section)?;
            println!("Section '{}' removed.", section);
            Ok(())
        }
        IniCommand::RemoveKey { section, key } => {
            editor.remove_key(&section, &key)?;
            println!("Key '{}' removed from '{}'.", key, section);
            Ok(())
        }
        IniCommand::Merge { aux } => {
            let aux = aux.unwrap_or_else(|| config.aux_descriptor_path());
            let report = editor.merge_auxiliary(&aux, &config.merge)?;
            println!(
                "Merged '{}': {} inserted, {} updated, {} appended, {} excluded.",
                aux.display(),
                report.inserted.len(),
                report.updated.len(),
                report.appended.len(),
                report.excluded.len()
            );
            Ok(())
        }
    }
}

fn parse_entry_args(entries: &[String]) -> Result<Vec<(String, String)>, ConsoleError> {
    entries
        .iter()
        .map(|raw| {
            raw.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| {
                    ConsoleError::ValidationError(format!("expected KEY=VALUE, got '{}'", raw))
                })
        })
        .collect()
}

fn run_submit(config: &ConsoleConfig, file: Option<PathBuf>) -> Result<(), ConsoleError> {
    let path = file.unwrap_or_else(|| config.descriptor_path());
    if !path.exists() {
        return Err(ConsoleError::NotFound(format!(
            "descriptor file '{}'",
            path.display()
        )));
    }
    let text = fs::read_to_string(&path).map_err(ConsoleError::IoError)?;
    let record = record::record_from_descriptor(&text, &config.operator, &time::now_stamp())?;

    local::upsert_local(config, &record)?;
    println!(
        "{} Package metadata upserted for key '{}'.",
        "✓".bright_green(),
        record.key
    );

    // Mirror is best-effort; the local store stays authoritative on failure.
    let outcome = mirror::mirror_to_central(config);
    if !outcome.ok {
        println!(
            "{} Central mirror failed; local store remains authoritative.",
            "⚠".bright_yellow()
        );
    }
    Ok(())
}

fn run_status(config: &ConsoleConfig) -> Result<(), ConsoleError> {
    let records = local::list_local(config)?;
    println!(
        "Local store:   {} ({} records)",
        config.local_db_path().display(),
        records.len()
    );
    println!("Central file:  {}", config.central_db_path().display());
    println!("Master store:  {}", config.master_db_path().display());
    match aggregate::last_merged(config) {
        Some(stamp) => println!("Last master merge: {}", stamp.bright_green()),
        None => println!("Last master merge: {}", "never".bright_yellow()),
    }
    Ok(())
}

fn run_view(config: &ConsoleConfig, view_cli: ViewCli) -> Result<(), ConsoleError> {
    match view_cli.command {
        ViewCommand::Operators => {
            let operators = aggregate::discover_operators(config)?;
            if operators.is_empty() {
                println!("No central stores found.");
            }
            for op in operators {
                println!("{}", op);
            }
            Ok(())
        }
        ViewCommand::Operator { id } => {
            let path = config
                .central_metadata_dir()
                .join(format!("{}{}", id, schemas::CENTRAL_DB_SUFFIX));
            let records = aggregate::read_central_file(&path)?;
            for r in &records {
                println!(
                    "{}  {} {}  {}  {}  {}",
                    r.key.bright_white(),
                    r.name,
                    r.version,
                    r.installer_type,
                    r.submitted_by,
                    r.submitted_on
                );
                println!(
                    "    {}",
                    output::compact_line(&r.descriptor_text, 96).bright_black()
                );
            }
            println!("{} record(s).", records.len());
            Ok(())
        }
        ViewCommand::Master => {
            let records = aggregate::read_master(config)?;
            for r in &records {
                println!(
                    "{}  {} {}  {}  {}  {}",
                    r.key.bright_white(),
                    r.name,
                    r.version,
                    r.installer_type,
                    r.submitted_by,
                    r.submitted_on
                );
                println!(
                    "    {}",
                    output::compact_line(&r.descriptor_text, 96).bright_black()
                );
            }
            println!("{} record(s).", records.len());
            Ok(())
        }
    }
}
