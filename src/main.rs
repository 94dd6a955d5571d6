use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::io::{self, Write};
use std::path::{Path as FsPath, PathBuf};
use traverser::document::Document;
use traverser::rules::{self, apply_rules, ScrubOutcome};
use traverser::value::convert::{from_json_str, to_json_string_pretty};
use traverser::{get_at_path, logging, set_at_path, traverse, Hooks, Path, Visit};

#[derive(Parser)]
#[command(name = "traverser")]
#[command(about = "Inspect and rewrite JSON/TOML documents by path and rule set", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug events to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value at a dotted path as JSON
    Get {
        /// Document to read (.json or .toml)
        file: PathBuf,

        /// Dotted path, e.g. `server.port` (empty for the whole document)
        path: String,
    },

    /// Set the value at a dotted path, creating missing maps
    Set {
        /// Document to edit (.json or .toml)
        file: PathBuf,

        /// Dotted path of the key to set
        path: String,

        /// New value as JSON, e.g. `42` or `'{"a": true}'`
        value: String,

        /// Write the result back to the file instead of printing it
        #[arg(short, long)]
        in_place: bool,
    },

    /// List every path in the document with its shape, children first
    Paths {
        /// Document to read (.json or .toml)
        file: PathBuf,
    },

    /// Apply rule sets to a document
    Scrub {
        /// Document to scrub (.json or .toml)
        file: PathBuf,

        /// Rule file, or directory of .toml rule files applied in name order
        #[arg(short, long)]
        rules: PathBuf,

        /// Write the result back to the file instead of printing it
        #[arg(short, long)]
        in_place: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Dry run - report what would change without writing anything
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Get { file, path } => cmd_get(&file, &path),

        Commands::Set {
            file,
            path,
            value,
            in_place,
        } => cmd_set(&file, &path, &value, in_place),

        Commands::Paths { file } => cmd_paths(&file),

        Commands::Scrub {
            file,
            rules,
            in_place,
            diff,
            dry_run,
        } => cmd_scrub(&file, &rules, in_place, diff, dry_run),
    }
}

/// Helper: Show unified diff between original and scrubbed content
fn display_diff(out: &mut dyn Write, file: &FsPath, original: &str, modified: &str) -> Result<()> {
    writeln!(
        out,
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    )?;
    writeln!(out, "{}", format!("+++ {} (scrubbed)", file.display()).dimmed())?;

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        write!(out, "{}", sign)?;
    }
    Ok(())
}

fn cmd_get(file: &FsPath, path: &str) -> Result<()> {
    let document = Document::read(file)?;
    let path = Path::parse(path)?;
    let found = get_at_path(&document.value, path.segments())?;
    println!("{}", to_json_string_pretty(found)?);
    Ok(())
}

fn cmd_set(file: &FsPath, path: &str, value: &str, in_place: bool) -> Result<()> {
    let document = Document::read(file)?;
    let path = Path::parse(path)?;
    let value = from_json_str(value).context("value must be valid JSON")?;

    let mut edited = document.value.clone();
    set_at_path(&mut edited, path.segments(), value)?;
    let rendered = document.render(&edited)?;

    if in_place {
        document.write(&rendered)?;
        println!("{} Set {} in {}", "✓".green(), display_path(&path), file.display());
    } else {
        print!("{}", rendered);
    }
    Ok(())
}

fn cmd_paths(file: &FsPath) -> Result<()> {
    let document = Document::read(file)?;

    let mut seen = Vec::new();
    let mut hooks = Hooks::new().on_visit(|path, node| {
        seen.push((display_path(path), node.kind()));
        Visit::keep()
    });
    traverse(&document.value, &mut hooks).into_result()?;
    drop(hooks);

    for (path, kind) in seen {
        println!("{}\t{}", path, kind.to_string().dimmed());
    }
    Ok(())
}

fn cmd_scrub(
    file: &FsPath,
    rules_path: &FsPath,
    in_place: bool,
    show_diff: bool,
    dry_run: bool,
) -> Result<()> {
    let document = Document::read(file)?;
    let rule_sets = rules::load(rules_path)?;

    // The scrubbed document owns stdout unless it is written back or discarded.
    let document_to_stdout = !in_place && !dry_run;
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    let out: &mut dyn Write = if document_to_stdout {
        &mut stderr
    } else {
        &mut stdout
    };

    if dry_run {
        writeln!(out, "{}", "[DRY RUN - nothing will be written]".cyan())?;
    }

    let mut current = document.value.clone();
    let mut total_applied = 0;
    let mut total_hits = 0;
    let mut total_skipped = 0;
    let mut total_failed = 0;

    for (rules_file, rule_set) in &rule_sets {
        let name = if rule_set.meta.name.is_empty() {
            rules_file.display().to_string()
        } else {
            rule_set.meta.name.clone()
        };

        match apply_rules(rule_set, &current) {
            Ok(ScrubOutcome::Applied {
                value: Some(value),
                hits,
            }) => {
                writeln!(out, "{} {}: {} hit(s)", "✓".green(), name, hits.len())?;
                for hit in &hits {
                    writeln!(
                        out,
                        "    {} {} {}",
                        hit.action,
                        display_path(&hit.path),
                        format!("({})", hit.rule_id).dimmed()
                    )?;
                }
                total_applied += 1;
                total_hits += hits.len();
                current = value;
            }
            Ok(ScrubOutcome::Applied { value: None, .. }) => {
                writeln!(out, "{} {}: Deleted the whole document", "✗".red(), name)?;
                total_failed += 1;
            }
            Ok(ScrubOutcome::SkippedVersion { reason }) => {
                writeln!(out, "{} {}: Skipped ({})", "⊘".cyan(), name, reason)?;
                total_skipped += 1;
            }
            Err(e) => {
                writeln!(out, "{} {}: Error - {}", "✗".red(), name, e)?;
                if let Some(violation) = e.rejection() {
                    writeln!(out, "  {}", "REJECTED".red().bold())?;
                    writeln!(out, "  Rule: {}", violation.rule_id)?;
                    writeln!(out, "  Path: {}", display_path(&violation.path))?;
                }
                total_failed += 1;
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", "Summary:".bold())?;
    writeln!(out, "  {} applied", format!("{}", total_applied).green())?;
    writeln!(out, "  {} hits", format!("{}", total_hits).green())?;
    writeln!(out, "  {} skipped", format!("{}", total_skipped).cyan())?;
    writeln!(out, "  {} failed", format!("{}", total_failed).red())?;

    if total_failed > 0 {
        out.flush()?;
        std::process::exit(1);
    }

    let rendered = document.render(&current)?;
    let changed = current != document.value;

    if show_diff && changed {
        display_diff(out, file, &document.source, &rendered)?;
    }

    if dry_run {
        return Ok(());
    }

    if in_place {
        if changed {
            document
                .write(&rendered)
                .with_context(|| format!("failed to write {}", file.display()))?;
            writeln!(out, "Wrote {}", file.display())?;
        } else {
            writeln!(out, "{}", "No changes".dimmed())?;
        }
    } else {
        out.flush()?;
        print!("{}", rendered);
    }

    Ok(())
}

fn display_path(path: &Path) -> String {
    if path.is_root() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}
