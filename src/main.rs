use anyhow::Result;
use asset_patcher::patcher::{self, PatchOutcome};
use asset_patcher::rules::{self, RuleSet};
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::path::Path;

/// The generated bundle this tool exists to repair.
const TARGET_FILE: &str = "assets/app.js";

#[derive(Parser)]
#[command(name = "asset-patcher")]
#[command(about = "Fixes the known syntax errors in the generated storefront bundle", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fix the known missing-comma syntax errors in assets/app.js (default)
    Syntax {
        /// Dry run - report rule matches without modifying the file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of the pending change
        #[arg(short, long)]
        diff: bool,
    },

    /// Fix the syntax errors and make optimized image paths keep their extension
    ImagePaths {
        /// Dry run - report rule matches without modifying the file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of the pending change
        #[arg(short, long)]
        diff: bool,
    },

    /// List the built-in fix rules without touching the target
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // No subcommand means the plain fix run.
    let command = cli.command.unwrap_or(Commands::Syntax {
        dry_run: false,
        diff: false,
    });

    match command {
        Commands::Syntax { dry_run, diff } => cmd_fix(&rules::syntax_fixes()?, dry_run, diff),
        Commands::ImagePaths { dry_run, diff } => {
            cmd_fix(&rules::image_path_fixes()?, dry_run, diff)
        }
        Commands::List => cmd_list(),
    }
}

fn cmd_fix(set: &RuleSet, dry_run: bool, show_diff: bool) -> Result<()> {
    let target = Path::new(TARGET_FILE);

    if dry_run {
        println!("{}", "  [DRY RUN - no changes written]".cyan());
        let before = patcher::load(target)?;
        report_matches(set, &before);
        if show_diff {
            let after = set.apply(&before);
            if before != after {
                display_diff(target, &before, &after);
            }
        }
        return Ok(());
    }

    // Capture content before applying (for diff output).
    let mut before = None;
    if show_diff {
        before = Some(patcher::load(target)?);
    }

    let outcome = patcher::patch_in_place(target, set)?;

    if let (Some(before), PatchOutcome::Patched { .. }) = (&before, &outcome) {
        let after = patcher::load(target)?;
        display_diff(target, before, &after);
    }

    println!("{}", set.notice());
    Ok(())
}

/// Report per-rule match counts against the evolving buffer, the way the
/// rules would see it during a real run.
fn report_matches(set: &RuleSet, before: &str) {
    let mut buffer = before.to_string();
    for rule in set.rules() {
        let count = rule.match_count(&buffer);
        if count > 0 {
            println!(
                "{} {} match(es): {}",
                "✓".green(),
                count,
                rule.pattern_str()
            );
        } else {
            println!("{} no matches: {}", "⊙".yellow(), rule.pattern_str());
        }
        buffer = rule.apply(&buffer);
    }
}

/// Show unified diff between original and patched content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
    println!();
}

fn cmd_list() -> Result<()> {
    for set in [rules::syntax_fixes()?, rules::image_path_fixes()?] {
        println!(
            "{} ({} rules) - prints \"{}\"",
            set.name().bold(),
            set.rules().len(),
            set.notice()
        );
        for rule in set.rules() {
            println!("  {} -> {}", rule.pattern_str(), rule.replacement().dimmed());
        }
        println!();
    }
    Ok(())
}
