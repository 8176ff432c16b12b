use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tunnel_patcher::config::{
    apply_patches, check_patches, discover_patch_files, load_from_path, presets,
    ApplicationError, ApplyOptions, ApplyReport, FileChange, PatchConfig, PatchResult,
};

#[derive(Parser)]
#[command(name = "tunnel-patcher")]
#[command(
    about = "Patch the store demo's container configuration for tunnelled access",
    long_about = None
)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Directory the target files live in (defaults to the current directory)
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    /// Dry run - show what would be changed without modifying files
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long, global = true)]
    diff: bool,

    /// Fail patches whose target matches nothing
    #[arg(long, global = true)]
    strict: bool,

    /// Log every planned and written change to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Point MAGENTO_URL in the environment file at the tunnel hostname
    SetHostname {
        /// Public hostname of the tunnel
        host: String,

        #[arg(long, default_value = presets::DOCKER_ENV)]
        file: String,
    },

    /// Drop the sample data installer line from the store Dockerfile
    RemoveSampleData {
        #[arg(long, default_value = presets::DOCKERFILE)]
        file: String,
    },

    /// Set the PHP base image tag in the store Dockerfile
    SetPhp {
        /// PHP image tag, e.g. 5.6.21
        version: String,

        #[arg(long, default_value = presets::DOCKERFILE)]
        file: String,
    },

    /// Set the store image tag in the compose file
    SetMagentoVersion {
        /// Image tag, e.g. 1.9.3.8
        tag: String,

        #[arg(long, default_value = presets::COMPOSE_FILE)]
        file: String,

        /// Compose service running the store
        #[arg(long, default_value = presets::STORE_SERVICE)]
        service: String,
    },

    /// Replace every occurrence of a placeholder in a file
    ReplacePlaceholder {
        /// Replacement text
        value: String,

        #[arg(long)]
        file: String,

        #[arg(long)]
        placeholder: String,
    },

    /// Apply patch sets to a workspace
    Apply {
        /// Patch set to apply (otherwise applies all in <workspace>/patches)
        patches: Option<PathBuf>,

        /// Value for patches that leave it to the caller
        #[arg(long)]
        value: Option<String>,
    },

    /// Check status of patch sets without applying
    Status {
        /// Patch set to check (otherwise checks all in <workspace>/patches)
        patches: Option<PathBuf>,

        /// Value for patches that leave it to the caller
        #[arg(long)]
        value: Option<String>,

        /// Print machine-readable results
        #[arg(long)]
        json: bool,
    },
}

/// Settings shared by every command in one invocation.
struct Run {
    workspace: PathBuf,
    dry_run: bool,
    diff: bool,
    strict: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let run = Run {
        workspace: resolve_workspace(cli.global.workspace)?,
        dry_run: cli.global.dry_run,
        diff: cli.global.diff,
        strict: cli.global.strict,
    };

    match cli.command {
        Commands::SetHostname { host, file } => {
            cmd_preset(&run, presets::set_hostname(&file), Some(host))
        }
        Commands::RemoveSampleData { file } => {
            cmd_preset(&run, presets::remove_sample_data(&file), None)
        }
        Commands::SetPhp { version, file } => {
            cmd_preset(&run, presets::set_php(&file), Some(version))
        }
        Commands::SetMagentoVersion { tag, file, service } => cmd_preset(
            &run,
            presets::set_magento_version(&file, &service),
            Some(tag),
        ),
        Commands::ReplacePlaceholder {
            value,
            file,
            placeholder,
        } => cmd_preset(
            &run,
            presets::replace_placeholder(&file, &placeholder),
            Some(value),
        ),
        Commands::Apply { patches, value } => cmd_apply(&run, patches, value),
        Commands::Status {
            patches,
            value,
            json,
        } => cmd_status(&run, patches, value, json),
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise only warnings, or this crate's debug
/// output with `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "tunnel_patcher=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

/// Resolve workspace path
///
/// Priority order:
/// 1. Explicit --workspace flag
/// 2. TUNNEL_PATCHER_WORKSPACE environment variable
/// 3. Current directory
fn resolve_workspace(cli_workspace: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_workspace {
        return path
            .canonicalize()
            .with_context(|| format!("workspace {} is not accessible", path.display()));
    }

    if let Ok(env_path) = env::var("TUNNEL_PATCHER_WORKSPACE") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return path
                .canonicalize()
                .with_context(|| format!("workspace {} is not accessible", path.display()));
        }
        eprintln!(
            "{}",
            format!(
                "Warning: TUNNEL_PATCHER_WORKSPACE is set but path doesn't exist: {}",
                env_path
            )
            .yellow()
        );
    }

    env::current_dir().context("could not determine the current directory")
}

/// Load the named patch set, or every patch set in `<workspace>/patches`.
fn load_patch_sets(
    workspace: &Path,
    patches: Option<PathBuf>,
) -> Result<Vec<(PathBuf, PatchConfig)>> {
    let files = match patches {
        Some(path) => vec![path],
        None => {
            let dir = workspace.join("patches");
            let files = discover_patch_files(&dir)?;
            if files.is_empty() {
                anyhow::bail!("No .toml patch sets found in {}", dir.display());
            }
            files
        }
    };

    files
        .into_iter()
        .map(|file| -> Result<(PathBuf, PatchConfig)> {
            let config = load_from_path(&file)?;
            Ok((file, config))
        })
        .collect()
}

/// Helper: Show unified diff between original and modified content
fn display_diff(change: &FileChange) {
    println!(
        "\n{}",
        format!("--- {} (original)", change.file.display()).dimmed()
    );
    println!(
        "{}",
        format!("+++ {} (patched)", change.file.display()).dimmed()
    );

    let diff = TextDiff::from_lines(&change.before, &change.after);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

#[derive(Default)]
struct Tally {
    applied: usize,
    already_applied: usize,
    unmatched: usize,
    failed: usize,
}

impl Tally {
    fn print_summary(&self) {
        println!("{}", "Summary:".bold());
        println!("  {} applied", format!("{}", self.applied).green());
        println!(
            "  {} already applied",
            format!("{}", self.already_applied).yellow()
        );
        println!("  {} unmatched", format!("{}", self.unmatched).cyan());
        println!("  {} failed", format!("{}", self.failed).red());
    }
}

fn run_config(run: &Run, config: &PatchConfig, argument: Option<String>) -> ApplyReport {
    let options = ApplyOptions {
        argument,
        strict: run.strict,
    };
    if run.dry_run {
        check_patches(config, &run.workspace, &options)
    } else {
        apply_patches(config, &run.workspace, &options)
    }
}

fn print_report(run: &Run, report: &ApplyReport, tally: &mut Tally) {
    for (patch_id, result) in &report.results {
        match result {
            Ok(PatchResult::Applied { file }) => {
                let verb = if run.dry_run { "Would apply" } else { "Applied" };
                println!("{} {}: {} to {}", "✓".green(), patch_id, verb, file.display());
                tally.applied += 1;
            }
            Ok(PatchResult::AlreadyApplied { file }) => {
                println!(
                    "{} {}: Already applied to {}",
                    "⊙".yellow(),
                    patch_id,
                    file.display()
                );
                tally.already_applied += 1;
            }
            Ok(PatchResult::Unmatched { file, reason }) => {
                println!(
                    "{} {}: No match in {} ({}), left unchanged",
                    "⊘".cyan(),
                    patch_id,
                    file.display(),
                    reason
                );
                tally.unmatched += 1;
            }
            Err(e) => {
                eprintln!("{} {}: Error - {}", "✗".red(), patch_id, e);
                tally.failed += 1;

                match e {
                    ApplicationError::NoMatch { file, .. } => {
                        eprintln!("  {}", "CONFLICT: target matched nothing".red());
                        eprintln!("  File: {}", file.display());
                        eprintln!("  Possible causes:");
                        eprintln!("    - The file was already rewritten by hand");
                        eprintln!("    - The marker line was renamed or removed");
                    }
                    ApplicationError::MissingValue { .. } => {
                        eprintln!("  Pass the value with --value <VALUE>");
                    }
                    _ => {}
                }
            }
        }
    }

    if run.diff {
        for change in &report.changes {
            display_diff(change);
        }
    }
}

fn cmd_preset(run: &Run, config: PatchConfig, argument: Option<String>) -> Result<()> {
    if run.dry_run {
        println!("{}", "[DRY RUN - showing what would be applied]".cyan());
    }

    let mut tally = Tally::default();
    let report = run_config(run, &config, argument);
    print_report(run, &report, &mut tally);

    if tally.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_apply(run: &Run, patches: Option<PathBuf>, value: Option<String>) -> Result<()> {
    let patch_sets = load_patch_sets(&run.workspace, patches)?;

    println!("Workspace: {}", run.workspace.display());
    println!();

    let mut tally = Tally::default();

    for (patch_file, config) in patch_sets {
        println!("Loading patches from {}...", patch_file.display());
        if run.dry_run {
            println!("{}", "  [DRY RUN - showing what would be applied]".cyan());
        }

        let report = run_config(run, &config, value.clone());
        print_report(run, &report, &mut tally);
        println!();
    }

    tally.print_summary();

    if tally.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_status(
    run: &Run,
    patches: Option<PathBuf>,
    value: Option<String>,
    json: bool,
) -> Result<()> {
    let patch_sets = load_patch_sets(&run.workspace, patches)?;
    let options = ApplyOptions {
        argument: value,
        strict: run.strict,
    };

    let mut applied = Vec::new();
    let mut pending = Vec::new();
    let mut unmatched = Vec::new();
    let mut failed = Vec::new();
    let mut entries = Vec::new();

    // Read-only; does not mutate workspace files
    for (patch_file, config) in &patch_sets {
        let report = check_patches(config, &run.workspace, &options);

        for (patch_id, result) in report.results {
            let (status, file, reason) = match &result {
                Ok(PatchResult::AlreadyApplied { file }) => ("applied", Some(file.clone()), None),
                Ok(PatchResult::Applied { file }) => ("pending", Some(file.clone()), None),
                Ok(PatchResult::Unmatched { file, reason }) => {
                    ("unmatched", Some(file.clone()), Some(reason.clone()))
                }
                Err(e) => ("failed", None, Some(e.to_string())),
            };

            entries.push(serde_json::json!({
                "patch_set": patch_file.display().to_string(),
                "id": patch_id,
                "status": status,
                "file": file.map(|f| f.display().to_string()),
                "reason": reason,
            }));

            let reason = reason.unwrap_or_default();
            match status {
                "applied" => applied.push((patch_id, reason)),
                "pending" => pending.push((patch_id, reason)),
                "unmatched" => unmatched.push((patch_id, reason)),
                _ => failed.push((patch_id, reason)),
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{}", "Patch Status Report".bold());
    println!("Workspace: {}", run.workspace.display());
    println!();

    let groups = [
        ("✓".green(), "APPLIED".green().bold(), &applied),
        ("⊙".yellow(), "PENDING".yellow().bold(), &pending),
        ("⊘".cyan(), "UNMATCHED".cyan().bold(), &unmatched),
        ("✗".red(), "FAILED".red().bold(), &failed),
    ];

    for (symbol, title, items) in groups {
        if items.is_empty() {
            continue;
        }
        println!("{} {} ({} patches)", symbol, title, items.len());
        for (id, reason) in items.iter() {
            if reason.is_empty() {
                println!("  - {}", id);
            } else {
                println!("  - {} ({})", id, reason.dimmed());
            }
        }
        println!();
    }

    Ok(())
}
