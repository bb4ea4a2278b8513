use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::Layer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod ui;

#[derive(Parser)]
#[command(
    name = "rimpatch",
    version,
    about = "Migrate RimWorld FindMod patches to LoadFolders-gated folders"
)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Only print warnings and errors
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify every patch directory and migrate the ones gated on a single known mod set
    Migrate {
        /// Directory whose subdirectories hold patch files
        src: PathBuf,
        /// Destination root for migrated folders
        #[arg(long)]
        dest: Option<PathBuf>,
        /// Known mods dictionary (JSON)
        #[arg(long = "known-mods", visible_alias = "km")]
        known_mods: Option<PathBuf>,
        /// Subdirectory names to leave alone
        #[arg(long, num_args = 1..)]
        skip_dirs: Vec<String>,
        /// Folder prefix used in LoadFolders records
        #[arg(long)]
        prefix: Option<String>,
        /// Replace files that already exist at the destination
        #[arg(long)]
        overwrite: bool,
        /// Remove a source directory once all its files were written
        #[arg(long)]
        delete_source: bool,
        /// Where to write the issues report (JSON)
        #[arg(long)]
        issues_file: Option<PathBuf>,
        /// Where to write the generated LoadFolders records
        #[arg(long)]
        load_folders_file: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Flatten Sequence and FindMod operations in every XML file under a directory
    Patch {
        /// Directory to rewrite, searched recursively
        src: PathBuf,
        /// Write results here instead of rewriting in place
        #[arg(long)]
        dest: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Move patch files that only add whole Defs into each mod's Defs folder
    ExtractDefs {
        /// Directory holding one folder per mod
        src: PathBuf,
        /// Where to list files mixing Def adds with other operations (JSON)
        #[arg(long)]
        mixed_file: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Build or extend the known mods dictionary from installed mods
    ScanMods {
        /// Directory containing one folder per mod
        mods_dir: Option<PathBuf>,
        /// Dictionary file to update
        #[arg(long)]
        out: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Write JSON schemas of the report files
    Schema {
        /// Output directory (default from config, then ./docs/assets/schemas)
        #[arg(long, default_value = "")]
        out_dir: PathBuf,
    },
}

trait Runnable {
    fn run(self) -> Result<()>;
}

impl Runnable for Commands {
    fn run(self) -> Result<()> {
        let cmd_name = format!("{:?}", self);
        debug!(event = "command_start", cmd = %cmd_name);

        let result = match self {
            Commands::Migrate {
                src,
                dest,
                known_mods,
                skip_dirs,
                prefix,
                overwrite,
                delete_source,
                issues_file,
                load_folders_file,
                format,
            } => commands::migrate::run_migrate(commands::migrate::MigrateArgs {
                src,
                dest,
                known_mods,
                skip_dirs,
                prefix,
                overwrite,
                delete_source,
                issues_file,
                load_folders_file,
                format,
            }),
            Commands::Patch { src, dest, format } => commands::patch::run_patch(src, dest, format),
            Commands::ExtractDefs {
                src,
                mixed_file,
                format,
            } => commands::extract_defs::run_extract_defs(src, mixed_file, format),
            Commands::ScanMods {
                mods_dir,
                out,
                format,
            } => commands::scan_mods::run_scan_mods(mods_dir, out, format),
            Commands::Schema { out_dir } => commands::schema::run_schema(out_dir),
        };
        match &result {
            Ok(_) => info!(event = "command_done", cmd = %cmd_name),
            Err(e) => error!(event = "command_failed", cmd = %cmd_name, error = ?e),
        }
        result
    }
}

fn init_tracing(quiet: bool) -> WorkerGuard {
    let file_appender = rolling::daily("logs", "rimpatch.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if quiet { "warn" } else { "info" };
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        );

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let _guard = init_tracing(cli.quiet);

    let use_color = !cli.no_color
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();
    ui::init(cli.quiet, use_color);

    cli.cmd.run()
}
