mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ripp",
    about = "Capture and compile feature intent into canonical RIPP packets",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .ripp/ or .git/)
    #[arg(long, global = true, env = "RIPP_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize RIPP in the current project
    Init,

    /// Build or inspect the evidence pack
    Evidence {
        #[command(subcommand)]
        subcommand: cmd::evidence::EvidenceSubcommand,
    },

    /// Run candidate inference and write the discovery checklist
    Discover {
        /// Completeness tier to aim for (overrides config)
        #[arg(long)]
        level: Option<u8>,

        /// Inference provider (overrides config)
        #[arg(long)]
        provider: Option<String>,
    },

    /// Re-render or parse the discovery checklist
    Checklist {
        #[command(subcommand)]
        subcommand: cmd::checklist::ChecklistSubcommand,
    },

    /// Compile confirmed blocks into a canonical packet
    Build {
        /// Packet id (kebab-case)
        id: String,

        /// Human-readable title (defaults to a titlecased form of the id)
        #[arg(long)]
        title: Option<String>,

        /// Read the edited checklist instead of a confirmed artifact
        #[arg(long)]
        from_checklist: bool,
    },

    /// Validate canonical packet files
    Validate {
        /// Packet files to validate (default: every packet under .ripp/packets/)
        files: Vec<PathBuf>,

        /// Reject packets below this completeness tier
        #[arg(long)]
        min_level: Option<u8>,

        /// Validate against an external schema file instead of the bundled one
        #[arg(long)]
        schema: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Evidence { subcommand } => cmd::evidence::run(&root, subcommand, cli.json),
        Commands::Discover { level, provider } => {
            cmd::discover::run(&root, level, provider.as_deref(), cli.json)
        }
        Commands::Checklist { subcommand } => cmd::checklist::run(&root, subcommand, cli.json),
        Commands::Build {
            id,
            title,
            from_checklist,
        } => cmd::build::run(&root, &id, title, from_checklist, cli.json),
        Commands::Validate {
            files,
            min_level,
            schema,
        } => cmd::validate::run(&root, &files, min_level, schema.as_deref(), cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
