//! tempe CLI - Design-time compilation for project inputs.

mod build;
mod colors;
mod compiler;
mod list;
mod manifest;
mod source;
mod watch;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tempe")]
#[command(about = "Incremental design-time compilation driven by file changes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Keep artifacts compiled while inputs change
    Watch {
        /// Path to tempe.json (or its directory)
        #[arg(default_value = manifest::MANIFEST_FILE)]
        manifest: String,
    },

    /// Compile one artifact on demand
    Build {
        /// Path to tempe.json (or its directory)
        manifest: String,

        /// Project-relative name of the input (see `tempe list`)
        name: String,

        /// Recompile even if the artifact is up to date
        #[arg(short, long)]
        force: bool,

        /// Print the artifact descriptor as JSON
        #[arg(long)]
        json: bool,
    },

    /// List design-time inputs and the state of their artifacts
    List {
        /// Path to tempe.json (or its directory)
        #[arg(default_value = manifest::MANIFEST_FILE)]
        manifest: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Watch reports every burst, the one-shot commands only problems.
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else if matches!(cli.command, Commands::Watch { .. }) {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    // RUST_LOG, when set, takes precedence over the command's default.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format tempe-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(tempe_err) = err.downcast_ref::<tempe_core::Error>() {
            anyhow::anyhow!("{}", tempe_err.with_hint())
        } else {
            err
        }
    };

    match cli.command {
        Commands::Watch { manifest } => watch::execute(&manifest).await.map_err(format_error)?,

        Commands::Build {
            manifest,
            name,
            force,
            json,
        } => {
            build::execute(&manifest, &name, force, json)
                .await
                .map_err(format_error)?;
        }

        Commands::List { manifest } => list::execute(&manifest).map_err(format_error)?,
    }

    Ok(())
}
