//! MDK CLI
//!
//! Command-line interface for packing multi-file C# script projects into a
//! single programmable block script

mod commands;
mod output;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use mdk_core::{MinifierLevel, init_tracing};

#[derive(Parser)]
#[command(name = "mdk")]
#[command(about = "MDK: pack multi-file C# projects into a single in-game script")]
#[command(version = mdk_core::VERSION)]
#[command(
    long_about = "MDK merges the source files of a programmable block project into one script,\n\
trims unused types and optionally minifies the result.\n\
\n\
Examples:\n  \
mdk pack                       # Pack the project in the current directory\n  \
mdk pack Scripts/A Scripts/B   # Pack several projects concurrently\n  \
mdk pack --minify full --trim  # Smallest output\n  \
mdk minify Script.cs -l lite   # Minify a single file to stdout"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (mdk.toml/mdk.yaml/mdk.json)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack one or more projects into Script.cs
    Pack {
        #[arg(help = "Project directories (default: current directory)")]
        projects: Vec<PathBuf>,

        #[arg(short, long, help = "Output directory (default: <project>/out)")]
        output: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Minifier level: none, stripcomments, lite or full"
        )]
        minify: Option<MinifierLevel>,

        #[arg(long, help = "Remove types that are never referenced")]
        trim: bool,

        #[arg(long, help = "Also remove unreferenced members of kept types")]
        trim_members: bool,

        #[arg(
            short,
            long = "define",
            help = "Define a preprocessor symbol (can be used multiple times)"
        )]
        define: Vec<String>,

        #[arg(
            long = "macro",
            help = "Set a $NAME$ macro (NAME=VALUE, can be used multiple times)",
            value_parser = parse_macro
        )]
        macros: Vec<(String, String)>,

        #[arg(long, help = "Run the pipeline without writing any file")]
        dry_run: bool,
    },

    /// Minify a single C# file
    Minify {
        #[arg(help = "C# source file")]
        file: PathBuf,

        #[arg(short, long, default_value = "full", help = "Minifier level")]
        level: MinifierLevel,

        #[arg(short, long, help = "Write the result to a file instead of stdout")]
        output: Option<PathBuf>,
    },

    /// Show version information
    #[command(alias = "ver")]
    Version {
        #[arg(long, help = "Show detailed version and build information")]
        detailed: bool,
    },
}

fn parse_macro(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("Invalid macro '{s}'. Expected 'NAME=VALUE'")),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if !cli.no_color && std::env::var("NO_COLOR").is_err() {
        colored::control::set_override(true);
    } else {
        colored::control::set_override(false);
    }

    if std::env::var("RUST_LOG").is_err() {
        let log_level = match cli.verbose {
            0 => "mdk=warn",
            1 => "mdk=info",
            2 => "mdk=debug",
            _ => "mdk=trace",
        };
        // still single threaded here
        unsafe {
            std::env::set_var("RUST_LOG", log_level);
        }
    }
    init_tracing();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_command(cli))
}

async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Pack {
            projects,
            output,
            minify,
            trim,
            trim_members,
            define,
            macros,
            dry_run,
        }) => {
            let projects = if projects.is_empty() {
                vec![PathBuf::from(".")]
            } else {
                projects
            };
            commands::pack::pack_command(
                projects,
                commands::pack::PackArgs {
                    output,
                    minify,
                    trim,
                    trim_members,
                    define,
                    macros,
                    dry_run,
                    config: cli.config,
                },
            )
            .await
        }

        Some(Commands::Minify {
            file,
            level,
            output,
        }) => commands::minify::minify_command(file, level, output).await,

        Some(Commands::Version { detailed }) => {
            commands::version_command(detailed);
            Ok(())
        }

        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
