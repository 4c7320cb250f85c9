use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::eyre;
use commands::blend::BlendArgs;
use commands::config::ConfigAction;
use commands::session::SessionAction;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "cinemablend")]
#[command(about = "CinemaBlend - How compatible is your film taste?")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Also write logs to a daily rotating file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two Letterboxd exports
    #[command(long_about = "Compare two Letterboxd exports and print a compatibility score with the reasoning behind it. Each path may be a single CSV file or an extracted export directory containing watched.csv, ratings.csv and diary.csv.")]
    Blend {
        /// First person's export (directory or CSV)
        #[arg(long, value_name = "PATH")]
        left: PathBuf,

        /// Second person's export (directory or CSV)
        #[arg(long, value_name = "PATH")]
        right: PathBuf,

        /// Display name for the first person (defaults to the export name)
        #[arg(long)]
        left_name: Option<String>,

        /// Display name for the second person
        #[arg(long)]
        right_name: Option<String>,

        /// Look up film popularity on TMDB to compare niche taste
        #[arg(long, action = ArgAction::SetTrue)]
        with_metadata: bool,

        /// Ignore resolved films shorter than this many minutes
        #[arg(long, value_name = "MINUTES")]
        min_runtime: Option<u32>,

        /// Number of clashes to show
        #[arg(long, value_name = "N")]
        clashes: Option<usize>,
    },
    /// Blend with someone else through a shared session code
    Session {
        #[command(subcommand)]
        cmd: SessionCommands,
    },
    /// Show or edit configuration and credentials
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Upload your films and print a code to share
    Create {
        /// Your export (directory or CSV)
        #[arg(long, value_name = "PATH")]
        export: PathBuf,

        #[arg(long)]
        name: Option<String>,

        /// Keep waiting for the other person, then show the blend
        #[arg(long, action = ArgAction::SetTrue)]
        wait: bool,

        #[arg(long, action = ArgAction::SetTrue)]
        with_metadata: bool,
    },
    /// Join someone's session and show the blend
    Join {
        code: String,

        #[arg(long, value_name = "PATH")]
        export: PathBuf,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, action = ArgAction::SetTrue)]
        with_metadata: bool,
    },
    /// Wait for someone to join a session you created
    Wait {
        code: String,

        #[arg(long, action = ArgAction::SetTrue)]
        with_metadata: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks credentials)
    Show {
        /// Show credentials unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Print the config, credentials, session and log locations
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// Store TMDB credentials
    #[command(long_about = "Store a TMDB v3 API key and/or v4 read access token in the credentials file. TMDB_API_KEY and TMDB_BEARER_TOKEN environment variables take precedence.")]
    Tmdb {
        #[arg(long)]
        api_key: Option<String>,

        #[arg(long)]
        bearer_token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())
        .map_err(|e| eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Blend {
            left,
            right,
            left_name,
            right_name,
            with_metadata,
            min_runtime,
            clashes,
        } => {
            let args = BlendArgs {
                left,
                right,
                left_name,
                right_name,
                with_metadata,
                min_runtime,
                clashes,
            };
            commands::blend::run_blend(args, &output).await
        }
        Commands::Session { cmd } => {
            let action = match cmd {
                SessionCommands::Create {
                    export,
                    name,
                    wait,
                    with_metadata,
                } => SessionAction::Create {
                    export,
                    name,
                    wait,
                    with_metadata,
                },
                SessionCommands::Join {
                    code,
                    export,
                    name,
                    with_metadata,
                } => SessionAction::Join {
                    code,
                    export,
                    name,
                    with_metadata,
                },
                SessionCommands::Wait { code, with_metadata } => SessionAction::Wait { code, with_metadata },
            };
            commands::session::run_session(action, &output).await
        }
        Commands::Config { cmd } => {
            let action = match cmd {
                ConfigCommands::Show { full } => ConfigAction::Show { full },
                ConfigCommands::Path => ConfigAction::Path,
                ConfigCommands::Init { force } => ConfigAction::Init { force },
                ConfigCommands::Tmdb { api_key, bearer_token } => ConfigAction::Tmdb { api_key, bearer_token },
            };
            commands::config::run_config(action, &output).await
        }
    }
}
