#![forbid(unsafe_code)]

mod cmd;
mod context;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, Reported};
use std::env;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "pt: patrimony tracker for collaborators and their assets",
    long_about = None
)]
struct Cli {
    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for --format json.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags, environment and config.
    fn output_mode(&self) -> OutputMode {
        let config_output = patrimonio_core::config::load()
            .ok()
            .and_then(|config| config.output);
        output::resolve_output_mode(self.format, self.json, config_output.as_deref())
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Configure the remote backend",
        long_about = "Validate the project URL and anon key and save them to the config file.",
        after_help = "EXAMPLES:\n    # Point pt at a project\n    pt setup --url https://xyz.supabase.co --key <anon-key>"
    )]
    Setup(cmd::setup::SetupArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Inspect configuration",
        subcommand
    )]
    Config(cmd::config::ConfigCommand),

    #[command(
        next_help_heading = "Account",
        about = "Sign in",
        long_about = "Sign in with email and password and persist the session.",
        after_help = "EXAMPLES:\n    # Sign in\n    pt login --email ana@example.com --password secret"
    )]
    Login(cmd::session::LoginArgs),

    #[command(
        next_help_heading = "Account",
        about = "Create an account",
        long_about = "Create an account. Requires the administrator code configured for this installation.",
        after_help = "EXAMPLES:\n    # Create an account\n    pt signup --email bo@example.com --password secret1 --admin-code <code>"
    )]
    Signup(cmd::session::SignupArgs),

    #[command(next_help_heading = "Account", about = "Sign out and forget the session")]
    Logout,

    #[command(next_help_heading = "Account", about = "Show the signed-in user")]
    Whoami,

    #[command(next_help_heading = "Data", about = "Manage collaborators", subcommand)]
    Collaborator(cmd::collaborator::CollaboratorCommand),

    #[command(next_help_heading = "Data", about = "Manage assets", subcommand)]
    Asset(cmd::asset::AssetCommand),

    #[command(
        next_help_heading = "Reports",
        about = "Show totals and assets per collaborator",
        after_help = "EXAMPLES:\n    # Show the dashboard\n    pt dashboard\n\n    # Emit machine-readable output\n    pt dashboard --json"
    )]
    Dashboard,

    #[command(
        next_help_heading = "Reports",
        about = "Export the asset list to CSV",
        after_help = "EXAMPLES:\n    # Export everything to patrimonios.csv\n    pt export\n\n    # Export matching assets only\n    pt export --search notebook --output notebooks.csv"
    )]
    Export(cmd::export::ExportArgs),

    #[command(
        next_help_heading = "Assistant",
        about = "Suggest category and description for an asset name",
        after_help = "EXAMPLES:\n    # Ask the assistant\n    pt suggest \"Dell Latitude 5440\""
    )]
    Suggest(cmd::ai::SuggestArgs),

    #[command(
        next_help_heading = "Assistant",
        about = "Generate an audit report of the asset distribution"
    )]
    Audit,

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    pt completions bash > ~/.local/share/bash-completion/completions/pt"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PATRIMONIO_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "patrimonio=debug,info"
        } else {
            "patrimonio=info,warn"
        })
    });

    let format = env::var("PATRIMONIO_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: Cli, output: OutputMode) -> anyhow::Result<()> {
    match cli.command {
        Commands::Setup(ref args) => cmd::setup::run_setup(args, output),
        Commands::Config(ref command) => cmd::config::run_config(command, output),
        Commands::Login(ref args) => cmd::session::run_login(args, output),
        Commands::Signup(ref args) => cmd::session::run_signup(args, output),
        Commands::Logout => cmd::session::run_logout(output),
        Commands::Whoami => cmd::session::run_whoami(output),
        Commands::Collaborator(ref command) => {
            cmd::collaborator::run_collaborator(command, output)
        }
        Commands::Asset(ref command) => cmd::asset::run_asset(command, output),
        Commands::Dashboard => cmd::dashboard::run_dashboard(output),
        Commands::Export(ref args) => cmd::export::run_export(args, output),
        Commands::Suggest(ref args) => cmd::ai::run_suggest(args, output),
        Commands::Audit => cmd::ai::run_audit(output),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let output = cli.output_mode();
    debug!(?output, "output mode resolved");

    match run(cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.downcast_ref::<Reported>().is_some() => ExitCode::FAILURE,
        Err(err) => {
            let error = CliError::new(format!("{err:#}"));
            if output::render_error(output, &error).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
