use std::io::IsTerminal;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "daisycon", version, about = "Call the Daisycon REST API from the command line")]
struct Cli {
    /// Path to a config file (defaults to ~/.daisycon/config.json)
    #[arg(long, global = true, env = "DAISYCON_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize this client and store the tokens
    Auth {
        /// How long to wait for the redirect, in milliseconds
        #[arg(long, env = "DAISYCON_OAUTH_TIMEOUT_MS", default_value_t = 120_000)]
        timeout_ms: u64,
    },

    /// Call an endpoint by name, e.g. `call getPublishersMedia 5 x=1`
    Call {
        /// Call name such as getPublishersMedia or putAdvertisersTransactions
        name: String,

        /// Positional arguments; key=value pairs form the payload
        args: Vec<String>,

        /// JSON output
        #[arg(long)]
        json: bool,

        /// Print X- response headers
        #[arg(long)]
        headers: bool,
    },

    /// Send a request to an explicit method and path
    Request {
        /// GET, POST, PUT or DELETE
        method: String,

        /// Path such as /publishers/5/media, or a full URL
        path: String,

        /// key=value payload pairs
        pairs: Vec<String>,

        /// JSON output
        #[arg(long)]
        json: bool,

        /// Print X- response headers
        #[arg(long)]
        headers: bool,
    },

    /// Show the state of the stored token
    Token,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("DAISYCON_LOG_LEVEL")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_mode = matches!(
        cli.command,
        Commands::Call { json: true, .. } | Commands::Request { json: true, .. }
    );

    if let Err(e) = run(cli).await {
        daisycon::cli::output::print_error(&e, json_mode, std::io::stderr().is_terminal());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), daisycon::DaisyconError> {
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Auth { timeout_ms } => {
            let timeout = std::time::Duration::from_millis(timeout_ms);
            daisycon::cli::auth::run_auth(config, timeout).await
        }
        Commands::Call {
            name,
            args,
            json,
            headers,
        } => daisycon::cli::call::run_call(config, &name, &args, json, headers).await,
        Commands::Request {
            method,
            path,
            pairs,
            json,
            headers,
        } => {
            daisycon::cli::call::run_request(config, &method, &path, &pairs, json, headers).await
        }
        Commands::Token => daisycon::cli::auth::run_token_status(config),
    }
}
