use anyhow::Result;
use clap::Parser;
use restcall::commands::{self, config::Config, config::Settings};
use std::process::ExitCode;

/// restcall - basic-authenticated JSON calls with outcome classification
///
/// Sends one GET or POST and tells whether a failed call definitely did not
/// take effect or may have.
///
/// Exit status:
///   0  the response status was expected
///   2  confirmed failure: nothing happened on the remote side
///   3  unknown outcome: the operation may have been applied
///   1  invalid arguments or configuration
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL endpoints are resolved against
    #[arg(long, env = "RESTCALL_BASE_URL", value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Basic auth user
    #[arg(long, env = "RESTCALL_USER", default_value = "", global = true)]
    pub user: String,

    /// Basic auth password
    #[arg(
        long,
        env = "RESTCALL_PASSWORD",
        default_value = "",
        hide_env_values = true,
        hide_default_value = true,
        global = true
    )]
    pub password: String,

    /// Request timeout in seconds (default 10)
    #[arg(long, env = "RESTCALL_TIMEOUT", value_name = "SECS", global = true)]
    pub timeout: Option<u64>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Send a GET request, parameters go in the query string
    Get(GetArgs),

    /// Send a POST request with a JSON body
    Post(PostArgs),
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    /// Endpoint path, resolved against the base URL
    #[arg(value_name = "ENDPOINT")]
    pub endpoint: String,

    /// Query parameter, may be repeated
    #[arg(short = 'q', long = "query", value_name = "KEY=VALUE", value_parser = parse_query_pair)]
    pub query: Vec<(String, String)>,

    /// Status code counted as success, may be repeated (default 200)
    #[arg(short = 'e', long = "expect", value_name = "CODE")]
    pub expect: Vec<u16>,
}

#[derive(clap::Args, Debug)]
pub struct PostArgs {
    /// Endpoint path, resolved against the base URL
    #[arg(value_name = "ENDPOINT")]
    pub endpoint: String,

    /// JSON request body
    #[arg(short = 'b', long = "body", value_name = "JSON", default_value = "{}")]
    pub body: String,

    /// Status code counted as success, may be repeated (default 200)
    #[arg(short = 'e', long = "expect", value_name = "CODE")]
    pub expect: Vec<u16>,
}

fn parse_query_pair(s: &str) -> Result<(String, String), String> {
    commands::parse_query_pair(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config = Config::new(Settings {
        base_url: cli.base_url,
        user: cli.user,
        password: cli.password,
        timeout_secs: cli.timeout,
    })?;

    let outcome = match cli.command {
        Commands::Get(args) => {
            commands::get(&config, &args.endpoint, &args.query, &args.expect).await
        }
        Commands::Post(args) => {
            let body = commands::parse_body(&args.body)?;
            commands::post(&config, &args.endpoint, &body, &args.expect).await
        }
    };

    let code = commands::report(
        &outcome,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    )?;
    Ok(ExitCode::from(code))
}
