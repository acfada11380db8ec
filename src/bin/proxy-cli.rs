use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use gatekeeper_proxy::config::{load_config, ProxyConfig};
use gatekeeper_proxy::identity::IdentityResolver;
use gatekeeper_proxy::routing::RouteRegistry;

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Inspection CLI for the gatekeeper proxy", long_about = None)]
struct Cli {
    /// Proxy configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the route table the proxy would serve
    Routes,
    /// Resolve a credential to its user id and sender id via the account service
    Whoami {
        /// Authorization header value, e.g. "Bearer eyJ..."
        #[arg(short, long)]
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    match cli.command {
        Commands::Routes => {
            let registry = RouteRegistry::from_config(&config);
            let routes: Vec<Value> = registry
                .routes()
                .into_iter()
                .map(|route| {
                    json!({
                        "path": route.url_path,
                        "upstream": format!(
                            "{}{}",
                            config.upstream.base_url.trim_end_matches('/'),
                            route.upstream_path
                        ),
                        "authenticator": format!("{:?}", route.authenticator),
                        "validators": route
                            .validators
                            .iter()
                            .map(|v| format!("{:?}", v))
                            .collect::<Vec<_>>(),
                    })
                })
                .collect();
            print_json(&Value::Array(routes))?;
        }
        Commands::Whoami { token } => {
            let resolver = IdentityResolver::new(&config.identity)?;
            match resolver.resolve(&token).await {
                Ok(identity) => print_json(&json!({
                    "userId": identity.user_id,
                    "senderId": identity.sender_id,
                }))?,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
