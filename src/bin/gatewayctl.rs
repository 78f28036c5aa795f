use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use model_gateway::directory::DirectoryClient;
use model_gateway::registry::CapabilityDecl;

#[derive(Parser)]
#[command(name = "gatewayctl")]
#[command(about = "Management CLI for the model gateway and its directory", long_about = None)]
struct Cli {
    /// Directory service base URL.
    #[arg(long, default_value = "http://localhost:3040")]
    registry: String,

    /// Gateway base URL.
    #[arg(long, default_value = "http://localhost:3030")]
    gateway: String,

    /// Admin API key for gateway admin commands.
    #[arg(short, long, default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every registered backend
    Services,
    /// List capabilities of a type, as known to the directory
    Types { kind: String },
    /// List healthy backends offering a capability
    Backends { model: String },
    /// Register a backend: gatewayctl register http://b1:8080 -m echo=chat
    Register {
        url: String,
        #[arg(short, long = "model", value_parser = parse_capability)]
        models: Vec<CapabilityDecl>,
    },
    /// Remove a backend
    Unregister { url: String },
    /// List capabilities available through the gateway
    Models {
        #[arg(long = "type")]
        kind: Option<String>,
    },
    /// Gateway status (admin)
    Status,
    /// Backends cooling down after failures (admin)
    Failed,
    /// Cache statistics (admin)
    Cache,
    /// Drop every cached directory lookup (admin)
    ClearCache,
    /// Forget load balancer counters and failures (admin)
    ResetBalancer,
}

fn parse_capability(raw: &str) -> Result<CapabilityDecl, String> {
    match raw.split_once('=') {
        Some((name, kind)) if !name.is_empty() && !kind.is_empty() => {
            Ok(CapabilityDecl::new(name, kind))
        }
        _ => Err(format!("expected NAME=TYPE, got '{}'", raw)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let directory = DirectoryClient::new(&cli.registry, Duration::from_secs(10))?;
    let client = reqwest::Client::new();
    let gateway = cli.gateway.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    if !cli.key.is_empty() {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
        );
    }

    match cli.command {
        Commands::Services => print_json(&directory.services().await?)?,
        Commands::Types { kind } => print_json(&directory.models_by_type(&kind).await?)?,
        Commands::Backends { model } => print_json(&directory.backends_for_model(&model).await?)?,
        Commands::Register { url, models } => {
            print_json(&directory.register(&url, &models).await?)?
        }
        Commands::Unregister { url } => print_json(&directory.unregister(&url).await?)?,
        Commands::Models { kind } => {
            let path = match kind {
                Some(kind) => format!("{}/api/models/types/{}", gateway, kind),
                None => format!("{}/api/models", gateway),
            };
            print_response(client.get(path).send().await?).await?;
        }
        Commands::Status => {
            let res = client
                .get(format!("{}/admin/status", gateway))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Failed => {
            let res = client
                .get(format!("{}/admin/failed", gateway))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Cache => {
            let res = client
                .get(format!("{}/admin/cache", gateway))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::ClearCache => {
            let res = client
                .delete(format!("{}/admin/cache", gateway))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::ResetBalancer => {
            let res = client
                .post(format!("{}/admin/balancer/reset", gateway))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("{}", text);
        }
        std::process::exit(1);
    }

    let body: Value = res.json().await?;
    print_json(&body)
}
