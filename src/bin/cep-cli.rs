use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "cep-cli")]
#[command(about = "Query a running cep-race service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a postal code
    Lookup { cep: String },
    /// Show service version, providers and race timeout
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = url::Url::parse(&cli.url)?;

    let target = match &cli.command {
        Commands::Lookup { cep } => {
            let mut target = base.clone();
            if let Ok(mut segments) = target.path_segments_mut() {
                segments.pop_if_empty().extend(["cep", cep.as_str()]);
            }
            target
        }
        Commands::Status => base.join("health")?,
    };

    let res = client.get(target).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
    }
    if text.is_empty() {
        return Ok(());
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
