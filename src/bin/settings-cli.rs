use std::collections::HashMap;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "settings-cli")]
#[command(about = "Management CLI for the settings service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Client token (KIRO_CLIENT_TOKEN of the running service).
    #[arg(short, long, env = "KIRO_CLIENT_TOKEN", default_value = "")]
    token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the effective settings
    Get,
    /// Change settings, e.g. `set LOG_LEVEL=debug STEALTH_MODE=false`
    Set {
        #[arg(required = true)]
        pairs: Vec<String>,
    },
    /// Check service status
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.token))?,
    );
    let settings_url = format!("{}/api/settings", cli.url);

    match cli.command {
        Commands::Get => {
            let res = client.get(&settings_url)
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Set { pairs } => {
            let updates = parse_pairs(&pairs)?;

            // The service treats omitted keys as cleared, so start from the current values.
            let res = client.get(&settings_url)
                .headers(headers.clone())
                .send()
                .await?;
            if !res.status().is_success() {
                return print_response(res).await;
            }
            let current: HashMap<String, String> = res.json().await?;
            let body = merge_for_save(current, updates);

            let res = client.post(&settings_url)
                .headers(headers)
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn parse_pairs(pairs: &[String]) -> Result<HashMap<String, String>, String> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(format!("expected KEY=VALUE, got `{}`", pair)),
        })
        .collect()
}

/// Overlay `updates` on the fetched settings. Masked values that are not
/// being changed are listed in `_keep_existing` so the service keeps them.
fn merge_for_save(
    mut current: HashMap<String, String>,
    updates: HashMap<String, String>,
) -> HashMap<String, String> {
    let kept: Vec<String> = ["KIRO_AUTH_TOKEN", "KIRO_CLIENT_TOKEN"]
        .iter()
        .filter(|key| !updates.contains_key(**key))
        .map(|key| key.to_string())
        .collect();
    for key in &kept {
        current.remove(key);
    }
    current.extend(updates);
    if !kept.is_empty() {
        current.insert("_keep_existing".to_string(), kept.join(","));
    }
    current
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: settings API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
