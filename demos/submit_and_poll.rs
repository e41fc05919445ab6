//! Submit an API-format workflow and poll until its outputs are uploaded.
//!
//! Requires a running worker. The token is optional.
//!
//! ```sh
//! RUST_LOG=comfyui_api_rs=debug \
//!   cargo run --example submit_and_poll -- https://my-worker.example.com/api workflow_api.json [token]
//! ```

use comfyui_api_rs::{start_with_request_id, ComfyApiClient, StartWorkflowRequest, StatusType};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: submit_and_poll <base-url> <workflow.json> [token]";

/// `(base_url, workflow_path, token)` from the command line.
fn parse_args<I>(mut args: I) -> Result<(String, String, Option<String>), String>
where
    I: Iterator<Item = String>,
{
    match (args.next(), args.next()) {
        (Some(base_url), Some(workflow_path)) => Ok((base_url, workflow_path, args.next())),
        _ => Err(USAGE.to_string()),
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (base_url, workflow_path, token) = parse_args(std::env::args().skip(1))?;

    let mut client = ComfyApiClient::new(base_url);
    if let Some(token) = token {
        client = client.with_api_token(token);
    }

    let workflow = std::fs::read_to_string(&workflow_path)?;
    let req = StartWorkflowRequest::from_json(workflow, [start_with_request_id("demo-run")])?;

    let mut status = client.start_workflow(&req).await?;
    println!("Submitted job {} ({})", status.id, status.status);

    // Give up after ~5 minutes.
    for _ in 0..150 {
        if status.status != StatusType::Pending {
            break;
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
        status = client.workflow_status(&status.id).await?;
    }

    match status.status {
        StatusType::Success => {
            println!("Generated {} output(s)", status.output.len());
            for item in &status.output {
                match item.preferred_url() {
                    Some(url) => println!("  {}", url),
                    None => println!("  {} (no URL)", item.local_path.as_deref().unwrap_or("?")),
                }
            }
        }
        StatusType::Pending => eprintln!("Still pending, giving up"),
        StatusType::Other(other) => eprintln!("Job ended with status {}: {}", other, status.message),
    }

    Ok(())
}
