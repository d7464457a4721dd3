// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! redactflow - CLI for the PII detection and anonymization pipeline daemon

mod client;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use client::{ClientError, DaemonClient, EnqueueFileProcessingRequest};
use futures::StreamExt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "redactflow", version, about = "Client for the redactflowd pipeline daemon")]
struct Cli {
    /// Base URL of a running redactflowd (default: http://127.0.0.1:8080, or $REDACTFLOW_URL)
    #[arg(long, global = true)]
    daemon_url: Option<String>,

    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enqueue a file for PII detection and anonymization
    Enqueue {
        /// Path to the file on disk, as the daemon's worker will read it
        file_path: PathBuf,
        /// User id to attribute the job to
        #[arg(long)]
        user_id: String,
        /// Project id; defaults to the daemon's sentinel "unassigned" project
        #[arg(long)]
        project_id: Option<String>,
        /// MIME type of the file
        #[arg(long)]
        mime_type: String,
        /// Policy id to apply; defaults to the org-wide default policy
        #[arg(long)]
        policy_id: Option<String>,
    },
    /// Show a job's current status
    Job { job_id: String },
    /// Show a dataset's current status
    Dataset { dataset_id: String },
    /// Cancel a queued or running job
    Cancel { job_id: String },
    /// Retry a failed job
    Retry { job_id: String },
    /// Stream live job/dataset/notification events as they happen
    Watch,
}

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("could not read metadata for {}: {source}", path.display())]
    FileMetadata { path: PathBuf, source: std::io::Error },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let daemon_url = cli.daemon_url.or_else(|| std::env::var("REDACTFLOW_URL").ok()).unwrap_or_else(|| "http://127.0.0.1:8080".to_string());
    let client = DaemonClient::new(daemon_url);

    if let Err(err) = run(&client, cli.command, cli.output).await {
        eprintln!("redactflow: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(client: &DaemonClient, command: Commands, output: OutputFormat) -> Result<(), MainError> {
    match command {
        Commands::Enqueue { file_path, user_id, project_id, mime_type, policy_id } => {
            let metadata = std::fs::metadata(&file_path).map_err(|source| MainError::FileMetadata { path: file_path.clone(), source })?;
            let file_name = file_path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| file_path.to_string_lossy().into_owned());
            let req = EnqueueFileProcessingRequest {
                job_id: None,
                user_id,
                project_id,
                dataset_id: uuid::Uuid::new_v4().to_string(),
                file_path: file_path.to_string_lossy().into_owned(),
                file_name,
                file_size: metadata.len(),
                mime_type,
                policy_id,
            };
            let resp = client.enqueue_file_processing(&req).await?;
            print_value(output, &resp, |r| format!("job {} queued for dataset {}", r.job_id, r.dataset_id));
        }
        Commands::Job { job_id } => {
            let job = client.get_job(&job_id).await?;
            print_value(output, &job, |j| format!("{} [{}] {}% (attempt {})", j.job_id, j.status, j.progress, j.attempt));
        }
        Commands::Dataset { dataset_id } => {
            let dataset = client.get_dataset(&dataset_id).await?;
            print_value(output, &dataset, |d| format!("{} [{}] {} findings", d.dataset_id, d.status, d.findings_count));
        }
        Commands::Cancel { job_id } => {
            client.cancel_job(&job_id).await?;
            println!("job {job_id} cancellation requested");
        }
        Commands::Retry { job_id } => {
            let resp = client.retry_job(&job_id).await?;
            println!("job {job_id} retried as {}", resp.job_id);
        }
        Commands::Watch => watch(client).await?,
    }
    Ok(())
}

fn print_value<T: serde::Serialize>(output: OutputFormat, value: &T, text: impl FnOnce(&T) -> String) {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())),
        OutputFormat::Text => println!("{}", text(value)),
    }
}

async fn watch(client: &DaemonClient) -> Result<(), MainError> {
    let stream = client.watch_events().await?;
    futures::pin_mut!(stream);
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(data) => println!("{data}"),
            Err(err) => eprintln!("redactflow: {err}"),
        }
    }
    Ok(())
}
