pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use client::ApiClient;

#[derive(Parser)]
#[command(name = "birds")]
#[command(about = "Backyard Birds CLI - record and browse bird observations")]
#[command(version)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "BIRDS_API_URL",
        default_value = "http://localhost:3000",
        help = "Base URL of the Backyard Birds API"
    )]
    pub url: String,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Species taxonomy management")]
    Taxonomy {
        #[command(subcommand)]
        cmd: commands::taxonomy::TaxonomyCommands,
    },

    #[command(about = "Observation location management")]
    Location {
        #[command(subcommand)]
        cmd: commands::location::LocationCommands,
    },

    #[command(about = "Record and list bird observations")]
    Observation {
        #[command(subcommand)]
        cmd: commands::observation::ObservationCommands,
    },

    #[command(about = "Check API and storage health")]
    Health,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = ApiClient::new(&cli.url)?;

    match cli.command {
        Commands::Taxonomy { cmd } => commands::taxonomy::handle(cmd, &client, output_format).await,
        Commands::Location { cmd } => commands::location::handle(cmd, &client, output_format).await,
        Commands::Observation { cmd } => {
            commands::observation::handle(cmd, &client, output_format).await
        }
        Commands::Health => {
            let data = client.get("/health").await?;
            utils::output_record(output_format, &data, |d| {
                format!("Storage: {}", d["storage"].as_str().unwrap_or("unknown"))
            })
        }
    }
}
