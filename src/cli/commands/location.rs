use clap::Subcommand;
use serde_json::Value;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_record, output_records, text};
use crate::cli::OutputFormat;
use crate::models::NewLocation;

#[derive(Subcommand)]
pub enum LocationCommands {
    #[command(about = "Add a location, or update one with --id")]
    Add {
        #[arg(help = "Unique location name")]
        name: String,
        #[arg(long, allow_hyphen_values = true, help = "Latitude in degrees")]
        latitude: f64,
        #[arg(long, allow_hyphen_values = true, help = "Longitude in degrees")]
        longitude: f64,
        #[arg(long, help = "Free-form description")]
        description: Option<String>,
        #[arg(long, help = "Mark the location inactive")]
        inactive: bool,
        #[arg(long, help = "Existing location id to update")]
        id: Option<i64>,
    },

    #[command(about = "Show a location by id")]
    Get {
        #[arg(help = "Location id")]
        id: i64,
    },

    #[command(about = "List all locations")]
    List,
}

pub async fn handle(
    cmd: LocationCommands,
    client: &ApiClient,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        LocationCommands::Add {
            name,
            latitude,
            longitude,
            description,
            inactive,
            id,
        } => {
            let body = NewLocation {
                id,
                name: Some(name),
                latitude: Some(latitude),
                longitude: Some(longitude),
                description,
                is_active: Some(!inactive),
            };
            let data = client.post("/api/locations", &body).await?;
            output_record(output_format, &data, |d| format!("✓ Saved {}", summary(d)))
        }
        LocationCommands::Get { id } => {
            let data = client.get_item("/api/locations", &id.to_string()).await?;
            output_record(output_format, &data, summary)
        }
        LocationCommands::List => {
            let data = client.get("/api/locations").await?;
            output_records(output_format, &data, "locations", summary)
        }
    }
}

fn summary(record: &Value) -> String {
    let active = if record["isActive"].as_bool().unwrap_or(true) {
        ""
    } else {
        " [inactive]"
    };
    format!(
        "#{} {} ({}, {}){}",
        record["id"],
        text(record, "name"),
        record["latitude"],
        record["longitude"],
        active
    )
}
