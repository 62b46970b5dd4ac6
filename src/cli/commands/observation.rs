use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde_json::Value;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_record, output_records, text};
use crate::cli::OutputFormat;
use crate::models::NewObservation;

#[derive(Subcommand)]
pub enum ObservationCommands {
    #[command(about = "Record an observation")]
    Record {
        #[arg(help = "Species code of the bird seen")]
        species_code: String,
        #[arg(help = "Location id where it was seen")]
        location_id: i64,
        #[arg(long, default_value_t = 1, help = "Number of individuals")]
        count: i32,
        #[arg(long, help = "Observation time, RFC 3339 (defaults to now)")]
        at: Option<DateTime<Utc>>,
        #[arg(long, help = "Observation period in minutes")]
        duration: Option<i32>,
        #[arg(long, help = "Sex (male, female, unknown)")]
        sex: Option<String>,
        #[arg(long, help = "Age (adult, juvenile, unknown)")]
        age: Option<String>,
        #[arg(long, help = "Observed behavior")]
        behavior: Option<String>,
        #[arg(long, help = "All species seen were recorded")]
        complete: bool,
        #[arg(long, help = "Additional notes")]
        notes: Option<String>,
        #[arg(long, help = "Weather record id")]
        weather_id: Option<i64>,
    },

    #[command(about = "List all observations")]
    List,
}

pub async fn handle(
    cmd: ObservationCommands,
    client: &ApiClient,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        ObservationCommands::Record {
            species_code,
            location_id,
            count,
            at,
            duration,
            sex,
            age,
            behavior,
            complete,
            notes,
            weather_id,
        } => {
            let body = NewObservation {
                species_code: Some(species_code),
                location_id: Some(location_id),
                weather_id,
                observation_date_time: Some(at.unwrap_or_else(Utc::now)),
                count: Some(count),
                duration_minutes: duration,
                sex,
                age,
                behavior,
                is_complete_checklist: Some(complete),
                notes,
            };
            let data = client.post("/api/observations", &body).await?;
            output_record(output_format, &data, |d| format!("✓ Recorded {}", summary(d)))
        }
        ObservationCommands::List => {
            let data = client.get("/api/observations").await?;
            output_records(output_format, &data, "observations", summary)
        }
    }
}

fn summary(record: &Value) -> String {
    format!(
        "#{} {} x{} at location {} on {}",
        record["id"],
        text(record, "speciesCode"),
        record["count"],
        record["locationId"],
        text(record, "observationDateTime"),
    )
}
