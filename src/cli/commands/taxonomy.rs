use clap::Subcommand;
use serde_json::Value;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_record, output_records, text};
use crate::cli::OutputFormat;
use crate::models::NewTaxonomy;

#[derive(Subcommand)]
pub enum TaxonomyCommands {
    #[command(about = "Add or replace a species")]
    Add {
        #[arg(help = "Species code (e.g. NORCAD)")]
        species_code: String,
        #[arg(long, help = "Common name")]
        common_name: String,
        #[arg(long, help = "Scientific name")]
        scientific_name: String,
        #[arg(long, default_value = "species", help = "Taxonomic category")]
        category: String,
        #[arg(long, help = "Taxonomic family")]
        family: String,
        #[arg(long, help = "Species group (e.g. Cardinals)")]
        group: Option<String>,
    },

    #[command(about = "Show a species by code")]
    Get {
        #[arg(help = "Species code")]
        species_code: String,
    },

    #[command(about = "List all species")]
    List,
}

pub async fn handle(
    cmd: TaxonomyCommands,
    client: &ApiClient,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        TaxonomyCommands::Add {
            species_code,
            common_name,
            scientific_name,
            category,
            family,
            group,
        } => {
            let body = NewTaxonomy {
                species_code: Some(species_code),
                common_name: Some(common_name),
                scientific_name: Some(scientific_name),
                category: Some(category),
                family: Some(family),
                species_group: group,
            };
            let data = client.post("/api/taxonomy", &body).await?;
            output_record(output_format, &data, |d| format!("✓ Saved {}", summary(d)))
        }
        TaxonomyCommands::Get { species_code } => {
            let data = client.get_item("/api/taxonomy", &species_code).await?;
            output_record(output_format, &data, summary)
        }
        TaxonomyCommands::List => {
            let data = client.get("/api/taxonomy").await?;
            output_records(output_format, &data, "species", summary)
        }
    }
}

fn summary(record: &Value) -> String {
    format!(
        "{:<8} {} ({}) - {}",
        text(record, "speciesCode"),
        text(record, "commonName"),
        text(record, "scientificName"),
        text(record, "family"),
    )
}
