use serde_json::Value;

use crate::cli::OutputFormat;

/// Print a single record: raw JSON, or a one-line summary
pub fn output_record(
    output_format: OutputFormat,
    data: &Value,
    summary: impl Fn(&Value) -> String,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text => println!("{}", summary(data)),
    }
    Ok(())
}

/// Print a collection, one summary line per record
pub fn output_records(
    output_format: OutputFormat,
    data: &Value,
    collection_name: &str,
    summary: impl Fn(&Value) -> String,
) -> anyhow::Result<()> {
    let records = data.as_array().map(Vec::as_slice).unwrap_or_default();

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text if records.is_empty() => println!("No {} found", collection_name),
        OutputFormat::Text => {
            for record in records {
                println!("{}", summary(record));
            }
            println!("{} {}", records.len(), collection_name);
        }
    }
    Ok(())
}

/// Read a string field for display, falling back to "-"
pub fn text<'a>(record: &'a Value, field: &str) -> &'a str {
    record[field].as_str().unwrap_or("-")
}
