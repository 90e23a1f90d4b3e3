//! `schema` command: list a table's columns

use anyhow::{Context, Result};
use colored::*;

use super::SchemaArgs;
use crate::api::{BulkUpdateClient, BulkUpdateService};
use crate::cli::output::print_columns;
use crate::config::Config;

pub async fn handle_schema_command(args: SchemaArgs, config: &Config) -> Result<()> {
    let table = args.table.unwrap_or(config.default_table);
    let client = BulkUpdateClient::from_config(config)?;

    let columns = client
        .table_schema(table)
        .await
        .with_context(|| format!("Failed to fetch schema for {}", table))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&columns)?);
        return Ok(());
    }

    println!(
        "{} ({}) - {} columns",
        table.label().bold(),
        table.as_str().dimmed(),
        columns.len()
    );
    print_columns(&columns, columns.first().map(String::as_str));
    Ok(())
}
