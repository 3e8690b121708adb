use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use catalog_admin::app::App;
use catalog_admin::cli::{Cli, Commands, ConfigCommands};
use catalog_admin::core::{ApiError, CollectionApi, HttpApiClient, PageController, PaginatedTable, Resource};
use catalog_admin::core::record::display_value;
use catalog_admin::utils::logging::{self, LogTarget, TracingConfig};
use catalog_admin::utils::{parse_assignment, parse_record_id, truncate_string, AppConfig};

const MAX_CELL_WIDTH: usize = 40;

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so env-backed flags see it
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let target = if cli.command.is_none() { LogTarget::File } else { LogTarget::Stderr };
    logging::init(&TracingConfig { debug: cli.debug, target })?;

    let config_path = AppConfig::config_path(cli.config.as_deref())?;

    match cli.command {
        None => {
            // No command - run interactive TUI
            let config = load_config(&config_path, cli.api.as_deref(), cli.page_size)?;
            let mut app = App::from_config(&config)?;
            app.run()?;
        }
        Some(Commands::Resources) => {
            let config = load_config(&config_path, cli.api.as_deref(), cli.page_size)?;
            handle_resources(&config)?;
        }
        Some(Commands::List { resource, page, json }) => {
            let config = load_config(&config_path, cli.api.as_deref(), cli.page_size)?;
            handle_list(&config, &resource, page, json).await?;
        }
        Some(Commands::Create { resource, values }) => {
            let config = load_config(&config_path, cli.api.as_deref(), cli.page_size)?;
            handle_create(&config, &resource, &values).await?;
        }
        Some(Commands::Delete { resource, id }) => {
            let config = load_config(&config_path, cli.api.as_deref(), cli.page_size)?;
            handle_delete(&config, &resource, &id).await?;
        }
        Some(Commands::Config { command }) => {
            handle_config(command, &config_path, cli.api.as_deref(), cli.page_size)?;
        }
    }

    Ok(())
}

fn load_config(path: &Path, api: Option<&str>, page_size: Option<u32>) -> Result<AppConfig> {
    let mut config = AppConfig::load_from(path)?;
    config.apply_overrides(api, page_size)?;
    Ok(config)
}

fn client(config: &AppConfig) -> Result<Arc<HttpApiClient>> {
    Ok(Arc::new(HttpApiClient::new(config.to_client_settings()?)?))
}

fn spinner(message: String) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .context("failed to create progress style")?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    Ok(pb)
}

fn handle_resources(config: &AppConfig) -> Result<()> {
    let resources = config.resources()?;

    println!("Configured resources ({})\n", config.api.base_url);
    println!("{:<20} {:<20} {:<25} {}", "Name", "Title", "Endpoint", "Columns");
    println!("{}", "-".repeat(80));

    for resource in resources {
        println!(
            "{:<20} {:<20} {:<25} {}",
            resource.name,
            resource.title,
            resource.endpoint,
            resource.headers().join(", ")
        );
    }

    Ok(())
}

async fn handle_list(config: &AppConfig, name: &str, page: u32, json: bool) -> Result<()> {
    let resource = config.resource(name)?;
    let mut controller = PageController::new(client(config)?, resource);

    let pb = spinner(format!("Loading {} page {}...", name, page.max(1)))?;
    let job = controller.load(page);
    controller.drive(job).await;
    pb.finish_and_clear();

    let table = controller.table();
    if let Some(error) = table.last_error() {
        return Err(error.clone()).with_context(|| format!("Failed to load page {} of {}", page.max(1), name));
    }

    if json {
        let output = serde_json::to_string_pretty(table.records()).context("Failed to encode records")?;
        println!("{}", output);
    } else {
        print_table(controller.resource(), table);
    }

    Ok(())
}

fn print_table(resource: &Resource, table: &PaginatedTable) {
    let headers = resource.headers();
    let rows: Vec<Vec<String>> = table
        .rows(resource)
        .into_iter()
        .map(|row| row.iter().map(|c| truncate_string(c, MAX_CELL_WIDTH)).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{:<width$}", h, width = w))
        .collect();
    println!("{}", header_line.join("  ").bold().yellow());
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));

    if rows.is_empty() {
        println!("{}", "No records".dimmed());
    }
    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = w))
            .collect();
        println!("{}", cells.join("  "));
    }

    let nav = table.nav();
    let mut footer = table.page_label();
    if nav.prev_enabled {
        footer.push_str(&format!(" | --page {} for previous", table.page() - 1));
    }
    if nav.next_enabled {
        footer.push_str(&format!(" | --page {} for next", table.page() + 1));
    }
    println!("\n{}", footer.dimmed());
}

async fn handle_create(config: &AppConfig, name: &str, values: &[String]) -> Result<()> {
    let resource = config.resource(name)?;
    let pairs = values
        .iter()
        .map(String::as_str)
        .map(parse_assignment)
        .collect::<Result<Vec<_>, String>>()
        .map_err(anyhow::Error::msg)?;

    let payload = match resource.form.validate_pairs(&pairs) {
        Ok(payload) => payload,
        Err(errors) => {
            println!("{} Invalid {}:", "✗".red(), resource.title);
            for error in errors.values() {
                println!("  - {}", error);
            }
            bail!("{} field(s) failed validation", errors.len());
        }
    };

    let api = client(config)?;
    let pb = spinner(format!("Creating {}...", resource.title))?;
    let result = api.create(&resource.endpoint, &payload).await;
    pb.finish_and_clear();

    match result {
        Ok(record) => {
            println!("{} Created {} {}", "✓".green(), resource.title, display_value(record.id()));
            Ok(())
        }
        Err(ApiError::Validation { message, fields, .. }) => {
            println!("{} Server rejected {}: {}", "✗".red(), resource.title, message);
            for (field, messages) in &fields {
                println!("  - {}: {}", field, messages.join("; "));
            }
            bail!("create rejected by server");
        }
        Err(error) => Err(error).with_context(|| format!("Failed to create {}", resource.title)),
    }
}

async fn handle_delete(config: &AppConfig, name: &str, raw_id: &str) -> Result<()> {
    let resource = config.resource(name)?;
    let id = parse_record_id(raw_id);

    let api = client(config)?;
    let pb = spinner(format!("Deleting {} {}...", resource.title, raw_id))?;
    let result = api.delete(&resource.endpoint, &id).await;
    pb.finish_and_clear();

    result.with_context(|| format!("Failed to delete {} {}", resource.title, raw_id))?;
    println!("{} Deleted {} {}", "✓".green(), resource.title, display_value(&id));
    Ok(())
}

fn handle_config(command: ConfigCommands, path: &Path, api: Option<&str>, page_size: Option<u32>) -> Result<()> {
    match command {
        ConfigCommands::Path => {
            println!("{}", path.display());
        }
        ConfigCommands::Show => {
            let config = load_config(path, api, page_size)?;
            let source = if path.exists() { "file" } else { "defaults" };
            println!("# {} ({})", path.display(), source);
            println!("{}", toml::to_string_pretty(&config).context("Failed to serialize config")?);
        }
        ConfigCommands::Init => {
            AppConfig::init(path)?;
            println!("{} Wrote default configuration to {}", "✓".green(), path.display());
        }
    }

    Ok(())
}
