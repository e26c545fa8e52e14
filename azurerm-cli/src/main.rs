mod config_file;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use log::debug;

use azurerm_core::provider::{ErrorKind, Provider};
use azurerm_core::resource::{Resource, ResourceAddress, State};
use azurerm_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use azurerm_provider::client::CloudEnvironment;
use azurerm_provider::resources::ResourceHandler;
use azurerm_provider::services::{id_kinds, parse_id_kind};
use azurerm_provider::{AzureProvider, ProviderConfig, handlers, validation_errors};

use config_file::ConfigFile;

#[derive(Parser)]
#[command(name = "azurerm")]
#[command(about = "Manage Azure resources declared in a JSON configuration", long_about = None)]
struct Cli {
    #[command(flatten)]
    credentials: CredentialArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the ARM_* environment variables
#[derive(Args, Default)]
struct CredentialArgs {
    /// Overrides ARM_SUBSCRIPTION_ID
    #[arg(long, global = true)]
    subscription_id: Option<String>,

    /// Overrides ARM_TENANT_ID
    #[arg(long, global = true)]
    tenant_id: Option<String>,

    /// Overrides ARM_CLIENT_ID
    #[arg(long, global = true)]
    client_id: Option<String>,

    /// Overrides ARM_CLIENT_SECRET
    #[arg(long, global = true)]
    client_secret: Option<String>,

    /// Overrides ARM_ACCESS_TOKEN
    #[arg(long, global = true)]
    access_token: Option<String>,

    /// Overrides ARM_ENVIRONMENT (public, china, usgovernment)
    #[arg(long, global = true)]
    environment: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration file without calling Azure
    Validate {
        /// Path to JSON configuration
        #[arg(default_value = "main.json")]
        file: PathBuf,
    },
    /// Create resources without an ID and update those with one
    Apply {
        /// Path to JSON configuration
        #[arg(default_value = "main.json")]
        file: PathBuf,
    },
    /// Read a resource by ARM ID
    Read {
        /// Resource type (e.g., azurerm_media_transform)
        resource_type: String,
        /// ARM resource ID
        id: String,
    },
    /// Delete a resource by ARM ID
    Delete {
        resource_type: String,
        id: String,
    },
    /// Show the schema of one resource type, or list all types
    Schema { resource_type: Option<String> },
    /// Parse an ARM resource ID as the given kind
    Id {
        /// ID kind (e.g., managed_cluster); `list` shows every kind
        kind: String,
        id: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { file } => run_validate(&file),
        Commands::Apply { file } => run_apply(&file, &cli.credentials).await,
        Commands::Read { resource_type, id } => {
            run_read(&resource_type, &id, &cli.credentials).await
        }
        Commands::Delete { resource_type, id } => {
            run_delete(&resource_type, &id, &cli.credentials).await
        }
        Commands::Schema { resource_type } => run_schema(resource_type.as_deref()),
        Commands::Id { kind, id } => run_id(&kind, id.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn provider_config(args: &CredentialArgs) -> Result<ProviderConfig, String> {
    let mut config = ProviderConfig::from_env().map_err(|e| e.to_string())?;
    if let Some(v) = &args.subscription_id {
        config.subscription_id = v.clone();
    }
    if let Some(v) = &args.tenant_id {
        config.tenant_id = Some(v.clone());
    }
    if let Some(v) = &args.client_id {
        config.client_id = Some(v.clone());
    }
    if let Some(v) = &args.client_secret {
        config.client_secret = Some(v.clone());
    }
    if let Some(v) = &args.access_token {
        config.access_token = Some(v.clone());
    }
    if let Some(v) = &args.environment {
        config.environment = v
            .parse::<CloudEnvironment>()
            .map_err(|e| format!("--environment: {}", e))?;
    }
    Ok(config)
}

fn get_provider(args: &CredentialArgs) -> Result<Box<dyn Provider>, String> {
    let config = provider_config(args)?;
    let provider = AzureProvider::new(&config).map_err(|e| e.to_string())?;
    println!(
        "{}",
        format!(
            "Using subscription {} ({:?})",
            provider.subscription_id(),
            config.environment
        )
        .cyan()
    );
    Ok(Box::new(provider))
}

/// Every configuration error, prefixed with the resource address
fn validate_resources(resources: &[Resource]) -> Result<(), String> {
    let mut all_errors = Vec::new();

    for resource in resources {
        match validation_errors(resource) {
            Ok(errors) => {
                for error in errors {
                    all_errors.push(format!("{}: {}", resource.address, error));
                }
            }
            Err(e) => all_errors.push(e.to_string()),
        }
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors.join("\n"))
    }
}

fn run_validate(file: &Path) -> Result<(), String> {
    let config = ConfigFile::load(file)?;
    let resources: Vec<Resource> = config.resources.iter().map(|r| r.to_resource()).collect();

    println!("{}", "Validating...".cyan());
    validate_resources(&resources)?;
    println!(
        "{}",
        format!("✓ {} resource(s) validated successfully.", resources.len())
            .green()
            .bold()
    );
    Ok(())
}

async fn run_apply(file: &Path, credentials: &CredentialArgs) -> Result<(), String> {
    let mut config = ConfigFile::load(file)?;
    let resources: Vec<Resource> = config.resources.iter().map(|r| r.to_resource()).collect();
    validate_resources(&resources)?;

    if resources.is_empty() {
        println!("{}", "No resources defined in configuration.".yellow());
        return Ok(());
    }

    let provider = get_provider(credentials)?;

    println!("{}", "Applying changes...".cyan().bold());
    println!();

    let mut success_count = 0;
    let mut failure_count = 0;

    for (entry, resource) in config.resources.iter_mut().zip(&resources) {
        let result = match entry.id.as_deref() {
            Some(id) => {
                let current = provider.read(&resource.address, id).await;
                match current {
                    Ok(state) if state.exists => provider
                        .update(&resource.address, id, &state, resource)
                        .await
                        .map(|s| ("~", s)),
                    Ok(_) => {
                        debug!("{} no longer exists - recreating", resource.address);
                        provider.create(resource).await.map(|s| ("+", s))
                    }
                    Err(e) => Err(e),
                }
            }
            None => provider.create(resource).await.map(|s| ("+", s)),
        };

        match result {
            Ok((symbol, state)) => {
                println!("  {} {} {}", "✓".green(), symbol.bold(), resource.address);
                if let Some(id) = state.identifier {
                    entry.id = Some(id);
                }
                success_count += 1;
            }
            Err(e) => {
                println!("  {} {}", "✗".red(), e);
                if e.kind == ErrorKind::Unsupported {
                    println!(
                        "    {}",
                        "replace the resource to apply this change".yellow()
                    );
                }
                failure_count += 1;
            }
        }
    }

    // Persist the IDs so the next apply updates instead of creating
    config.save(file)?;

    println!();
    if failure_count == 0 {
        println!(
            "{}",
            format!("Apply complete! {} resource(s) applied.", success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "Apply failed. {} succeeded, {} failed.",
            success_count, failure_count
        ))
    }
}

async fn run_read(
    resource_type: &str,
    id: &str,
    credentials: &CredentialArgs,
) -> Result<(), String> {
    let provider = get_provider(credentials)?;
    let address = ResourceAddress::new(resource_type, "imported");
    let state = provider
        .read(&address, id)
        .await
        .map_err(|e| e.to_string())?;

    if !state.exists {
        println!("{}", format!("{} was not found.", id).yellow());
        return Ok(());
    }
    print_state(&state);
    Ok(())
}

async fn run_delete(
    resource_type: &str,
    id: &str,
    credentials: &CredentialArgs,
) -> Result<(), String> {
    let provider = get_provider(credentials)?;
    let address = ResourceAddress::new(resource_type, "target");
    provider
        .delete(&address, id)
        .await
        .map_err(|e| e.to_string())?;
    println!("  {} {} {}", "✓".green(), "-".red().bold(), id);
    Ok(())
}

fn print_state(state: &State) {
    let attributes: serde_json::Map<String, serde_json::Value> = state
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect();
    let document = serde_json::json!({
        "type": state.address.resource_type,
        "id": state.identifier,
        "attributes": attributes,
    });
    match serde_json::to_string_pretty(&document) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("{} {}", "Error:".red(), e),
    }
}

// =============================================================================
// Schema and ID inspection
// =============================================================================

fn run_schema(resource_type: Option<&str>) -> Result<(), String> {
    let Some(resource_type) = resource_type else {
        for handler in handlers() {
            println!("{}", handler.type_name());
        }
        return Ok(());
    };

    let handler = handlers()
        .iter()
        .find(|h| h.type_name() == resource_type)
        .ok_or_else(|| format!("unknown resource type {:?}", resource_type))?;
    print!("{}", format_schema(&handler.schema()));
    Ok(())
}

fn format_schema(schema: &ResourceSchema) -> String {
    let mut out = format!("{}\n", schema.resource_type.cyan().bold());
    if let Some(description) = &schema.description {
        out.push_str(&format!("  {}\n", description.dimmed()));
    }
    for attr in schema.attributes.values() {
        format_attribute(attr, 1, &mut out);
    }
    out
}

fn format_attribute(attr: &AttributeSchema, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let mut flags = Vec::new();
    if attr.required {
        flags.push("required".to_string());
    }
    if attr.computed {
        flags.push("computed".to_string());
    }
    if attr.force_new {
        flags.push("force new".to_string());
    }
    if let Some(default) = &attr.default {
        flags.push(format!("default {}", default.to_json()));
    }

    let type_name = match &attr.attr_type {
        AttributeType::Block(block) => match block.max_items {
            Some(max) => format!("Block[{}..={}]", block.min_items, max),
            None => format!("Block[{}..]", block.min_items),
        },
        other => other.to_string(),
    };
    out.push_str(&format!("{}{}: {}", indent, attr.name.bold(), type_name));
    if !flags.is_empty() {
        out.push_str(&format!(" ({})", flags.join(", ")).dimmed().to_string());
    }
    out.push('\n');

    if let AttributeType::Block(block) = &attr.attr_type {
        for nested in block.attributes.values() {
            format_attribute(nested, depth + 1, out);
        }
    }
}

fn run_id(kind: &str, id: Option<&str>) -> Result<(), String> {
    if kind == "list" {
        for kind in id_kinds() {
            println!("{}", kind);
        }
        return Ok(());
    }

    let id = id.ok_or_else(|| "an ID to parse is required".to_string())?;
    let parsed = parse_id_kind(kind, id)
        .ok_or_else(|| {
            format!(
                "unknown ID kind {:?}, expected one of: {}",
                kind,
                id_kinds().collect::<Vec<_>>().join(", ")
            )
        })?
        .map_err(|e| e.to_string())?;

    println!("{}", parsed.fields);
    if parsed.id != id.trim_end_matches('/') {
        println!("{} {}", "canonical:".yellow(), parsed.id);
    }
    Ok(())
}
