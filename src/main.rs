//! Berth - ready-to-run compose definitions for common services
//!
//! This is the main CLI entry point for Berth.

use anyhow::{Context, Result};
use berth::catalog::ServiceCatalog;
use berth::compose::{find_compose_file, ComposeDefinition, Credentials};
use berth::config::{BackendKind, Settings};
use berth::runtime::Deployer;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Berth - compose definitions for common services
#[derive(Parser)]
#[command(name = "berth")]
#[command(author = "Evoker Industries")]
#[command(version)]
#[command(about = "Ready-to-run compose definitions for common services", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported service types
    Catalog,

    /// Print or write the compose definition of a service
    Generate {
        /// Service type (e.g. redis, cache, grafana, dashboard)
        service_type: String,
        /// Logical service name
        name: String,
        #[command(flatten)]
        credentials: CredentialArgs,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value = "yaml")]
        format: OutputFormat,
    },

    /// Deploy a service through the configured backend
    Deploy {
        /// Service type
        service_type: String,
        /// Logical service name
        name: String,
        /// Deployment id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        credentials: CredentialArgs,
        /// Backend override
        #[arg(short, long)]
        backend: Option<BackendKind>,
    },

    /// Destroy a deployed service
    Destroy {
        /// Service type
        service_type: String,
        /// Deployment id
        id: String,
        /// Backend override
        #[arg(short, long)]
        backend: Option<BackendKind>,
    },

    /// Validate a compose file
    Validate {
        /// Compose file (searched in the current directory when omitted)
        file: Option<PathBuf>,
    },
}

#[derive(Args)]
struct CredentialArgs {
    /// User name
    #[arg(short, long)]
    username: Option<String>,
    /// Password
    #[arg(short, long)]
    password: Option<String>,
    /// Database name
    #[arg(long)]
    database: Option<String>,
}

impl From<CredentialArgs> for Credentials {
    fn from(args: CredentialArgs) -> Self {
        Credentials {
            username: args.username,
            password: args.password,
            database: args.database,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    let catalog = ServiceCatalog::builtin();

    match cli.command {
        Commands::Catalog => {
            println!("{:<12} {:<14} {:<28} {:<7}", "TYPE", "ALIASES", "IMAGE", "PORT");
            for spec in catalog.list() {
                println!(
                    "{:<12} {:<14} {:<28} {:<7}",
                    spec.id,
                    spec.aliases.join(","),
                    spec.image,
                    spec.port
                );
            }
        }

        Commands::Generate {
            service_type,
            name,
            credentials,
            output,
            format,
        } => {
            let definition = catalog.build(&service_type, &name, &credentials.into())?;
            let rendered = match format {
                OutputFormat::Yaml => definition.to_yaml()?,
                OutputFormat::Json => definition.to_json()?,
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!("Wrote {} definition to {}", service_type, path.display());
                }
                None => print!("{}", rendered),
            }
        }

        Commands::Deploy {
            service_type,
            name,
            id,
            credentials,
            backend,
        } => {
            if let Some(kind) = backend {
                settings.backend = kind;
            }

            let spec = catalog.resolve(&service_type)?;
            let definition = catalog.build(&spec.id, &name, &credentials.into())?;
            let service_id = id.unwrap_or_else(|| {
                format!("berth-{}", &uuid::Uuid::new_v4().simple().to_string()[..8])
            });

            let deployer = Deployer::from_settings(&settings)?;
            let result = deployer.deploy(&service_id, &spec.id, &definition).await?;

            let mut keys: Vec<_> = result.keys().collect();
            keys.sort();
            for key in keys {
                println!("{}: {}", key, result[key]);
            }
        }

        Commands::Destroy {
            service_type,
            id,
            backend,
        } => {
            if let Some(kind) = backend {
                settings.backend = kind;
            }

            let spec = catalog.resolve(&service_type)?;
            let deployer = Deployer::from_settings(&settings)?;
            deployer.destroy(&id, &spec.id).await?;
            println!("{}", id);
        }

        Commands::Validate { file } => {
            let working_dir = std::env::current_dir()?;
            let compose_file = file
                .or_else(|| find_compose_file(&working_dir))
                .context("no compose file found in the current directory")?;

            let definition = ComposeDefinition::from_file(&compose_file)?;
            definition.validate()?;
            println!(
                "{} is valid ({} services)",
                compose_file.display(),
                definition.len()
            );
        }
    }

    Ok(())
}
