mod cli;
mod telemetry;

use crate::cli::{Command, StorageBackendArg, CLI};
use clap::Parser;
use eanvault_core::{Mask, Registry};
use eanvault_generator::EanGenerator;
use eanvault_issuer::{ImportMode, IssuerError, IssuerService};
use eanvault_sheet::{read_codes, write_codes};
use eanvault_storage::{FileRegistry, InMemoryRegistry, MySqlRegistry};
use tracing::{info, warn};

type BoxError = Box<dyn std::error::Error>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = CLI::parse();
    telemetry::init(config.log_format);

    info!(
        storage_backend = %config.storage,
        data_file = %config.data_file.display(),
        "starting eanvault"
    );

    match config.storage {
        StorageBackendArg::File => {
            run(config.command, FileRegistry::new(config.data_file)).await?;
        }
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .ok_or("mysql dsn is required when storage backend is mysql")?;
            let registry = MySqlRegistry::connect(&mysql_dsn).await?;
            registry.ensure_schema().await?;
            run(config.command, registry).await?;
        }
        StorageBackendArg::InMemory => {
            run(config.command, InMemoryRegistry::new()).await?;
        }
    }

    Ok(())
}

async fn run<R: Registry>(command: Command, registry: R) -> Result<(), BoxError> {
    let service = IssuerService::load(registry, EanGenerator::default()).await?;

    match command {
        Command::Generate { mask, count, out } => {
            let mask = Mask::new(&mask)?;
            let (codes, failure) = match service.generate(&mask, count).await {
                Ok(codes) => (codes, None),
                // Still hand the codes out; they are reserved but not stored.
                Err(IssuerError::Unpersisted { batch, source }) => (
                    batch.clone(),
                    Some(IssuerError::Unpersisted { batch, source }),
                ),
                Err(err) => return Err(err.into()),
            };

            for code in &codes {
                println!("{code}");
            }
            if let Some(out) = out {
                write_codes(&out, &codes)?;
                info!(path = %out.display(), count = codes.len(), "wrote generated codes");
            }
            if let Some(err) = failure {
                return Err(err.into());
            }
        }
        Command::List => {
            for code in service.used_codes().await.iter() {
                println!("{code}");
            }
        }
        Command::Export { out } => {
            let codes = service.used_codes().await;
            write_codes(&out, codes.as_slice())?;
            println!("exported {} codes to {}", codes.len(), out.display());
        }
        Command::Import { file, replace } => {
            let report = read_codes(&file)?;
            for row in &report.rejected {
                warn!(row = row.row, value = %row.value, reason = %row.reason, "rejected row");
            }

            let mode = if replace {
                ImportMode::Replace
            } else {
                ImportMode::Merge
            };
            let outcome = service.import(report.codes, mode).await?;
            println!(
                "imported {} new codes ({} total, {} rows rejected){}",
                outcome.added,
                outcome.total,
                report.rejected.len(),
                if outcome.persisted { "" } else { ", nothing to store" }
            );
        }
        Command::History => {
            for version in service.versions().await? {
                println!(
                    "{:>6}  {}  {:>8}  {}",
                    version.id,
                    version.updated_at,
                    version.len,
                    if version.latest { "latest" } else { "" }
                );
            }
        }
    }

    Ok(())
}
