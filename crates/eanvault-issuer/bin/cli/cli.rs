use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const STORAGE_BACKEND_ENV: &str = "EANVAULT_STORAGE_BACKEND";
pub const DATA_FILE_ENV: &str = "EANVAULT_DATA_FILE";
pub const MYSQL_DSN_ENV: &str = "EANVAULT_MYSQL_DSN";
pub const LOG_FORMAT_ENV: &str = "EANVAULT_LOG_FORMAT";

pub const DEFAULT_DATA_FILE: &str = "eanvault.json";
pub const DEFAULT_MASK: &str = "160x";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "file")]
    File,
    #[value(name = "mysql")]
    Mysql,
    #[value(name = "in-memory")]
    InMemory,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::File => write!(f, "file"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
            StorageBackendArg::InMemory => write!(f, "in-memory"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "eanvault", about = "Issue unique EAN-13 codes from a digit mask")]
pub struct CLI {
    #[arg(
        long,
        global = true,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::File
    )]
    pub storage: StorageBackendArg,

    #[arg(long, global = true, env = DATA_FILE_ENV, default_value = DEFAULT_DATA_FILE)]
    pub data_file: PathBuf,

    #[arg(long, global = true, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(
        long,
        global = true,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormatArg::Text
    )]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate new codes and add them to the registry.
    Generate {
        /// Up to 12 digits or `x` wildcards; padded with wildcards.
        #[arg(short, long, default_value = DEFAULT_MASK)]
        mask: String,
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
        /// Also write the new codes to this `.xlsx` file.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print every issued code.
    List,
    /// Write every issued code to an `.xlsx` file.
    Export {
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Read codes from the first column of an `.xlsx` file.
    Import {
        #[arg(short, long)]
        file: PathBuf,
        /// Store the file as a new list version instead of merging it.
        #[arg(long)]
        replace: bool,
    },
    /// Show stored list versions.
    History,
}
