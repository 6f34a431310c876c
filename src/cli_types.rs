use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "provider-index",
    about = "Scans a Terraform provider source tree and writes a JSON index per resource",
    long_about = None,
    after_help = "Example:\n  provider-index --scan-path ./internal/services \\\n    --package-path github.com/hashicorp/terraform-provider-azurerm \\\n    --version v3.116.0 --output ./index"
)]
pub struct Cli {
    /// Directory holding one subdirectory per service package
    #[arg(long, value_name = "DIR")]
    pub scan_path: PathBuf,

    /// Base import path of the provider module
    #[arg(long, value_name = "IMPORT_PATH")]
    pub package_path: String,

    /// Provider version recorded in the index
    #[arg(long = "version", value_name = "VERSION")]
    pub provider_version: String,

    /// Output directory for index files
    #[arg(long, default_value = "./index", value_name = "DIR")]
    pub output: PathBuf,

    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Worker threads for scanning and writing
    #[arg(long, env = "PROVIDER_INDEX_WORKERS")]
    pub workers: Option<usize>,

    /// Progress display
    #[arg(long, value_enum, default_value_t = ProgressMode::Rich)]
    pub progress: ProgressMode,

    /// Also parse `_test.go` files
    #[arg(long)]
    pub include_tests: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub print_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Rich,
    Simple,
    None,
}
