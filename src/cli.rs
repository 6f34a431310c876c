use anyhow::{bail, Context, Result};
use std::time::Instant;
use tracing::info;

use crate::{
    cli_types::{Cli, ProgressMode},
    config::IndexConfig,
    output::IndexWriter,
    parser::GoSyntaxProvider,
    progress::ProgressCallback,
    scanner::ProviderScanner,
    storage::FsStore,
    ui,
};

pub struct CliApp {
    cli: Cli,
    config: IndexConfig,
}

impl CliApp {
    /// Resolve configuration: defaults, file, environment, then flags.
    pub fn new(cli: Cli) -> Result<Self> {
        let mut config = IndexConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

        if let Some(workers) = cli.workers {
            config.scan.workers = Some(workers);
        }
        if cli.include_tests {
            config.scan.include_test_files = true;
        }

        Ok(Self { cli, config })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    fn progress_callback(&self) -> Option<ProgressCallback> {
        match self.cli.progress {
            ProgressMode::Rich => Some(ui::rich_progress()),
            ProgressMode::Simple => Some(ui::simple_progress()),
            ProgressMode::None => None,
        }
    }

    pub fn run(&self) -> Result<()> {
        if self.cli.print_config {
            let rendered = self.config.to_toml().context("Failed to render configuration")?;
            print!("{}", rendered);
            return Ok(());
        }

        if !self.cli.scan_path.is_dir() {
            bail!("scan path does not exist or is not a directory: {}", self.cli.scan_path.display());
        }

        let start = Instant::now();
        let workers = self.config.scan.worker_count();
        let progress = self.progress_callback();

        ui::print_header("Scanning provider packages");
        let provider = GoSyntaxProvider::new().with_test_files(self.config.scan.include_test_files);
        let mut scanner = ProviderScanner::new(provider)
            .with_workers(workers)
            .with_crud_resolver(self.config.scan.crud_resolver());
        if let Some(callback) = &progress {
            scanner = scanner.with_progress(callback.clone());
        }

        let index = scanner
            .scan(&self.cli.scan_path, &self.cli.package_path, &self.cli.provider_version)
            .with_context(|| format!("Failed to scan {}", self.cli.scan_path.display()))?;
        ui::print_statistics(&index.version, &index.statistics);

        ui::print_header("Writing index files");
        let store = FsStore::new();
        let mut writer = IndexWriter::new(&store)
            .with_layout(self.config.output.clone())
            .with_workers(workers);
        if let Some(callback) = progress {
            writer = writer.with_progress(callback);
        }

        let written = writer
            .write(&index, &self.cli.output)
            .with_context(|| format!("Failed to write index to {}", self.cli.output.display()))?;
        ui::print_outputs(&self.cli.output, writer.layout(), written);

        info!("Finished in {:?}", start.elapsed());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["provider-index", "--package-path", "github.com/org/provider", "--version", "v0.1.0"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_flags_override_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[scan]\nworkers = 2\n").unwrap();
        let config_arg = config_path.to_string_lossy().into_owned();

        let app = CliApp::new(cli(&[
            "--scan-path",
            ".",
            "--config",
            &config_arg,
            "--workers",
            "5",
            "--include-tests",
        ]))
        .unwrap();

        assert_eq!(app.config().scan.workers, Some(5));
        assert!(app.config().scan.include_test_files);
    }

    #[test]
    fn test_missing_scan_path_is_reported() {
        let app = CliApp::new(cli(&["--scan-path", "/no/such/services", "--progress", "none"])).unwrap();
        let err = app.run().unwrap_err();
        assert!(err.to_string().contains("scan path does not exist"));
    }

    #[test]
    fn test_end_to_end_run() {
        let root = TempDir::new().unwrap();
        let services = root.path().join("services");
        let svc = services.join("network");
        fs::create_dir_all(&svc).unwrap();
        fs::write(
            svc.join("registration.go"),
            r#"package network

func (r Registration) SupportedResources() map[string]*pluginsdk.Resource {
	return map[string]*pluginsdk.Resource{
		"azurerm_virtual_network": resourceVirtualNetwork(),
	}
}
"#,
        )
        .unwrap();
        let output = root.path().join("index");

        let services_arg = services.to_string_lossy().into_owned();
        let output_arg = output.to_string_lossy().into_owned();
        let app = CliApp::new(cli(&[
            "--scan-path",
            &services_arg,
            "--output",
            &output_arg,
            "--progress",
            "none",
        ]))
        .unwrap();
        app.run().unwrap();

        assert!(output.join("terraform-provider-index.json").is_file());
        assert!(output.join("resources").join("azurerm_virtual_network.json").is_file());
        assert!(output.join("datasources").is_dir());
        assert!(output.join("ephemeral").is_dir());
    }
}
