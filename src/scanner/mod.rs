//! Parallel scan of a provider tree.
//!
//! Packages are queued on a bounded channel and drained by a scoped worker
//! pool. Each worker loads one package through the [`SyntaxProvider`],
//! aggregates it and sends any non-empty registration back. Once every worker
//! has joined, the results are collected into a [`ProviderIndex`].

pub mod aggregate;

use crossbeam::channel;
use std::fmt;
use std::path::Path;
use std::thread;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::analyzers::CrudResolver;
use crate::parser::{PackageDir, SyntaxProvider};
use crate::progress::{ProgressCallback, ProgressPhase, ProgressTracker};
use crate::types::{IndexError, PackageRegistration, ProviderIndex, Result};
pub use aggregate::aggregate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Idle,
    Distributing,
    Working,
    Collecting,
    Built,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Distributing => "distributing",
            Self::Working => "working",
            Self::Collecting => "collecting",
            Self::Built => "built",
        };
        f.write_str(name)
    }
}

fn transition(from: &mut ScanState, to: ScanState) {
    debug!("Scan state {} -> {}", from, to);
    *from = to;
}

/// Lists the package directories directly under `root`, in name order.
///
/// Failing to list `root` is the only fatal scan error.
pub fn discover_packages(root: &Path, package_base: &str) -> Result<Vec<PackageDir>> {
    let root_prefix = normalize_import_path(&root.to_string_lossy());
    let mut packages = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| {
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "unreadable entry"));
            IndexError::io(root, source)
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }

        let service_name = entry.file_name().to_string_lossy().into_owned();
        let import_path = [package_base, root_prefix.as_str(), service_name.as_str()]
            .iter()
            .map(|part| normalize_import_path(part))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        packages.push(PackageDir {
            service_name,
            path: entry.into_path(),
            import_path,
        });
    }

    Ok(packages)
}

/// Forward slashes, no leading `./` or `/`, no trailing `/`.
fn normalize_import_path(raw: &str) -> String {
    let mut path = raw.replace('\\', "/");
    while let Some(rest) = path.strip_prefix("./") {
        path = rest.to_string();
    }
    path.trim_matches('/').to_string()
}

/// Drives the scan pipeline.
pub struct ProviderScanner<P> {
    provider: P,
    crud: CrudResolver,
    workers: usize,
    progress: Option<ProgressCallback>,
}

impl<P: SyntaxProvider> ProviderScanner<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            crud: CrudResolver::default(),
            workers: num_cpus::get(),
            progress: None,
        }
    }

    /// Pool size; clamped to at least one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_crud_resolver(mut self, crud: CrudResolver) -> Self {
        self.crud = crud;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Discover and scan every package under `root`.
    pub fn scan(&self, root: &Path, package_base: &str, version: &str) -> Result<ProviderIndex> {
        let packages = discover_packages(root, package_base)?;
        info!("Discovered {} packages under {}", packages.len(), root.display());
        Ok(self.scan_packages(version, packages))
    }

    /// Scan an explicit package list. Unreadable packages are skipped.
    pub fn scan_packages(&self, version: &str, packages: Vec<PackageDir>) -> ProviderIndex {
        let mut state = ScanState::Idle;

        if packages.is_empty() {
            transition(&mut state, ScanState::Built);
            return ProviderIndex::new(version, Vec::new());
        }

        let total = packages.len();
        let tracker = ProgressTracker::new(ProgressPhase::Scanning, total, self.progress.clone());

        transition(&mut state, ScanState::Distributing);
        let (work_tx, work_rx) = channel::bounded::<PackageDir>(total);
        let (result_tx, result_rx) = channel::bounded::<PackageRegistration>(total);
        // Capacity equals the package count and `work_rx` is held until the
        // scope ends, so these sends neither block nor fail.
        for package in packages {
            if work_tx.send(package).is_err() {
                break;
            }
        }
        drop(work_tx);

        transition(&mut state, ScanState::Working);
        let workers = self.workers.min(total).max(1);
        debug!("Scanning {} packages with {} workers", total, workers);

        thread::scope(|scope| {
            for _ in 0..workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                let tracker = &tracker;
                scope.spawn(move || {
                    for package in work_rx.iter() {
                        if let Some(registration) = self.scan_one(&package, tracker) {
                            if result_tx.send(registration).is_err() {
                                break;
                            }
                        }
                    }
                });
            }
        });
        drop(result_tx);

        transition(&mut state, ScanState::Collecting);
        let services: Vec<PackageRegistration> = result_rx.try_iter().collect();
        tracker.complete();

        let index = ProviderIndex::new(version, services);
        transition(&mut state, ScanState::Built);
        info!(
            "Indexed {} of {} packages ({} resources, {} data sources)",
            index.statistics.service_count,
            total,
            index.statistics.total_resources,
            index.statistics.total_data_sources
        );
        index
    }

    fn scan_one(&self, package: &PackageDir, tracker: &ProgressTracker) -> Option<PackageRegistration> {
        let loaded = self.provider.load_package(package);
        tracker.update(&package.service_name);

        let source = match loaded {
            Ok(source) => source,
            Err(e) => {
                warn!("Skipping package {}: {}", package.service_name, e);
                return None;
            }
        };

        if source.is_empty() {
            debug!("Package {} has no source files", package.service_name);
            return None;
        }

        aggregate(&source, &self.crud)
    }
}
