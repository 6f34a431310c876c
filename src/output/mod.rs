//! Emission of the summary document and one document per entity.

use crossbeam::channel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::{debug, info, warn};

use crate::progress::{ProgressCallback, ProgressPhase, ProgressTracker};
use crate::storage::{write_json, IndexStore};
use crate::types::{
    DataSourceRecord, EntityCategory, EntityRecord, EphemeralRecord, PackageRegistration,
    ProviderIndex, RegistrationShape, ResourceRecord, Result,
};

pub const DEFAULT_SUMMARY_FILE: &str = "terraform-provider-index.json";

/// File and directory names under the output root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputLayout {
    pub summary_file: String,
    pub resources_dir: String,
    pub data_sources_dir: String,
    pub ephemeral_dir: String,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self {
            summary_file: DEFAULT_SUMMARY_FILE.to_string(),
            resources_dir: "resources".to_string(),
            data_sources_dir: "datasources".to_string(),
            ephemeral_dir: "ephemeral".to_string(),
        }
    }
}

impl OutputLayout {
    pub fn dir_for(&self, category: EntityCategory) -> &str {
        match category {
            EntityCategory::Resource => &self.resources_dir,
            EntityCategory::DataSource => &self.data_sources_dir,
            EntityCategory::Ephemeral => &self.ephemeral_dir,
        }
    }

    pub fn summary_path(&self, output: &Path) -> PathBuf {
        output.join(&self.summary_file)
    }

    pub fn category_dirs(&self, output: &Path) -> [PathBuf; 3] {
        [
            output.join(&self.resources_dir),
            output.join(&self.data_sources_dir),
            output.join(&self.ephemeral_dir),
        ]
    }
}

/// `<identifier>.json` with path separators flattened to `_`.
pub fn entity_file_name(identifier: &str) -> String {
    format!("{}.json", identifier.replace(['/', '\\'], "_"))
}

/// One entity document to write.
///
/// `name` is the table key for legacy shapes and the list entry for modern
/// ones; `function` is only set for legacy shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitTask {
    pub shape: RegistrationShape,
    pub service: usize,
    pub name: String,
    pub function: Option<String>,
}

impl EmitTask {
    pub fn record(&self, service: &PackageRegistration) -> EntityRecord {
        let function = self.function.as_deref().unwrap_or_default();
        match self.shape {
            RegistrationShape::SupportedResources => {
                EntityRecord::Resource(ResourceRecord::legacy(&self.name, function, service))
            }
            RegistrationShape::Resources => EntityRecord::Resource(ResourceRecord::modern(&self.name, service)),
            RegistrationShape::SupportedDataSources => {
                EntityRecord::DataSource(DataSourceRecord::legacy(&self.name, function, service))
            }
            RegistrationShape::DataSources => {
                EntityRecord::DataSource(DataSourceRecord::modern(&self.name, service))
            }
            RegistrationShape::EphemeralResources => {
                EntityRecord::Ephemeral(EphemeralRecord::new(&self.name, service))
            }
        }
    }
}

/// One task per legacy table entry and per modern list entry, in package order.
pub fn emit_tasks(index: &ProviderIndex) -> Vec<EmitTask> {
    let mut tasks = Vec::with_capacity(index.entity_count());
    for (service, reg) in index.services.iter().enumerate() {
        let legacy = |shape, table: &std::collections::BTreeMap<String, String>| {
            table
                .iter()
                .map(move |(name, function)| EmitTask {
                    shape,
                    service,
                    name: name.clone(),
                    function: Some(function.clone()),
                })
                .collect::<Vec<_>>()
        };
        let modern = |shape, list: &[String]| {
            list.iter()
                .map(move |name| EmitTask {
                    shape,
                    service,
                    name: name.clone(),
                    function: None,
                })
                .collect::<Vec<_>>()
        };

        tasks.extend(legacy(RegistrationShape::SupportedResources, &reg.supported_resources));
        tasks.extend(modern(RegistrationShape::Resources, &reg.resources));
        tasks.extend(legacy(RegistrationShape::SupportedDataSources, &reg.supported_data_sources));
        tasks.extend(modern(RegistrationShape::DataSources, &reg.data_sources));
        tasks.extend(modern(RegistrationShape::EphemeralResources, &reg.ephemeral_resources));
    }
    tasks
}

/// Writes a [`ProviderIndex`] through an [`IndexStore`] with a fail-fast pool.
pub struct IndexWriter<'s, S: ?Sized> {
    store: &'s S,
    layout: OutputLayout,
    workers: usize,
    progress: Option<ProgressCallback>,
}

impl<'s, S: IndexStore + ?Sized> IndexWriter<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            layout: OutputLayout::default(),
            workers: num_cpus::get(),
            progress: None,
        }
    }

    pub fn with_layout(mut self, layout: OutputLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Write the summary and every entity document under `output`.
    ///
    /// Returns the number of files written. The first failing write stops the
    /// pool and is returned; files written before it stay in place.
    pub fn write(&self, index: &ProviderIndex, output: &Path) -> Result<usize> {
        let tasks = emit_tasks(index);
        let tracker = ProgressTracker::new(ProgressPhase::Indexing, tasks.len() + 1, self.progress.clone());

        self.store.create_dir_all(output)?;
        for dir in self.layout.category_dirs(output) {
            self.store.create_dir_all(&dir)?;
        }

        write_json(self.store, &self.layout.summary_path(output), index)?;
        tracker.update(&self.layout.summary_file);

        self.run_tasks(index, output, tasks, &tracker)?;
        tracker.complete();

        let written = tracker.completed();
        info!("Wrote {} index files to {}", written, output.display());
        Ok(written)
    }

    fn run_tasks(
        &self,
        index: &ProviderIndex,
        output: &Path,
        tasks: Vec<EmitTask>,
        tracker: &ProgressTracker,
    ) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let total = tasks.len();
        let workers = self.workers.min(total).max(1);
        debug!("Emitting {} entity files with {} workers", total, workers);

        let (task_tx, task_rx) = channel::bounded::<EmitTask>(total);
        let (err_tx, err_rx) = channel::bounded(workers);
        // Sized to the task list, and `task_rx` outlives the sends.
        for task in tasks {
            if task_tx.send(task).is_err() {
                break;
            }
        }
        drop(task_tx);

        let abort = AtomicBool::new(false);
        thread::scope(|scope| {
            for _ in 0..workers {
                let task_rx = task_rx.clone();
                let err_tx = err_tx.clone();
                let abort = &abort;
                scope.spawn(move || {
                    for task in task_rx.iter() {
                        if abort.load(Ordering::SeqCst) {
                            break;
                        }
                        match self.emit(index, output, &task) {
                            Ok(()) => tracker.update(&task.name),
                            Err(e) => {
                                warn!("Failed to write {} {}: {}", task.shape.category(), task.name, e);
                                abort.store(true, Ordering::SeqCst);
                                // One slot per worker; each sends at most once.
                                err_tx.send(e).ok();
                                break;
                            }
                        }
                    }
                });
            }
        });
        drop(err_tx);

        match err_rx.try_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn emit(&self, index: &ProviderIndex, output: &Path, task: &EmitTask) -> Result<()> {
        let service = &index.services[task.service];
        let record = task.record(service);
        let path = output
            .join(self.layout.dir_for(record.category()))
            .join(entity_file_name(record.terraform_type()));
        write_json(self.store, &path, &record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::{IndexError, LegacyResourceCrudMethods};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::time::Duration;

    fn sample_index() -> ProviderIndex {
        let mut reg = PackageRegistration::new("keyvault", "github.com/org/provider/services/keyvault");
        reg.supported_resources
            .insert("azurerm_key_vault".to_string(), "resourceKeyVault".to_string());
        reg.resource_crud_methods.insert(
            "azurerm_key_vault".to_string(),
            LegacyResourceCrudMethods {
                create_method: "resourceKeyVaultCreate".to_string(),
                ..Default::default()
            },
        );
        reg.supported_data_sources
            .insert("azurerm_key_vault".to_string(), "dataSourceKeyVault".to_string());
        reg.resources.push("KeyVaultContactsResource".to_string());
        reg.resource_terraform_types.insert(
            "KeyVaultContactsResource".to_string(),
            "azurerm_key_vault_contacts".to_string(),
        );
        reg.data_sources.push("Unresolved/DataSource".to_string());
        reg.ephemeral_resources.push("NewSecretEphemeral".to_string());
        ProviderIndex::new("v1.2.3", vec![reg])
    }

    #[test]
    fn test_entity_file_name_flattens_separators() {
        assert_eq!(entity_file_name("azurerm_thing"), "azurerm_thing.json");
        assert_eq!(entity_file_name("a/b\\c"), "a_b_c.json");
    }

    #[test]
    fn test_emit_tasks_cover_every_entry() {
        let tasks = emit_tasks(&sample_index());
        assert_eq!(tasks.len(), 5);
        assert_eq!(tasks[0].shape, RegistrationShape::SupportedResources);
        assert_eq!(tasks[0].function.as_deref(), Some("resourceKeyVault"));
        assert!(tasks.iter().filter(|t| t.function.is_none()).count() == 3);
    }

    #[test]
    fn test_writes_summary_and_entities() {
        let store = MemoryStore::new();
        let index = sample_index();
        let output = Path::new("out");

        let written = IndexWriter::new(&store).with_workers(2).write(&index, output).unwrap();
        assert_eq!(written, 6);

        let summary: ProviderIndex = store.read_json("out/terraform-provider-index.json").unwrap();
        assert_eq!(summary, index);

        // Same identifier in two categories lands in two files.
        assert!(store.exists("out/resources/azurerm_key_vault.json"));
        assert!(store.exists("out/datasources/azurerm_key_vault.json"));
        assert!(store.exists("out/resources/azurerm_key_vault_contacts.json"));
        assert!(store.exists("out/datasources/Unresolved_DataSource.json"));
        assert!(store.exists("out/ephemeral/NewSecretEphemeral.json"));

        let legacy: serde_json::Value = store.read_json("out/resources/azurerm_key_vault.json").unwrap();
        assert_eq!(legacy["sdk_type"], "legacy_pluginsdk");
        assert_eq!(legacy["create_index"], "func.resourceKeyVaultCreate.goindex");
        assert!(legacy.get("update_index").is_none());
    }

    #[test]
    fn test_custom_layout() {
        let store = MemoryStore::new();
        let layout = OutputLayout {
            summary_file: "index.json".to_string(),
            ephemeral_dir: "eph".to_string(),
            ..OutputLayout::default()
        };
        IndexWriter::new(&store)
            .with_layout(layout)
            .write(&sample_index(), Path::new("custom"))
            .unwrap();

        assert!(store.exists("custom/index.json"));
        assert!(store.exists("custom/eph/NewSecretEphemeral.json"));
    }

    /// Accepts the summary and then `budget` entity writes.
    struct BudgetStore {
        inner: MemoryStore,
        budget: AtomicUsize,
    }

    impl IndexStore for BudgetStore {
        fn create_dir_all(&self, path: &Path) -> Result<()> {
            self.inner.create_dir_all(path)
        }

        fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
            let left = self
                .budget
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            match left {
                Ok(_) => self.inner.write_file(path, contents),
                Err(_) => Err(IndexError::store(path, "disk full")),
            }
        }
    }

    #[test]
    fn test_first_failure_aborts_emission() {
        let store = BudgetStore {
            inner: MemoryStore::new(),
            budget: AtomicUsize::new(2),
        };

        let err = IndexWriter::new(&store)
            .with_workers(1)
            .write(&sample_index(), Path::new("out"))
            .unwrap_err();
        assert!(matches!(err, IndexError::Store { .. }));

        // Summary plus one entity made it; nothing after the failure did.
        assert_eq!(store.inner.file_count(), 2);
        assert!(store.inner.exists("out/terraform-provider-index.json"));
    }

    /// Fails one chosen entity file. The first `workers` entity writes meet at
    /// a barrier so that every worker is mid-write when the failure happens;
    /// the others then finish late. Writes that start after the failure are
    /// counted.
    struct FailingFileStore {
        inner: MemoryStore,
        fail_on: PathBuf,
        rendezvous: Barrier,
        arrivals: AtomicUsize,
        workers: usize,
        failed: AtomicBool,
        late_writes: AtomicUsize,
    }

    impl FailingFileStore {
        fn new(fail_on: &str, workers: usize) -> Self {
            Self {
                inner: MemoryStore::new(),
                fail_on: PathBuf::from(fail_on),
                rendezvous: Barrier::new(workers),
                arrivals: AtomicUsize::new(0),
                workers,
                failed: AtomicBool::new(false),
                late_writes: AtomicUsize::new(0),
            }
        }
    }

    impl IndexStore for FailingFileStore {
        fn create_dir_all(&self, path: &Path) -> Result<()> {
            self.inner.create_dir_all(path)
        }

        fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
            if path.parent() == Some(Path::new("out")) {
                return self.inner.write_file(path, contents);
            }
            if self.failed.load(Ordering::SeqCst) {
                self.late_writes.fetch_add(1, Ordering::SeqCst);
            }

            if self.arrivals.fetch_add(1, Ordering::SeqCst) < self.workers {
                self.rendezvous.wait();
            }
            if path == self.fail_on {
                self.failed.store(true, Ordering::SeqCst);
                return Err(IndexError::store(path, "refused"));
            }
            while !self.failed.load(Ordering::SeqCst) {
                thread::yield_now();
            }
            thread::sleep(Duration::from_millis(50));
            self.inner.write_file(path, contents)
        }
    }

    fn wide_index(entities: usize) -> ProviderIndex {
        let mut reg = PackageRegistration::new("wide", "example.com/provider/services/wide");
        for i in 0..entities {
            reg.supported_resources
                .insert(format!("x_res_{:02}", i), format!("resource{:02}", i));
        }
        ProviderIndex::new("v0.0.1", vec![reg])
    }

    #[test]
    fn test_abort_stops_other_workers_from_taking_tasks() {
        let workers = 4;
        let store = FailingFileStore::new("out/resources/x_res_00.json", workers);

        let err = IndexWriter::new(&store)
            .with_workers(workers)
            .write(&wide_index(16), Path::new("out"))
            .unwrap_err();

        match err {
            IndexError::Store { path, .. } => assert_eq!(path, PathBuf::from("out/resources/x_res_00.json")),
            other => panic!("expected store error, got {:?}", other),
        }
        assert_eq!(store.late_writes.load(Ordering::SeqCst), 0);
        // Summary plus the three writes already in flight.
        assert_eq!(store.inner.file_count(), 1 + (workers - 1));
        assert!(!store.inner.exists("out/resources/x_res_00.json"));
        assert!(!store.inner.exists("out/resources/x_res_04.json"));
    }

    #[test]
    fn test_summary_failure_is_fatal() {
        let store = BudgetStore {
            inner: MemoryStore::new(),
            budget: AtomicUsize::new(0),
        };
        assert!(IndexWriter::new(&store).write(&sample_index(), Path::new("out")).is_err());
        assert_eq!(store.inner.file_count(), 0);
    }
}
