//! DB Actor - Thread-safe access to SQLite
//!
//! SQLite connections are not `Sync`, so the catalog database lives on a
//! dedicated background thread. Callers ship closures to it over a
//! channel and await the result on a oneshot.

use std::path::Path;
use std::sync::mpsc;
use std::thread;

use async_trait::async_trait;
use depot_schema::{
    Application, ApplicationId, ApplicationSummary, DownloadLogEntry, Extra, ExtraId, Release,
    ReleaseId, UserId,
};
use tokio::sync::oneshot;

use super::db::CatalogDb;
use super::{CatalogStore, NewApplication, NewExtra, NewRelease, StoreError};

type Job = Box<dyn FnOnce(&CatalogDb) + Send>;

/// Events that can be sent to the DB actor
enum DbEvent {
    /// Run a closure against the database
    Run(Job),
    /// Shutdown the actor
    Shutdown,
}

/// A handle to the Database Actor that is Send + Sync and Clone.
#[derive(Clone)]
pub struct DbHandle {
    sender: mpsc::Sender<DbEvent>,
}

impl std::fmt::Debug for DbHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbHandle").finish_non_exhaustive()
    }
}

impl DbHandle {
    /// Open the database at `path` and spawn the actor thread
    pub fn spawn(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(dir = %parent.display(), error = %e, "Failed to create database directory");
            }
        }
        let db = CatalogDb::open_at(path)?;
        Ok(Self::with_db(db))
    }

    /// Spawn the actor thread around an already opened database
    pub fn with_db(db: CatalogDb) -> Self {
        let (sender, receiver) = mpsc::channel();

        thread::spawn(move || {
            run_db_event_loop(&db, &receiver);
        });

        Self { sender }
    }

    /// Stop the actor; later requests fail with [`StoreError::ActorDied`]
    pub fn shutdown(&self) {
        let _ = self.sender.send(DbEvent::Shutdown);
    }

    /// Helper to run a closure on the actor thread and wait for its result
    async fn call<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&CatalogDb) -> Result<T, StoreError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |db| {
            let _ = tx.send(f(db));
        });
        self.sender
            .send(DbEvent::Run(job))
            .map_err(|_| StoreError::ActorDied)?;
        rx.await.map_err(|_| StoreError::ActorDied)?
    }
}

/// The actual event loop running in the background thread
fn run_db_event_loop(db: &CatalogDb, receiver: &mpsc::Receiver<DbEvent>) {
    while let Ok(event) = receiver.recv() {
        match event {
            DbEvent::Run(job) => job(db),
            DbEvent::Shutdown => break,
        }
    }
    tracing::debug!("Catalog database actor stopped");
}

#[async_trait]
impl CatalogStore for DbHandle {
    async fn insert_application(&self, app: NewApplication) -> Result<Application, StoreError> {
        self.call(move |db| db.insert_application(&app)).await
    }

    async fn get_application(&self, id: ApplicationId) -> Result<Option<Application>, StoreError> {
        self.call(move |db| db.get_application(id)).await
    }

    async fn list_applications(&self) -> Result<Vec<ApplicationSummary>, StoreError> {
        self.call(CatalogDb::list_applications).await
    }

    async fn update_application(
        &self,
        app: Application,
    ) -> Result<Option<Application>, StoreError> {
        self.call(move |db| db.update_application(&app)).await
    }

    async fn delete_application(&self, id: ApplicationId) -> Result<bool, StoreError> {
        self.call(move |db| db.delete_application(id)).await
    }

    async fn set_multiple_os_flag(
        &self,
        id: ApplicationId,
        value: bool,
    ) -> Result<(), StoreError> {
        self.call(move |db| db.set_multiple_os_flag(id, value)).await
    }

    async fn insert_release(&self, release: NewRelease) -> Result<Release, StoreError> {
        self.call(move |db| db.insert_release(&release)).await
    }

    async fn get_release(&self, id: ReleaseId) -> Result<Option<Release>, StoreError> {
        self.call(move |db| db.get_release(id)).await
    }

    async fn list_releases(&self, app: ApplicationId) -> Result<Vec<Release>, StoreError> {
        self.call(move |db| db.list_releases(app)).await
    }

    async fn update_release(&self, release: Release) -> Result<Option<Release>, StoreError> {
        self.call(move |db| db.update_release(&release)).await
    }

    async fn delete_release(&self, id: ReleaseId) -> Result<Option<Release>, StoreError> {
        self.call(move |db| db.delete_release(id)).await
    }

    async fn distinct_operating_systems(
        &self,
        app: ApplicationId,
    ) -> Result<Vec<String>, StoreError> {
        self.call(move |db| db.distinct_operating_systems(app)).await
    }

    async fn reorder_releases(
        &self,
        app: ApplicationId,
        assignments: Vec<(ReleaseId, i64)>,
    ) -> Result<bool, StoreError> {
        self.call(move |db| db.reorder_releases(app, &assignments))
            .await
    }

    async fn insert_download(
        &self,
        user: UserId,
        release: ReleaseId,
    ) -> Result<DownloadLogEntry, StoreError> {
        self.call(move |db| db.insert_download(user, release)).await
    }

    async fn count_downloads(&self, release: ReleaseId) -> Result<u64, StoreError> {
        self.call(move |db| db.count_downloads(release)).await
    }

    async fn insert_extra(&self, extra: NewExtra) -> Result<Extra, StoreError> {
        self.call(move |db| db.insert_extra(&extra)).await
    }

    async fn list_extras(&self, app: ApplicationId) -> Result<Vec<Extra>, StoreError> {
        self.call(move |db| db.list_extras(app)).await
    }

    async fn delete_extra(&self, id: ExtraId) -> Result<Option<Extra>, StoreError> {
        self.call(move |db| db.delete_extra(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::tempdir;

    fn new_app(name: &str) -> NewApplication {
        NewApplication {
            name: name.to_string(),
            description: None,
            developer: None,
            publisher: None,
            icon_url: None,
            homepage: None,
            tags: BTreeSet::new(),
        }
    }

    #[tokio::test]
    async fn test_requests_from_many_tasks() {
        let dir = tempdir().unwrap();
        let handle = DbHandle::spawn(&dir.path().join("nested/catalog.db")).unwrap();

        let mut tasks = Vec::new();
        for i in 0..8 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                handle.insert_application(new_app(&format!("app-{i}"))).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(handle.list_applications().await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_shutdown_reports_actor_died() {
        let handle = DbHandle::with_db(CatalogDb::open_in_memory().unwrap());
        handle.insert_application(new_app("Foo")).await.unwrap();

        handle.shutdown();
        let err = handle.list_applications().await.unwrap_err();
        assert!(matches!(err, StoreError::ActorDied));
    }
}
