//! SQLite catalog database
//!
//! Holds applications, their releases, extras and the download log.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use depot_schema::{
    Application, ApplicationId, ApplicationSummary, Architecture, DownloadId, DownloadLogEntry,
    Extra, ExtraId, PackageType, Release, ReleaseId, UserId,
};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{NewApplication, NewExtra, NewRelease, StoreError};

const DATE_FORMAT: &str = "%Y-%m-%d";

const APPLICATION_COLUMNS: &str = "a.id, a.name, a.description, a.developer, a.publisher, \
     a.icon_url, a.homepage, a.tags, a.has_multiple_os, a.created_at, a.updated_at";

const RELEASE_COLUMNS: &str = "id, application_id, version_label, version_type, \
     operating_system, architecture, file_path, file_size, release_date, uploaded_at, notes, \
     sort_order";

const EXTRA_COLUMNS: &str =
    "id, application_id, name, file_path, file_size, notes, uploaded_at";

/// Display ranking of releases, shared by every query that orders them.
const RELEASE_ORDER: &str = "sort_order DESC, uploaded_at DESC, id ASC";

/// Catalog database
pub struct CatalogDb {
    conn: Connection,
}

impl std::fmt::Debug for CatalogDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogDb")
            .field("path", &self.conn.path())
            .finish_non_exhaustive()
    }
}

impl CatalogDb {
    /// Open or create the catalog database at `path`
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        Self::with_connection(conn)
    }

    /// Private in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS applications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                developer TEXT,
                publisher TEXT,
                icon_url TEXT,
                homepage TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                has_multiple_os INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS releases (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                application_id INTEGER NOT NULL
                    REFERENCES applications(id) ON DELETE CASCADE,
                version_label TEXT NOT NULL,
                version_type TEXT NOT NULL
                    CHECK (version_type IN ('installer', 'portable', 'source')),
                operating_system TEXT,
                architecture TEXT NOT NULL DEFAULT '[]',
                file_path TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                release_date TEXT,
                uploaded_at INTEGER NOT NULL,
                notes TEXT,
                sort_order INTEGER NOT NULL DEFAULT 0
            );

            CREATE UNIQUE INDEX IF NOT EXISTS releases_unique_combo ON releases (
                application_id,
                version_label,
                COALESCE(operating_system, ''),
                version_type
            );

            CREATE INDEX IF NOT EXISTS idx_releases_application ON releases(application_id);

            CREATE TABLE IF NOT EXISTS download_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                version_id INTEGER NOT NULL REFERENCES releases(id) ON DELETE CASCADE,
                downloaded_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_download_logs_version ON download_logs(version_id);

            CREATE TABLE IF NOT EXISTS extras (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                application_id INTEGER NOT NULL
                    REFERENCES applications(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                file_path TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                notes TEXT,
                uploaded_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_extras_application ON extras(application_id);
            ",
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Applications
    // ------------------------------------------------------------------

    /// Insert an application
    pub fn insert_application(&self, app: &NewApplication) -> Result<Application, StoreError> {
        let now = Utc::now().timestamp_micros();
        self.conn.execute(
            "INSERT INTO applications
                (name, description, developer, publisher, icon_url, homepage, tags,
                 has_multiple_os, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8)",
            params![
                app.name,
                app.description,
                app.developer,
                app.publisher,
                app.icon_url,
                app.homepage,
                encode_json("applications", &app.tags)?,
                now,
            ],
        )?;
        let id = ApplicationId(self.conn.last_insert_rowid());
        self.get_application(id)?
            .ok_or_else(|| vanished("applications", id))
    }

    /// Get an application by id
    pub fn get_application(&self, id: ApplicationId) -> Result<Option<Application>, StoreError> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications a WHERE a.id = ?1");
        self.conn
            .query_row(&sql, params![id.get()], ApplicationRow::read)
            .optional()?
            .map(ApplicationRow::into_application)
            .transpose()
    }

    /// List applications with release counts, newest first
    pub fn list_applications(&self) -> Result<Vec<ApplicationSummary>, StoreError> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS},
                (SELECT COUNT(*) FROM releases r WHERE r.application_id = a.id),
                (SELECT r.version_label FROM releases r WHERE r.application_id = a.id
                 ORDER BY {RELEASE_ORDER} LIMIT 1)
             FROM applications a
             ORDER BY a.created_at DESC, a.id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                ApplicationRow::read(row)?,
                row.get::<_, i64>(11)?,
                row.get::<_, Option<String>>(12)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (app, version_count, latest_version) = row?;
            out.push(ApplicationSummary {
                application: app.into_application()?,
                version_count: version_count as u64,
                latest_version,
            });
        }
        Ok(out)
    }

    /// Overwrite the mutable columns of an application
    pub fn update_application(&self, app: &Application) -> Result<Option<Application>, StoreError> {
        let changed = self.conn.execute(
            "UPDATE applications
             SET name = ?2, description = ?3, developer = ?4, publisher = ?5,
                 icon_url = ?6, homepage = ?7, tags = ?8, updated_at = ?9
             WHERE id = ?1",
            params![
                app.id.get(),
                app.name,
                app.description,
                app.developer,
                app.publisher,
                app.icon_url,
                app.homepage,
                encode_json("applications", &app.tags)?,
                Utc::now().timestamp_micros(),
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_application(app.id)
    }

    /// Delete an application and, through the foreign keys, everything it owns
    pub fn delete_application(&self, id: ApplicationId) -> Result<bool, StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM applications WHERE id = ?1", params![id.get()])?;
        Ok(deleted > 0)
    }

    /// Persist the derived multiple-OS flag
    pub fn set_multiple_os_flag(&self, id: ApplicationId, value: bool) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE applications SET has_multiple_os = ?2 WHERE id = ?1",
            params![id.get(), value],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Releases
    // ------------------------------------------------------------------

    /// Insert a release; the unique index rejects a taken release key
    pub fn insert_release(&self, release: &NewRelease) -> Result<Release, StoreError> {
        self.conn
            .execute(
                "INSERT INTO releases
                    (application_id, version_label, version_type, operating_system,
                     architecture, file_path, file_size, release_date, uploaded_at, notes,
                     sort_order)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    release.application_id.get(),
                    release.version_label,
                    release.package_type.as_str(),
                    release.operating_system,
                    encode_json("releases", &release.architectures)?,
                    path_text(&release.file_path),
                    release.file_size_bytes as i64,
                    release.release_date.map(|d| d.format(DATE_FORMAT).to_string()),
                    Utc::now().timestamp_micros(),
                    release.notes,
                    release.sort_order,
                ],
            )
            .map_err(classify)?;
        let id = ReleaseId(self.conn.last_insert_rowid());
        self.get_release(id)?.ok_or_else(|| vanished("releases", id))
    }

    /// Get a release by id
    pub fn get_release(&self, id: ReleaseId) -> Result<Option<Release>, StoreError> {
        let sql = format!("SELECT {RELEASE_COLUMNS} FROM releases WHERE id = ?1");
        self.conn
            .query_row(&sql, params![id.get()], ReleaseRow::read)
            .optional()?
            .map(ReleaseRow::into_release)
            .transpose()
    }

    /// Releases of an application in display order
    pub fn list_releases(&self, app: ApplicationId) -> Result<Vec<Release>, StoreError> {
        let sql = format!(
            "SELECT {RELEASE_COLUMNS} FROM releases WHERE application_id = ?1 ORDER BY {RELEASE_ORDER}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![app.get()], ReleaseRow::read)?;
        rows.map(|row| row?.into_release()).collect()
    }

    /// Overwrite the mutable columns of a release
    pub fn update_release(&self, release: &Release) -> Result<Option<Release>, StoreError> {
        let changed = self
            .conn
            .execute(
                "UPDATE releases
                 SET version_label = ?2, version_type = ?3, operating_system = ?4,
                     architecture = ?5, file_path = ?6, file_size = ?7, release_date = ?8,
                     notes = ?9, sort_order = ?10
                 WHERE id = ?1",
                params![
                    release.id.get(),
                    release.version_label,
                    release.package_type.as_str(),
                    release.operating_system,
                    encode_json("releases", &release.architectures)?,
                    path_text(&release.file_path),
                    release.file_size_bytes as i64,
                    release.release_date.map(|d| d.format(DATE_FORMAT).to_string()),
                    release.notes,
                    release.sort_order,
                ],
            )
            .map_err(classify)?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_release(release.id)
    }

    /// Delete a release, returning the removed row
    pub fn delete_release(&self, id: ReleaseId) -> Result<Option<Release>, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let Some(release) = self.get_release(id)? else {
            return Ok(None);
        };
        tx.execute("DELETE FROM releases WHERE id = ?1", params![id.get()])?;
        tx.commit()?;
        Ok(Some(release))
    }

    /// Distinct non-null operating systems of an application
    pub fn distinct_operating_systems(&self, app: ApplicationId) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT operating_system FROM releases
             WHERE application_id = ?1 AND operating_system IS NOT NULL
             ORDER BY operating_system",
        )?;
        let rows = stmt.query_map(params![app.get()], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Assign sort orders atomically
    pub fn reorder_releases(
        &self,
        app: ApplicationId,
        assignments: &[(ReleaseId, i64)],
    ) -> Result<bool, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        for (id, sort_order) in assignments {
            let changed = tx.execute(
                "UPDATE releases SET sort_order = ?1 WHERE id = ?2 AND application_id = ?3",
                params![sort_order, id.get(), app.get()],
            )?;
            if changed == 0 {
                // Dropping the transaction rolls back the earlier updates.
                return Ok(false);
            }
        }
        tx.commit()?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Download log
    // ------------------------------------------------------------------

    /// Append a download log entry
    pub fn insert_download(
        &self,
        user: UserId,
        release: ReleaseId,
    ) -> Result<DownloadLogEntry, StoreError> {
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO download_logs (user_id, version_id, downloaded_at) VALUES (?1, ?2, ?3)",
            params![user.get(), release.get(), now.timestamp_micros()],
        )?;
        Ok(DownloadLogEntry {
            id: DownloadId(self.conn.last_insert_rowid()),
            user_id: user,
            release_id: release,
            downloaded_at: from_micros("download_logs", now.timestamp_micros())?,
        })
    }

    /// Number of logged downloads of a release
    pub fn count_downloads(&self, release: ReleaseId) -> Result<u64, StoreError> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM download_logs WHERE version_id = ?1",
            params![release.get()],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    // ------------------------------------------------------------------
    // Extras
    // ------------------------------------------------------------------

    /// Insert an extra
    pub fn insert_extra(&self, extra: &NewExtra) -> Result<Extra, StoreError> {
        self.conn.execute(
            "INSERT INTO extras (application_id, name, file_path, file_size, notes, uploaded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                extra.application_id.get(),
                extra.name,
                path_text(&extra.file_path),
                extra.file_size_bytes as i64,
                extra.notes,
                Utc::now().timestamp_micros(),
            ],
        )?;
        let id = ExtraId(self.conn.last_insert_rowid());
        self.get_extra(id)?.ok_or_else(|| vanished("extras", id))
    }

    /// Get an extra by id
    pub fn get_extra(&self, id: ExtraId) -> Result<Option<Extra>, StoreError> {
        let sql = format!("SELECT {EXTRA_COLUMNS} FROM extras WHERE id = ?1");
        self.conn
            .query_row(&sql, params![id.get()], ExtraRow::read)
            .optional()?
            .map(ExtraRow::into_extra)
            .transpose()
    }

    /// Extras of an application, newest first
    pub fn list_extras(&self, app: ApplicationId) -> Result<Vec<Extra>, StoreError> {
        let sql = format!(
            "SELECT {EXTRA_COLUMNS} FROM extras WHERE application_id = ?1
             ORDER BY uploaded_at DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![app.get()], ExtraRow::read)?;
        rows.map(|row| row?.into_extra()).collect()
    }

    /// Delete an extra, returning the removed row
    pub fn delete_extra(&self, id: ExtraId) -> Result<Option<Extra>, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let Some(extra) = self.get_extra(id)? else {
            return Ok(None);
        };
        tx.execute("DELETE FROM extras WHERE id = ?1", params![id.get()])?;
        tx.commit()?;
        Ok(Some(extra))
    }
}

/// Map unique index failures to [`StoreError::UniqueViolation`].
fn classify(e: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(err, msg) = &e {
        if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
            return StoreError::UniqueViolation(msg.clone().unwrap_or_else(|| err.to_string()));
        }
    }
    StoreError::Sqlite(e)
}

fn corrupt(table: &'static str, detail: impl Into<String>) -> StoreError {
    StoreError::Corrupt {
        table,
        detail: detail.into(),
    }
}

fn vanished(table: &'static str, id: impl std::fmt::Display) -> StoreError {
    corrupt(table, format!("row {id} missing right after insert"))
}

fn encode_json<T: serde::Serialize>(table: &'static str, value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| corrupt(table, e.to_string()))
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn from_micros(table: &'static str, micros: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::<Utc>::from_timestamp_micros(micros)
        .ok_or_else(|| corrupt(table, format!("timestamp {micros} out of range")))
}

struct ApplicationRow {
    id: i64,
    name: String,
    description: Option<String>,
    developer: Option<String>,
    publisher: Option<String>,
    icon_url: Option<String>,
    homepage: Option<String>,
    tags: String,
    has_multiple_os: bool,
    created_at: i64,
    updated_at: i64,
}

impl ApplicationRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            developer: row.get(3)?,
            publisher: row.get(4)?,
            icon_url: row.get(5)?,
            homepage: row.get(6)?,
            tags: row.get(7)?,
            has_multiple_os: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn into_application(self) -> Result<Application, StoreError> {
        const TABLE: &str = "applications";
        Ok(Application {
            id: ApplicationId(self.id),
            name: self.name,
            description: self.description,
            developer: self.developer,
            publisher: self.publisher,
            icon_url: self.icon_url,
            homepage: self.homepage,
            tags: serde_json::from_str(&self.tags)
                .map_err(|e| corrupt(TABLE, format!("tags of {}: {e}", self.id)))?,
            has_multiple_operating_systems: self.has_multiple_os,
            created_at: from_micros(TABLE, self.created_at)?,
            updated_at: from_micros(TABLE, self.updated_at)?,
        })
    }
}

struct ReleaseRow {
    id: i64,
    application_id: i64,
    version_label: String,
    version_type: String,
    operating_system: Option<String>,
    architecture: String,
    file_path: String,
    file_size: i64,
    release_date: Option<String>,
    uploaded_at: i64,
    notes: Option<String>,
    sort_order: i64,
}

impl ReleaseRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            application_id: row.get(1)?,
            version_label: row.get(2)?,
            version_type: row.get(3)?,
            operating_system: row.get(4)?,
            architecture: row.get(5)?,
            file_path: row.get(6)?,
            file_size: row.get(7)?,
            release_date: row.get(8)?,
            uploaded_at: row.get(9)?,
            notes: row.get(10)?,
            sort_order: row.get(11)?,
        })
    }

    fn into_release(self) -> Result<Release, StoreError> {
        const TABLE: &str = "releases";
        let package_type: PackageType = self
            .version_type
            .parse()
            .map_err(|e: depot_schema::InvalidPackageType| corrupt(TABLE, e.to_string()))?;
        let architectures: Vec<Architecture> = serde_json::from_str(&self.architecture)
            .map_err(|e| corrupt(TABLE, format!("architecture of {}: {e}", self.id)))?;
        let release_date = self
            .release_date
            .as_deref()
            .map(|d| NaiveDate::parse_from_str(d, DATE_FORMAT))
            .transpose()
            .map_err(|e| corrupt(TABLE, format!("release_date of {}: {e}", self.id)))?;

        Ok(Release {
            id: ReleaseId(self.id),
            application_id: ApplicationId(self.application_id),
            version_label: self.version_label,
            package_type,
            operating_system: self.operating_system,
            architectures,
            file_path: PathBuf::from(self.file_path),
            file_size_bytes: self.file_size as u64,
            release_date,
            uploaded_at: from_micros(TABLE, self.uploaded_at)?,
            notes: self.notes,
            sort_order: self.sort_order,
        })
    }
}

struct ExtraRow {
    id: i64,
    application_id: i64,
    name: String,
    file_path: String,
    file_size: i64,
    notes: Option<String>,
    uploaded_at: i64,
}

impl ExtraRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            application_id: row.get(1)?,
            name: row.get(2)?,
            file_path: row.get(3)?,
            file_size: row.get(4)?,
            notes: row.get(5)?,
            uploaded_at: row.get(6)?,
        })
    }

    fn into_extra(self) -> Result<Extra, StoreError> {
        Ok(Extra {
            id: ExtraId(self.id),
            application_id: ApplicationId(self.application_id),
            name: self.name,
            file_path: PathBuf::from(self.file_path),
            file_size_bytes: self.file_size as u64,
            notes: self.notes,
            uploaded_at: from_micros("extras", self.uploaded_at)?,
        })
    }
}
