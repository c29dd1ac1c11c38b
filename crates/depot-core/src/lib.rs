pub mod blob;
pub mod config;
pub mod error;
pub mod input;
pub mod paths;
pub mod service;
pub mod store;
pub mod transfer;

pub use blob::{ArtifactSource, BlobError, BlobStore, FsBlobStore, StoredBlob};
pub use config::{Config, ConfigError};
pub use error::{CatalogError, ErrorKind};
pub use input::{ApplicationFields, ApplicationPatch, ExtraFields, Patch, ReleaseFields, ReleasePatch};
pub use paths::*;
pub use service::{Caller, CatalogService, Download};
pub use store::{CatalogDb, CatalogStore, DbHandle, StoreError};
pub use transfer::{TransferError, copy_with_cancel};
