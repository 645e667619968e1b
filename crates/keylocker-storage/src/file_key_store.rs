use std::{
    collections::BTreeSet,
    fs::{self, File},
    io::{ErrorKind, Read, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use keylocker_core::{Capability, KeyRecord, KeyStore, StoreConfig, StoreError};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, instrument, trace};

/// Current on-disk layout version.
pub const SCHEMA_VERSION: u32 = 1;

const MANIFEST_FILE: &str = "schema.json";

/// Directory-backed key store.
///
/// Layout (every segment below `root` is unpadded base64url):
/// ```text
/// <root>/<collection>/schema.json
/// <root>/<collection>/<partition>/<key name>.json
/// ```
/// Every operation opens a connection on the blocking pool, performs one
/// read or write, and drops the connection before returning.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    root: PathBuf,
    collection: String,
    partition: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    partitions: BTreeSet<String>,
}

impl FileKeyStore {
    pub fn new(root: impl Into<PathBuf>, config: &StoreConfig) -> Self {
        Self {
            root: root.into(),
            collection: config.collection_name.clone(),
            partition: config.partition_name.clone(),
        }
    }

    /// Check that `root` can hold a store before handing one out.
    pub fn probe(root: impl Into<PathBuf>, config: &StoreConfig) -> Capability<Self> {
        let root = root.into();
        match fs::create_dir_all(&root).and_then(|_| fs::metadata(&root)) {
            Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => {
                Capability::Available(Self::new(root, config))
            }
            Ok(_) => Capability::unavailable(format!(
                "{} is not a writable directory",
                root.display()
            )),
            Err(err) => {
                Capability::unavailable(format!("cannot open {}: {err}", root.display()))
            }
        }
    }

    fn collection_dir(&self) -> PathBuf {
        self.root.join(sanitize_segment(&self.collection))
    }

    /// Run one unit of work against a freshly opened connection.
    async fn with_connection<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let collection_dir = self.collection_dir();
        let partition = self.partition.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open(collection_dir, &partition)?;
            work(&conn)
        })
        .await
        .map_err(|e| StoreError::Storage {
            reason: format!("store task failed: {e}"),
        })?
    }
}

#[async_trait]
impl KeyStore for FileKeyStore {
    #[instrument(skip_all, fields(key_name = %key_name))]
    async fn get(&self, key_name: &str) -> Result<Option<KeyRecord>, StoreError> {
        let key_name = key_name.to_string();
        self.with_connection(move |conn| {
            let Some(record) = read_json::<KeyRecord>(&conn.record_path(&key_name))? else {
                return Ok(None);
            };
            if record.id != key_name {
                return Err(StoreError::Storage {
                    reason: format!("record for {key_name:?} carries id {:?}", record.id),
                });
            }
            Ok(Some(record))
        })
        .await
    }

    #[instrument(skip_all, fields(key_name = %record.id))]
    async fn put(&self, record: KeyRecord) -> Result<(), StoreError> {
        self.with_connection(move |conn| {
            let path = conn.record_path(&record.id);
            match write_json_new(&path, &record) {
                Err(err) if err.kind() == ErrorKind::AlreadyExists => Err(StoreError::Duplicate {
                    key_name: record.id.clone(),
                }),
                other => other.map_err(storage_err),
            }
        })
        .await
    }
}

/// An open handle on one partition. Released when dropped.
struct Connection {
    partition_dir: PathBuf,
    opened_at: Instant,
}

impl Connection {
    /// Open the collection, creating or upgrading its layout when needed.
    fn open(collection_dir: PathBuf, partition: &str) -> Result<Self, StoreError> {
        fs::create_dir_all(&collection_dir).map_err(storage_err)?;
        let manifest_path = collection_dir.join(MANIFEST_FILE);
        let partition_dir = collection_dir.join(sanitize_segment(partition));

        let mut manifest = read_json::<Manifest>(&manifest_path)?.unwrap_or_default();
        if manifest.version > SCHEMA_VERSION {
            return Err(StoreError::Storage {
                reason: format!(
                    "store schema version {} is newer than supported {SCHEMA_VERSION}",
                    manifest.version
                ),
            });
        }

        if manifest.version < SCHEMA_VERSION || !manifest.partitions.contains(partition) {
            debug!(
                from = manifest.version,
                to = SCHEMA_VERSION,
                partition,
                "upgrading key store layout"
            );
            fs::create_dir_all(&partition_dir).map_err(storage_err)?;
            manifest.version = SCHEMA_VERSION;
            manifest.partitions.insert(partition.to_string());
            write_json_replace(&manifest_path, &manifest).map_err(storage_err)?;
        }

        trace!(dir = %partition_dir.display(), "key store connection opened");
        Ok(Self {
            partition_dir,
            opened_at: Instant::now(),
        })
    }

    fn record_path(&self, key_name: &str) -> PathBuf {
        self.partition_dir
            .join(format!("{}.json", sanitize_segment(key_name)))
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        trace!(
            elapsed_us = self.opened_at.elapsed().as_micros() as u64,
            "key store connection closed"
        );
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(storage_err(err)),
    };
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).map_err(storage_err)?;
    serde_json::from_slice(&buf).map(Some).map_err(storage_err)
}

/// Atomically create `path`; fails with `AlreadyExists` instead of replacing.
fn write_json_new<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    let tmp = staged_json(path, value)?;
    tmp.persist_noclobber(path).map_err(|e| e.error)?;
    Ok(())
}

fn write_json_replace<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    let tmp = staged_json(path, value)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn staged_json<T: Serialize>(path: &Path, value: &T) -> std::io::Result<NamedTempFile> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::new(ErrorKind::InvalidInput, "invalid storage path"))?;
    // Temp files are created owner-only (0600 on unix).
    let mut tmp = NamedTempFile::new_in(parent)?;
    let json = serde_json::to_vec(value)?;
    tmp.write_all(&json)?;
    tmp.flush()?;
    Ok(tmp)
}

fn sanitize_segment(name: &str) -> String {
    URL_SAFE_NO_PAD.encode(name)
}

fn storage_err<E: ToString>(err: E) -> StoreError {
    StoreError::Storage {
        reason: err.to_string(),
    }
}
