//! File-backed project store.
//!
//! Layout inside the project directory:
//! ```text
//! project.meta.json        - project metadata and schema version
//! saves/
//!   000001.scene.cbor.zst  - CBOR+zstd compressed scene records
//! integrity/
//!   manifest.json          - hash chain manifest
//! ```

use scenery_scene::SceneRecord;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Current project schema version.
const PROJECT_SCHEMA_VERSION: u32 = 1;

/// Errors from project store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CBOR serialization error: {0}")]
    CborEncode(String),
    #[error("CBOR deserialization error: {0}")]
    CborDecode(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("project has no saves")]
    NoSaves,
}

/// Metadata stored in project.meta.json.
///
/// One canonical schema: id/name/timestamps/version plus the save counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub schema_version: u32,
    pub id: Uuid,
    pub name: String,
    pub created_at: u64,
    pub updated_at: u64,
    pub save_count: u32,
}

/// A single entry in the integrity manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub sha256: String,
    pub prev_hash: Option<String>,
}

/// Integrity manifest tracking all save hashes in a chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrityManifest {
    pub entries: Vec<ManifestEntry>,
}

/// File-backed project store with schema versioning and integrity checking.
pub struct ProjectStore {
    root: PathBuf,
    meta: ProjectMeta,
    manifest: IntegrityManifest,
}

impl ProjectStore {
    /// Open an existing project or create a new one named `name`.
    /// Fails closed on schema version mismatch.
    pub fn open(path: impl AsRef<Path>, name: &str) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join("saves"))?;
        std::fs::create_dir_all(root.join("integrity"))?;

        let meta_path = root.join("project.meta.json");
        let manifest_path = root.join("integrity").join("manifest.json");

        let (meta, manifest) = if meta_path.exists() {
            let meta: ProjectMeta = serde_json::from_reader(std::fs::File::open(&meta_path)?)?;
            if meta.schema_version != PROJECT_SCHEMA_VERSION {
                return Err(StoreError::SchemaMismatch {
                    file_version: meta.schema_version,
                    expected_version: PROJECT_SCHEMA_VERSION,
                });
            }
            let manifest: IntegrityManifest = if manifest_path.exists() {
                serde_json::from_reader(std::fs::File::open(&manifest_path)?)?
            } else {
                IntegrityManifest::default()
            };
            (meta, manifest)
        } else {
            let now = unix_now();
            let meta = ProjectMeta {
                schema_version: PROJECT_SCHEMA_VERSION,
                id: Uuid::new_v4(),
                name: name.to_string(),
                created_at: now,
                updated_at: now,
                save_count: 0,
            };
            let manifest = IntegrityManifest::default();
            serde_json::to_writer_pretty(std::fs::File::create(&meta_path)?, &meta)?;
            serde_json::to_writer_pretty(std::fs::File::create(&manifest_path)?, &manifest)?;
            (meta, manifest)
        };

        Ok(Self {
            root,
            meta,
            manifest,
        })
    }

    /// Write a scene record as a new save and chain its hash.
    pub fn save_scene(&mut self, record: &SceneRecord) -> Result<u32, StoreError> {
        self.meta.save_count += 1;
        self.meta.updated_at = unix_now();
        let save_index = self.meta.save_count;
        let filename = format!("{save_index:06}.scene.cbor.zst");
        let path = self.root.join("saves").join(&filename);

        let cbor_bytes = cbor_serialize(record)?;
        let compressed = zstd_compress(&cbor_bytes)?;

        let hash = sha256_hex(&compressed);
        let prev_hash = self.manifest.entries.last().map(|e| e.sha256.clone());

        std::fs::write(&path, &compressed)?;

        self.manifest.entries.push(ManifestEntry {
            filename,
            sha256: hash,
            prev_hash,
        });

        self.save_meta()?;
        self.save_manifest()?;
        Ok(save_index)
    }

    /// Load the most recent save.
    pub fn load_latest(&self) -> Result<SceneRecord, StoreError> {
        if self.meta.save_count == 0 {
            return Err(StoreError::NoSaves);
        }
        self.load_save(self.meta.save_count)
    }

    /// Load a specific save by 1-based index.
    pub fn load_save(&self, index: u32) -> Result<SceneRecord, StoreError> {
        let filename = format!("{index:06}.scene.cbor.zst");
        let path = self.root.join("saves").join(&filename);
        let compressed = std::fs::read(&path)?;

        self.verify_file_hash(&filename, &compressed)?;

        let cbor_bytes = zstd_decompress(&compressed)?;
        cbor_deserialize(&cbor_bytes)
    }

    /// Verify hash chain continuity and every payload hash in the manifest.
    pub fn verify_integrity(&self) -> Result<(), StoreError> {
        let mut prev_hash: Option<String> = None;
        for entry in &self.manifest.entries {
            if entry.prev_hash != prev_hash {
                return Err(StoreError::IntegrityMismatch {
                    expected: prev_hash.unwrap_or_else(|| "None".into()),
                    actual: entry.prev_hash.clone().unwrap_or_else(|| "None".into()),
                });
            }

            let path = self.root.join("saves").join(&entry.filename);
            let data = std::fs::read(&path)?;
            let actual_hash = sha256_hex(&data);
            if actual_hash != entry.sha256 {
                return Err(StoreError::IntegrityMismatch {
                    expected: entry.sha256.clone(),
                    actual: actual_hash,
                });
            }

            prev_hash = Some(entry.sha256.clone());
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta(&self) -> &ProjectMeta {
        &self.meta
    }

    fn verify_file_hash(&self, filename: &str, data: &[u8]) -> Result<(), StoreError> {
        let actual = sha256_hex(data);
        for entry in &self.manifest.entries {
            if entry.filename == filename {
                if entry.sha256 != actual {
                    return Err(StoreError::IntegrityMismatch {
                        expected: entry.sha256.clone(),
                        actual,
                    });
                }
                return Ok(());
            }
        }
        // Not in the manifest: tolerated for files created out of band.
        Ok(())
    }

    fn save_meta(&self) -> Result<(), StoreError> {
        let path = self.root.join("project.meta.json");
        serde_json::to_writer_pretty(std::fs::File::create(path)?, &self.meta)?;
        Ok(())
    }

    fn save_manifest(&self) -> Result<(), StoreError> {
        let path = self.root.join("integrity").join("manifest.json");
        serde_json::to_writer_pretty(std::fs::File::create(path)?, &self.manifest)?;
        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn cbor_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StoreError::CborEncode(e.to_string()))?;
    Ok(buf)
}

fn cbor_deserialize<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, StoreError> {
    ciborium::from_reader(data).map_err(|e| StoreError::CborDecode(e.to_string()))
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), 3)?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut decoder = zstd::Decoder::new(data)?;
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
