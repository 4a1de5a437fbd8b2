use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tempfile::NamedTempFile;

/// Persistence hooks for committed geometry. Payloads are closed,
/// CRS-tagged GeoJSON documents.
pub trait ParcelStore {
    fn save_boundary(&mut self, geojson: &Value) -> Result<()>;
    fn save_parcels(&mut self, geojson: &Value) -> Result<()>;
}

/// Keeps the last saved documents in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub boundary: Option<Value>,
    pub parcels: Option<Value>,
}

impl ParcelStore for MemoryStore {
    fn save_boundary(&mut self, geojson: &Value) -> Result<()> {
        self.boundary = Some(geojson.clone());
        Ok(())
    }

    fn save_parcels(&mut self, geojson: &Value) -> Result<()> {
        self.parcels = Some(geojson.clone());
        Ok(())
    }
}

/// Writes `boundary.geojson` and `parcels.geojson` into a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    #[inline] pub fn boundary_path(&self) -> PathBuf { self.dir.join("boundary.geojson") }

    #[inline] pub fn parcels_path(&self) -> PathBuf { self.dir.join("parcels.geojson") }
}

impl ParcelStore for FileStore {
    fn save_boundary(&mut self, geojson: &Value) -> Result<()> {
        write_geojson_file(&self.boundary_path(), geojson)
    }

    fn save_parcels(&mut self, geojson: &Value) -> Result<()> {
        write_geojson_file(&self.parcels_path(), geojson)
    }
}

/// Read and parse a GeoJSON file.
pub fn read_geojson_file(path: &Path) -> Result<Value> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read GeoJSON file: {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse GeoJSON file: {}", path.display()))
}

/// Write a GeoJSON document by writing a temp file next to `path` and renaming it.
pub fn write_geojson_file(path: &Path, geojson: &Value) -> Result<()> {
    if path == Path::new("-") {
        bail!("stdout is not supported; provide a real file path.");
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("create dir {}", parent.display()))?;

    let mut tmp = NamedTempFile::new_in(parent).context("create temp file")?;
    serde_json::to_writer_pretty(&mut tmp, geojson).context("Failed to serialize GeoJSON")?;
    tmp.flush()?;
    tmp.as_file().sync_all().ok(); // best-effort fsync file
    tmp.persist(path)
        .with_context(|| format!("rename to {}", path.display()))?;

    let _ = File::open(parent).and_then(|f| f.sync_all());
    Ok(())
}
