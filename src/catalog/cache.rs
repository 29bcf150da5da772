use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};

use crate::catalog::error::CatalogError;
use crate::catalog::loader::split_lines;

const CACHE_FILE_PREFIX: &str = "satellite_";

/// Local copies of downloaded catalogs, one file per source.
pub struct CatalogCache {
    dir: PathBuf,
}

impl CatalogCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, filename: &str) -> PathBuf {
        self.dir.join(format!("{}{}", CACHE_FILE_PREFIX, filename))
    }

    /// Last modification time of a cached catalog, if present.
    pub fn modified(&self, filename: &str) -> Option<DateTime<Utc>> {
        let modified = fs::metadata(self.path(filename)).ok()?.modified().ok()?;
        Some(DateTime::<Utc>::from(modified))
    }

    /// Record lines of a cached catalog, `None` if it has not been cached.
    pub fn read_lines(&self, filename: &str) -> Result<Option<Vec<String>>, CatalogError> {
        match fs::read(self.path(filename)) {
            Ok(bytes) => Ok(Some(split_lines(&String::from_utf8_lossy(&bytes)))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace a cached catalog with freshly downloaded bytes.
    pub fn write(&self, filename: &str, bytes: &[u8]) -> Result<(), CatalogError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(filename), bytes)?;
        Ok(())
    }
}

/// Cache filename for a catalog URL: its trailing path segment, with
/// characters that are unsafe in filenames replaced.
pub fn cache_filename(url: &str) -> String {
    let segment = url.rsplit('/').next().unwrap_or_default();
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn is_stale(age: Duration, threshold: Duration) -> bool {
    age > threshold
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

    /// A fresh, empty directory under the system temp dir.
    pub fn scratch_dir(tag: &str) -> PathBuf {
        let n = NEXT_DIR.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "sat-o-scope-{}-{}-{}",
            tag,
            std::process::id(),
            n
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }
}
