//! Year/month bucketed local storage.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::LocalStorageError;
use crate::attachment::{AttachmentRecord, FileContent, UploadRequest};
use crate::naming::SafeName;

/// Fresh names tried before a bucket is reported as full.
const MAX_NAME_ATTEMPTS: usize = 8;

/// Allocates paths for non-image uploads and moves content into place.
#[derive(Debug, Clone)]
pub struct LocalPathAllocator {
    base_dir: PathBuf,
}

impl LocalPathAllocator {
    /// Create an allocator rooted at the host's upload directory.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Root upload directory.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Bucket directory for the given date: `{base_dir}/{YYYY}/{MM}`.
    #[must_use]
    pub fn bucket_dir(&self, date: NaiveDate) -> PathBuf {
        self.base_dir
            .join(format!("{:04}", date.year()))
            .join(format!("{:02}", date.month()))
    }

    /// Collision-resistant filename: CRC-32 of a fresh UUID plus the extension.
    #[must_use]
    pub fn generate_file_name(ext: &str) -> String {
        let checksum = crc32fast::hash(Uuid::new_v4().as_bytes());
        if ext.is_empty() {
            checksum.to_string()
        } else {
            format!("{checksum}.{ext}")
        }
    }

    /// Create `dir` and its parents unless it already exists.
    ///
    /// Losing a creation race to another request is not an error.
    pub async fn ensure_dir(dir: &Path) -> Result<(), LocalStorageError> {
        if fs::metadata(dir).await.is_ok_and(|m| m.is_dir()) {
            return Ok(());
        }

        match fs::create_dir_all(dir).await {
            Ok(()) => Ok(()),
            Err(_) if fs::metadata(dir).await.is_ok_and(|m| m.is_dir()) => Ok(()),
            Err(e) => Err(LocalStorageError::storage_unavailable(dir, e)),
        }
    }

    /// Claim a new file in `dir`, asking `next_name` for another name
    /// whenever the previous one is taken.
    ///
    /// The file is created exclusively, so an existing upload is never
    /// overwritten.
    pub async fn reserve(
        dir: &Path,
        ext: &str,
        mut next_name: impl FnMut(&str) -> String,
    ) -> Result<(PathBuf, File), LocalStorageError> {
        let mut last = None;
        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = dir.join(next_name(ext));
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "Generated name taken, retrying");
                    last = Some(path);
                }
                Err(e) => return Err(LocalStorageError::write_failed(&path, e)),
            }
        }

        Err(LocalStorageError::write_failed(
            last.unwrap_or_else(|| dir.to_path_buf()),
            io::Error::new(io::ErrorKind::AlreadyExists, "no free file name"),
        ))
    }

    /// Store an upload in the current month's bucket.
    ///
    /// Temporary files are moved into place; buffers are written. A failed
    /// write leaves nothing behind in the bucket.
    pub async fn store(
        &self,
        file: &SafeName,
        request: UploadRequest,
    ) -> Result<AttachmentRecord, LocalStorageError> {
        let dir = self.bucket_dir(Local::now().date_naive());
        Self::ensure_dir(&dir).await?;

        let (path, dest) = Self::reserve(&dir, &file.extension, Self::generate_file_name).await?;
        if let Err(e) = write_content(request.content, dest, &path).await {
            if let Err(cleanup) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %cleanup, "Partial upload not removed");
            }
            return Err(LocalStorageError::write_failed(&path, e));
        }

        let size = match request.declared_size {
            Some(size) => size,
            None => fs::metadata(&path)
                .await
                .map(|m| m.len())
                .map_err(|e| LocalStorageError::write_failed(&path, e))?,
        };

        let mime = mime_guess::from_path(&path)
            .first()
            .map(|m| m.essence_str().to_string());

        info!(path = %path.display(), size, "Stored upload on local disk");

        Ok(AttachmentRecord {
            name: file.file_name.clone(),
            path: path.display().to_string(),
            size,
            file_type: file.extension.clone(),
            mime,
            remote: None,
        })
    }

    /// Whether `path` names an entry strictly inside the upload directory.
    ///
    /// Both sides are canonicalized, so `..` segments and symlinks that lead
    /// elsewhere are rejected. A missing file is judged by its parent
    /// directory.
    pub async fn contains(&self, path: &Path) -> bool {
        let Ok(base) = fs::canonicalize(&self.base_dir).await else {
            return false;
        };

        let resolved = match fs::canonicalize(path).await {
            Ok(resolved) => resolved,
            Err(_) => {
                let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
                    return false;
                };
                match fs::canonicalize(parent).await {
                    Ok(parent) => parent.join(name),
                    Err(_) => return false,
                }
            }
        };

        resolved != base && resolved.starts_with(&base)
    }

    /// Delete a stored file.
    ///
    /// A file that is already gone is reported as an error.
    pub async fn remove(&self, path: &Path) -> Result<(), LocalStorageError> {
        fs::remove_file(path)
            .await
            .map_err(|e| LocalStorageError::delete_failed(path, e))?;
        info!(path = %path.display(), "Deleted local upload");
        Ok(())
    }
}

/// Fill the reserved file at `dest`.
async fn write_content(content: FileContent, mut file: File, dest: &Path) -> io::Result<()> {
    match content {
        FileContent::Path(src) => {
            drop(file);
            if let Err(e) = fs::rename(&src, dest).await {
                // rename cannot cross filesystems
                debug!(error = %e, "Rename failed, falling back to copy");
                fs::copy(&src, dest).await?;
                if let Err(e) = fs::remove_file(&src).await {
                    warn!(src = %src.display(), error = %e, "Upload copied but temporary file not removed");
                }
            }
            Ok(())
        }
        FileContent::Bytes(bytes) => {
            file.write_all(&bytes).await?;
            file.flush().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn safe(name: &str) -> SafeName {
        SafeName::parse(name)
    }

    #[test]
    fn test_bucket_dir_format() {
        let allocator = LocalPathAllocator::new("/srv/usr/uploads");
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).expect("valid date");
        assert_eq!(
            allocator.bucket_dir(date),
            PathBuf::from("/srv/usr/uploads/2026/03")
        );
    }

    #[test]
    fn test_generate_file_name() {
        let name = LocalPathAllocator::generate_file_name("pdf");
        let (stem, ext) = name.split_once('.').expect("has extension");
        assert_eq!(ext, "pdf");
        assert!(stem.parse::<u32>().is_ok());

        let bare = LocalPathAllocator::generate_file_name("");
        assert!(bare.parse::<u32>().is_ok());
    }

    #[test]
    fn test_generated_names_differ() {
        let a = LocalPathAllocator::generate_file_name("txt");
        let b = LocalPathAllocator::generate_file_name("txt");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_store_bytes() {
        let root = TempDir::new().expect("tempdir");
        let allocator = LocalPathAllocator::new(root.path());

        let request = UploadRequest::from_bytes("notes.txt", &b"hello"[..]);
        let record = allocator
            .store(&safe("notes.txt"), request)
            .await
            .expect("store");

        let today = Local::now().date_naive();
        let path = PathBuf::from(&record.path);
        assert!(path.starts_with(allocator.bucket_dir(today)));
        assert_eq!(fs::read(&path).await.expect("read"), b"hello");
        assert_eq!(record.name, "notes.txt");
        assert_eq!(record.size, 5);
        assert_eq!(record.file_type, "txt");
        assert_eq!(record.mime.as_deref(), Some("text/plain"));
        assert!(record.remote.is_none());
    }

    #[tokio::test]
    async fn test_store_moves_temp_file() {
        let root = TempDir::new().expect("tempdir");
        let tmp = root.path().join("php_upload.tmp");
        fs::write(&tmp, b"%PDF-1.7").await.expect("write tmp");

        let allocator = LocalPathAllocator::new(root.path().join("uploads"));
        let record = allocator
            .store(&safe("Report.PDF"), UploadRequest::from_path("Report.PDF", &tmp))
            .await
            .expect("store");

        assert!(!tmp.exists(), "temporary file should be moved");
        assert_eq!(record.size, 8);
        assert_eq!(record.file_type, "pdf");
        assert!(record.path.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_store_missing_temp_file_fails() {
        let root = TempDir::new().expect("tempdir");
        let allocator = LocalPathAllocator::new(root.path());

        let request = UploadRequest::from_path("gone.txt", root.path().join("missing.tmp"));
        let err = allocator
            .store(&safe("gone.txt"), request)
            .await
            .unwrap_err();
        assert!(matches!(err, LocalStorageError::WriteFailed { .. }));

        // the reserved name is released again
        let bucket = allocator.bucket_dir(Local::now().date_naive());
        let mut entries = fs::read_dir(&bucket).await.expect("bucket exists");
        assert!(entries.next_entry().await.expect("read bucket").is_none());
    }

    #[tokio::test]
    async fn test_reserve_skips_taken_name() {
        let root = TempDir::new().expect("tempdir");
        let taken = root.path().join("1.txt");
        fs::write(&taken, b"first upload").await.expect("write");

        let mut names = ["1.txt", "2.txt"].into_iter();
        let (path, _file) = LocalPathAllocator::reserve(root.path(), "txt", |_| {
            names.next().unwrap_or("3.txt").to_string()
        })
        .await
        .expect("reserve");

        assert_eq!(path, root.path().join("2.txt"));
        assert_eq!(fs::read(&taken).await.expect("read"), b"first upload");
    }

    #[tokio::test]
    async fn test_reserve_gives_up_when_every_name_is_taken() {
        let root = TempDir::new().expect("tempdir");
        let taken = root.path().join("1.txt");
        fs::write(&taken, b"first upload").await.expect("write");

        let err = LocalPathAllocator::reserve(root.path(), "txt", |_| "1.txt".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, LocalStorageError::WriteFailed { .. }));
        assert_eq!(fs::read(&taken).await.expect("read"), b"first upload");
    }

    #[tokio::test]
    async fn test_unwritable_base_dir_is_unavailable() {
        let root = TempDir::new().expect("tempdir");
        let blocker = root.path().join("blocker");
        fs::write(&blocker, b"not a dir").await.expect("write");

        let allocator = LocalPathAllocator::new(&blocker);
        let err = allocator
            .store(&safe("a.txt"), UploadRequest::from_bytes("a.txt", &b"x"[..]))
            .await
            .unwrap_err();
        assert!(matches!(err, LocalStorageError::StorageUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_ensure_dir_is_idempotent() {
        let root = TempDir::new().expect("tempdir");
        let dir = root.path().join("2026").join("10");
        LocalPathAllocator::ensure_dir(&dir).await.expect("first");
        LocalPathAllocator::ensure_dir(&dir).await.expect("second");
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_contains() {
        let root = TempDir::new().expect("tempdir");
        let outside = TempDir::new().expect("tempdir");
        let base = root.path().join("uploads");
        let allocator = LocalPathAllocator::new(&base);
        let record = allocator
            .store(&safe("a.txt"), UploadRequest::from_bytes("a.txt", &b"x"[..]))
            .await
            .expect("store");
        let victim = outside.path().join("precious.conf");
        fs::write(&victim, b"keep").await.expect("write");

        assert!(allocator.contains(Path::new(&record.path)).await);
        let bucket = allocator.bucket_dir(Local::now().date_naive());
        assert!(allocator.contains(&bucket.join("not-yet-written.txt")).await);
        assert!(!allocator.contains(&base).await);
        assert!(!allocator.contains(&victim).await);
        assert!(!allocator.contains(&base.join("..").join("uploads-sibling.txt")).await);
        assert!(!allocator.contains(&base.join("no-such-dir").join("x.txt")).await);
    }

    #[tokio::test]
    async fn test_remove_missing_file_fails() {
        let root = TempDir::new().expect("tempdir");
        let allocator = LocalPathAllocator::new(root.path());
        let err = allocator
            .remove(&root.path().join("nope.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, LocalStorageError::DeleteFailed { .. }));
    }
}
