use crate::error::{CreateUploadDirSnafu, StudentsResult, WriteUploadSnafu};
use axum::body::Bytes;
use snafu::ResultExt;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use time::OffsetDateTime;

#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Puts uploaded images on disk, under `<epoch millis>-<original file name>`.
#[derive(Clone, Debug)]
pub struct UploadSink {
    dir: Arc<PathBuf>,
}

impl UploadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Arc::new(dir.into()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    ///returns the path the file ended up at, which is what gets stored on the student
    pub async fn store(
        &self,
        UploadedFile { file_name, bytes }: UploadedFile,
    ) -> StudentsResult<String> {
        tokio::fs::create_dir_all(self.dir())
            .await
            .context(CreateUploadDirSnafu {
                path: self.dir().to_path_buf(),
            })?;

        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let path = self
            .dir()
            .join(format!("{millis}-{}", sanitise_file_name(&file_name)));

        tokio::fs::write(&path, &bytes)
            .await
            .context(WriteUploadSnafu { path: path.clone() })?;

        info!(?path, size = bytes.len(), "Stored upload");
        Ok(path.to_string_lossy().into_owned())
    }

    ///best-effort, for when whatever the file was meant for fell over
    pub async fn discard(&self, stored_path: &str) {
        match tokio::fs::remove_file(stored_path).await {
            Ok(()) => debug!(?stored_path, "Discarded orphaned upload"),
            Err(e) => warn!(?e, ?stored_path, "Unable to discard orphaned upload"),
        }
    }
}

///only keep the last path component - browsers on windows like to send `C:\fakepath\...`
fn sanitise_file_name(original: &str) -> &str {
    let last = original.rsplit(['/', '\\']).next().unwrap_or(original);
    if last.is_empty() || last == "." || last == ".." {
        "upload"
    } else {
        last
    }
}
