//! 上传目标文件的独占创建：重名时改名，失败时清理。

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs::{self, File, OpenOptions};

use crate::error::ApiError;

const MAX_CREATE_ATTEMPTS: usize = 8;

/// 以 create-new 方式打开的目标文件，不会覆盖已有文件。
pub struct ExclusiveFile {
    path: PathBuf,
    file: File,
}

impl ExclusiveFile {
    /// 在目录中创建 `filename`；已存在同名文件时在扩展名前插入时间戳后缀。
    pub async fn create(dir: &Path, filename: &str) -> Result<Self, ApiError> {
        let mut candidate = dir.join(filename);
        for _ in 0..MAX_CREATE_ATTEMPTS {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(file) => {
                    return Ok(Self {
                        path: candidate,
                        file,
                    });
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    candidate = dir.join(collision_name(filename, unix_nanos()));
                }
                Err(err) => return Err(ApiError::Internal(err.to_string())),
            }
        }
        Err(ApiError::Internal("Failed to save file".into()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 返回目标文件的可写句柄。
    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }

    /// 放弃写入并删除已创建的文件。
    pub async fn cleanup(self) {
        drop(self.file);
        let _ = fs::remove_file(&self.path).await;
    }

    /// 同步到磁盘并返回最终路径。
    pub async fn finalize(self) -> Result<PathBuf, ApiError> {
        if let Err(err) = self.file.sync_all().await {
            let _ = fs::remove_file(&self.path).await;
            return Err(ApiError::Internal(err.to_string()));
        }
        Ok(self.path)
    }
}

/// `report.pdf` -> `report_<nanos>.pdf`
pub fn collision_name(filename: &str, nanos: u128) -> String {
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_else(|| filename.into());
    match path.extension() {
        Some(ext) => format!("{stem}_{nanos}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{nanos}"),
    }
}

fn unix_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default()
}
