//! 本进程上传文件登记表：删除权限与“仅显示上传”列表过滤的依据。

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Absolute paths written by this server instance since start.
#[derive(Debug, Default)]
pub struct UploadRegistry {
    paths: RwLock<HashSet<PathBuf>>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, path: PathBuf) {
        self.paths.write().await.insert(path);
    }

    pub async fn contains(&self, path: &Path) -> bool {
        self.paths.read().await.contains(path)
    }

    /// 移除登记，返回该路径此前是否存在。
    pub async fn remove(&self, path: &Path) -> bool {
        self.paths.write().await.remove(path)
    }

    pub async fn len(&self) -> usize {
        self.paths.read().await.len()
    }
}
