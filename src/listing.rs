//! 目录列表：条目元数据、搜索过滤与页面处理器。

use axum::extract::{Extension, Query};
use axum::http::{Method, Uri};
use axum::response::Html;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, error};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::icons::IconKind;
use crate::registry::UploadRegistry;
use crate::render::render_listing;
use crate::storage::{Storage, StorageError};

const KIB: u64 = 1024;
const MIB: u64 = KIB * 1024;
const GIB: u64 = MIB * 1024;

/// 单次列表请求中构造的条目。
#[derive(Clone, Debug)]
pub struct FileEntry {
    pub name: String,
    pub size: String,
    pub modified: String,
    pub icon: IconKind,
    pub is_dir: bool,
}

#[derive(Debug)]
pub struct Listing {
    /// 相对基础目录的路径，根目录为空串。
    pub rel_path: String,
    /// 上级目录；位于根目录时为 `None`，上级为根目录时为空串。
    pub parent_path: Option<String>,
    pub query: String,
    pub entries: Vec<FileEntry>,
}

#[derive(Deserialize, Default)]
pub(crate) struct ListQuery {
    #[serde(default)]
    q: String,
}

/// 目录浏览页面（`/` 及其子路径，作为路由回退）。
pub async fn index(
    method: Method,
    uri: Uri,
    Query(ListQuery { q }): Query<ListQuery>,
    Extension(config): Extension<Arc<ServerConfig>>,
    Extension(storage): Extension<Arc<Storage>>,
    Extension(registry): Extension<Arc<UploadRegistry>>,
) -> Result<Html<String>, ApiError> {
    if method != Method::GET && method != Method::HEAD {
        return Err(ApiError::MethodNotAllowed);
    }
    if config.upload_only {
        return Err(ApiError::Forbidden(
            "Access denied in upload-only mode".into(),
        ));
    }

    let decoded = urlencoding::decode(uri.path())
        .map_err(|_| ApiError::BadRequest("invalid path encoding".into()))?;
    let rel_path = decoded.trim_matches('/').to_string();
    let entries = list_directory(
        &storage,
        &registry,
        &rel_path,
        &q,
        config.uploads_only_listing,
    )
    .await
    .map_err(|err| match err {
        StorageError::Io(err) => {
            error!(path = rel_path, error = %err, "failed to list directory");
            ApiError::Internal("Failed to list directory".into())
        }
        other => ApiError::from(other),
    })?;
    debug!(path = rel_path, count = entries.len(), "list directory");

    let listing = Listing {
        parent_path: parent_path(&rel_path),
        rel_path,
        query: q,
        entries,
    };
    Ok(Html(render_listing(&listing, &config)))
}

/// 读取目录并构建过滤、排序后的条目列表。
///
/// 单个条目的元数据读取失败时跳过该条目，目录本身不可读时返回错误。
pub async fn list_directory(
    storage: &Storage,
    registry: &UploadRegistry,
    relative: &str,
    query: &str,
    uploads_only: bool,
) -> Result<Vec<FileEntry>, StorageError> {
    let target = storage.resolve(relative)?;
    let mut dir = fs::read_dir(&target).await?;
    let query = query.to_lowercase();
    let mut entries = Vec::new();

    while let Some(entry) = dir.next_entry().await? {
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        let name = entry.file_name().to_string_lossy().to_string();
        if !query.is_empty() && !name.to_lowercase().contains(&query) {
            continue;
        }
        if uploads_only && !registry.contains(&target.join(&name)).await {
            continue;
        }

        let is_dir = metadata.is_dir();
        let modified = metadata
            .modified()
            .map(format_mod_time)
            .unwrap_or_default();
        entries.push(FileEntry {
            icon: IconKind::classify(&name, is_dir),
            size: human_readable_size(metadata.len()),
            modified,
            is_dir,
            name,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// 字节数格式化为 B/KB/MB/GB，KB 以上保留一位小数。
pub fn human_readable_size(size: u64) -> String {
    if size < KIB {
        format!("{size} B")
    } else if size < MIB {
        format!("{:.1} KB", size as f64 / KIB as f64)
    } else if size < GIB {
        format!("{:.1} MB", size as f64 / MIB as f64)
    } else {
        format!("{:.1} GB", size as f64 / GIB as f64)
    }
}

fn format_mod_time(timestamp: SystemTime) -> String {
    let datetime: DateTime<Utc> = timestamp.into();
    datetime.format("%d %b %y %H:%M UTC").to_string()
}

/// 计算“返回上级”链接的目标。
pub fn parent_path(rel_path: &str) -> Option<String> {
    let trimmed = rel_path.trim_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.rsplit_once('/') {
        Some((parent, _)) => Some(parent.to_string()),
        None => Some(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn make_storage(files: &[&str]) -> (tempfile::TempDir, Storage) {
        let temp = tempdir().expect("tempdir");
        for name in files {
            std::fs::write(temp.path().join(name), name.as_bytes()).expect("write fixture");
        }
        let root = temp.path().to_path_buf();
        (temp, Storage::new(root))
    }

    fn names(entries: &[FileEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(human_readable_size(0), "0 B");
        assert_eq!(human_readable_size(1023), "1023 B");
        assert_eq!(human_readable_size(1024), "1.0 KB");
        assert_eq!(human_readable_size(1536), "1.5 KB");
        assert_eq!(human_readable_size(5 * MIB + MIB / 2), "5.5 MB");
        assert_eq!(human_readable_size(3 * GIB), "3.0 GB");
    }

    #[test]
    fn mod_time_uses_rfc822_layout() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).single().expect("ts");
        assert_eq!(format_mod_time(ts.into()), "09 Mar 24 14:05 UTC");
    }

    #[test]
    fn parent_path_normalizes_base() {
        assert_eq!(parent_path(""), None);
        assert_eq!(parent_path("docs"), Some(String::new()));
        assert_eq!(parent_path("docs/2024/"), Some("docs".to_string()));
    }

    #[tokio::test]
    async fn query_filters_case_insensitively_and_sorts() {
        let (_temp, storage) = make_storage(&["report.txt", "readme.md", "data.csv"]);
        let registry = UploadRegistry::new();
        let entries = list_directory(&storage, &registry, "", "RE", false)
            .await
            .expect("list");
        assert_eq!(names(&entries), vec!["readme.md", "report.txt"]);
        assert_eq!(entries[0].icon, IconKind::Text);
        assert_eq!(entries[0].size, "9 B");
    }

    #[tokio::test]
    async fn uploads_only_shows_registered_entries() {
        let (_temp, storage) = make_storage(&["old.txt", "new.txt", "other.bin"]);
        let registry = UploadRegistry::new();
        registry.insert(storage.root_path().join("new.txt")).await;
        registry.insert(storage.root_path().join("gone.txt")).await;

        let entries = list_directory(&storage, &registry, "", "", true)
            .await
            .expect("list");
        assert_eq!(names(&entries), vec!["new.txt"]);

        let entries = list_directory(&storage, &registry, "", "", false)
            .await
            .expect("list");
        assert_eq!(names(&entries), vec!["new.txt", "old.txt", "other.bin"]);
    }

    #[tokio::test]
    async fn lists_subdirectories_with_directory_icon() {
        let (temp, storage) = make_storage(&[]);
        std::fs::create_dir_all(temp.path().join("docs/inner.zip")).expect("mkdir");
        std::fs::write(temp.path().join("docs/a.py"), b"print()").expect("write");

        let entries = list_directory(&storage, &UploadRegistry::new(), "docs", "", false)
            .await
            .expect("list");
        assert_eq!(names(&entries), vec!["a.py", "inner.zip"]);
        assert_eq!(entries[0].icon, IconKind::Source);
        assert!(entries[1].is_dir);
        assert_eq!(entries[1].icon, IconKind::Directory);
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let (_temp, storage) = make_storage(&[]);
        let result = list_directory(&storage, &UploadRegistry::new(), "nope", "", false).await;
        assert!(matches!(result, Err(StorageError::Io(_))));
    }
}
