//! 删除处理：仅允许删除本进程上传的文件。

use axum::extract::{Extension, Query};
use axum::response::Redirect;
use axum_extra::extract::Form;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::registry::UploadRegistry;
use crate::storage::Storage;

#[derive(Deserialize)]
pub(crate) struct DeleteQuery {
    #[serde(default)]
    file: String,
}

/// 批量删除表单；兼容 `files` 与 `files[]` 两种字段名。
#[derive(Deserialize, Default)]
pub(crate) struct BulkDeleteForm {
    #[serde(default)]
    files: Vec<String>,
    #[serde(default, rename = "files[]")]
    files_bracketed: Vec<String>,
}

/// 批量删除中单个条目的处理结果。
#[derive(Debug, PartialEq, Eq)]
pub enum BulkOutcome {
    Deleted,
    NotPermitted,
    Failed,
}

/// 删除单个文件，成功后重定向到根目录。
pub async fn delete_file(
    Extension(config): Extension<Arc<ServerConfig>>,
    Extension(storage): Extension<Arc<Storage>>,
    Extension(registry): Extension<Arc<UploadRegistry>>,
    Query(DeleteQuery { file }): Query<DeleteQuery>,
) -> Result<Redirect, ApiError> {
    ensure_deletable(&config)?;
    let target = resolve_uploaded(&storage, &registry, &file)
        .await
        .ok_or_else(|| ApiError::Forbidden("Cannot delete existing file".into()))?;

    if let Err(err) = storage.remove_file(&target).await {
        error!(file, error = ?err, "failed to delete file");
        return Err(ApiError::Internal("Failed to delete file".into()));
    }
    registry.remove(&target).await;
    let remaining = registry.len().await;
    info!(file, remaining, "deleted");
    Ok(Redirect::to("/"))
}

/// 批量删除；未通过上传登记校验的条目被静默跳过。
pub async fn bulk_delete(
    Extension(config): Extension<Arc<ServerConfig>>,
    Extension(storage): Extension<Arc<Storage>>,
    Extension(registry): Extension<Arc<UploadRegistry>>,
    Form(form): Form<BulkDeleteForm>,
) -> Result<Redirect, ApiError> {
    ensure_deletable(&config)?;
    let files = form.files.into_iter().chain(form.files_bracketed);
    let mut deleted = 0usize;
    let mut skipped = 0usize;
    for file in files {
        match delete_one(&storage, &registry, &file).await {
            BulkOutcome::Deleted => deleted += 1,
            outcome => {
                debug!(file, ?outcome, "bulk delete skipped");
                skipped += 1;
            }
        }
    }
    info!(deleted, skipped, "bulk delete");
    Ok(Redirect::to("/"))
}

/// 对单个条目执行与单文件删除相同的校验与删除。
pub async fn delete_one(storage: &Storage, registry: &UploadRegistry, file: &str) -> BulkOutcome {
    let Some(target) = resolve_uploaded(storage, registry, file).await else {
        return BulkOutcome::NotPermitted;
    };
    match storage.remove_file(&target).await {
        Ok(()) => {
            registry.remove(&target).await;
            info!(file, "bulk deleted");
            BulkOutcome::Deleted
        }
        Err(err) => {
            error!(file, error = ?err, "bulk delete failed");
            BulkOutcome::Failed
        }
    }
}

fn ensure_deletable(config: &ServerConfig) -> Result<(), ApiError> {
    if config.read_only {
        return Err(ApiError::Forbidden(
            "Delete not allowed in read-only mode".into(),
        ));
    }
    Ok(())
}

async fn resolve_uploaded(
    storage: &Storage,
    registry: &UploadRegistry,
    file: &str,
) -> Option<PathBuf> {
    let target = storage.resolve(file).ok()?;
    registry.contains(&target).await.then_some(target)
}
