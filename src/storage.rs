use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// 基础目录及其下相对路径的解析。
#[derive(Clone, Debug)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// 将请求中的相对路径拼接到基础目录，拒绝 `..` 与绝对路径成分。
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let mut normalized = PathBuf::new();
        let trimmed = relative.trim_start_matches(['/', '\\']);
        for component in Path::new(trimmed).components() {
            match component {
                Component::Normal(segment) => normalized.push(segment),
                Component::CurDir => continue,
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(StorageError::InvalidPath);
                }
            }
        }

        Ok(self.root.join(normalized))
    }

    pub async fn remove_file(&self, target: &Path) -> Result<(), StorageError> {
        fs::remove_file(target).await?;
        Ok(())
    }
}

#[derive(Debug)]
pub enum StorageError {
    InvalidPath,
    Io(io::Error),
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        StorageError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::{Storage, StorageError};
    use std::path::PathBuf;

    #[test]
    fn resolve_joins_relative_to_root() {
        let storage = Storage::new(PathBuf::from("/srv/share"));
        let target = storage.resolve("/docs/./a.txt").expect("resolve");
        assert_eq!(target, PathBuf::from("/srv/share/docs/a.txt"));
        assert_eq!(storage.resolve("").expect("root"), PathBuf::from("/srv/share"));
    }

    #[test]
    fn resolve_rejects_parent_components() {
        let storage = Storage::new(PathBuf::from("/srv/share"));
        assert!(matches!(
            storage.resolve("docs/../../etc/passwd"),
            Err(StorageError::InvalidPath)
        ));
    }
}
