//! JSON 持久化存储 - 业务能力层
//!
//! 每个集合一个 JSON 文件（`<目录>/<集合>.json`），内容是
//! id → 记录 的对象。写入先落临时文件再原子重命名，读方永远
//! 看不到写到一半的文件；文件损坏时整体隔离（改名备份）而不是
//! 让进程崩溃，存储从空状态继续服务。

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};

/// JSON 记录存储
#[derive(Debug, Clone)]
pub struct JsonStore {
    storage_dir: PathBuf,
}

impl JsonStore {
    /// 打开（必要时创建）存储目录
    pub async fn open(storage_dir: impl AsRef<Path>) -> AppResult<Self> {
        let storage_dir = storage_dir.as_ref().to_path_buf();

        fs::create_dir_all(&storage_dir)
            .await
            .map_err(|e| AppError::storage_write_failed(storage_dir.display().to_string(), e))?;

        info!("存储目录就绪: {}", storage_dir.display());

        Ok(Self { storage_dir })
    }

    /// 写入一条记录
    pub async fn put<T: Serialize>(&self, collection: &str, id: &str, record: &T) -> AppResult<()> {
        let mut data = self.load_collection(collection).await?;
        data.insert(id.to_string(), serde_json::to_value(record)?);
        self.save_collection(collection, &data).await?;

        debug!("已写入记录 {}/{}", collection, id);
        Ok(())
    }

    /// 读取一条记录，不存在时返回 None
    pub async fn get<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> AppResult<Option<T>> {
        let data = self.load_collection(collection).await?;

        match data.get(id) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// 列出集合内全部记录
    pub async fn list<T: DeserializeOwned>(&self, collection: &str) -> AppResult<Vec<T>> {
        let data = self.load_collection(collection).await?;

        data.into_iter()
            .map(|(_, value)| serde_json::from_value(value).map_err(AppError::from))
            .collect()
    }

    /// 删除一条记录，返回是否存在过
    pub async fn delete(&self, collection: &str, id: &str) -> AppResult<bool> {
        let mut data = self.load_collection(collection).await?;

        if data.remove(id).is_some() {
            self.save_collection(collection, &data).await?;
            debug!("已删除记录 {}/{}", collection, id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn file_path(&self, collection: &str) -> PathBuf {
        self.storage_dir.join(format!("{}.json", collection))
    }

    /// 读入整个集合
    ///
    /// 文件不存在 → 空集合；文件损坏 → 隔离后从空集合继续
    async fn load_collection(&self, collection: &str) -> AppResult<Map<String, Value>> {
        let path = self.file_path(collection);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Map::new());
            }
            Err(e) => {
                return Err(AppError::storage_read_failed(path.display().to_string(), e));
            }
        };

        match serde_json::from_str::<Map<String, Value>>(&content) {
            Ok(data) => Ok(data),
            Err(e) => {
                warn!("集合 '{}' 的存储文件损坏: {}", collection, e);
                self.quarantine(collection, &path).await?;
                Ok(Map::new())
            }
        }
    }

    /// 把损坏的集合文件改名备份，原路径让出来继续服务
    async fn quarantine(&self, collection: &str, path: &Path) -> AppResult<()> {
        let backup = self.storage_dir.join(format!(
            "{}.backup_{}.json",
            collection,
            chrono::Utc::now().timestamp()
        ));

        fs::rename(path, &backup).await.map_err(|e| {
            AppError::Storage(crate::error::StorageError::QuarantineFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })?;

        warn!("⚠️ 损坏文件已隔离至: {}", backup.display());
        Ok(())
    }

    /// 先写临时文件，再原子重命名到目标路径
    async fn save_collection(
        &self,
        collection: &str,
        data: &Map<String, Value>,
    ) -> AppResult<()> {
        let path = self.file_path(collection);
        let tmp_path = self.storage_dir.join(format!("{}.tmp", collection));

        let content = serde_json::to_string_pretty(data)?;

        fs::write(&tmp_path, content)
            .await
            .map_err(|e| AppError::storage_write_failed(tmp_path.display().to_string(), e))?;

        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| AppError::storage_write_failed(path.display().to_string(), e))?;

        Ok(())
    }
}
