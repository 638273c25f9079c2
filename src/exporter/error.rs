// ==========================================
// 数字仓储批量导入导出系统 - 导出模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::mapping::resolver::MappingConfigError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导出模块错误类型
#[derive(Error, Debug)]
pub enum ExportError {
    // ===== 外部边界错误 =====
    #[error("索引查询失败: {0}")]
    IndexQueryError(String),

    #[error("对象存储访问失败 (identifier {identifier}): {message}")]
    ObjectStoreError { identifier: String, message: String },

    // ===== 导出文件错误 =====
    #[error("导出文件写入失败: {0}")]
    FileWriteError(String),

    // ===== 配置错误 =====
    #[error(transparent)]
    MappingConfig(#[from] MappingConfigError),

    // ===== 仓储错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::FileWriteError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::FileWriteError(err.to_string())
    }
}

/// Result 类型别名
pub type ExportResult<T> = Result<T, ExportError>;
