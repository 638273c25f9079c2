// ==========================================
// 数字仓储批量导入导出系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分级: 结构性错误中止运行;配置错误同步抛出;
//       行级错误只进条目与计数器,不出循环
// ==========================================

use crate::mapping::resolver::MappingConfigError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误（致命/结构性）=====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 配置错误 =====
    #[error(transparent)]
    MappingConfig(#[from] MappingConfigError),

    // ===== 行级错误（由编排器捕获进条目,不向外传播）=====
    #[error("源标识缺失 (行 {row})")]
    MissingIdentifier { row: usize },

    #[error("条目建档失败 (identifier {identifier}): {message}")]
    EntryCreateError { identifier: String, message: String },

    // ===== 仓储错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 恢复文件错误 =====
    #[error("恢复文件写入失败: {0}")]
    RecoveryFileError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
