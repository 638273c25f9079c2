// ==========================================
// 数字仓储批量导入导出系统 - 导入层
// ==========================================
// 职责: 源文件解析、行分桶建档、恢复文件回写
// ==========================================

// 模块声明
pub mod error;
pub mod file_parser;
pub mod importer_impl;
pub mod importer_trait;
pub mod recovery;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ParsedRows};
pub use importer_impl::BulkImporterImpl;

// 重导出 Trait 接口
pub use importer_trait::{BulkImporter, IdentifierGenerator};
