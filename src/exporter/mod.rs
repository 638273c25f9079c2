// ==========================================
// 数字仓储批量导入导出系统 - 导出层
// ==========================================
// 职责: 索引枚举、子对象解析、导出建档与文件就位
// ==========================================

// 模块声明
pub mod error;
pub mod exporter_impl;
pub mod exporter_trait;

// 重导出核心类型
pub use error::{ExportError, ExportResult};
pub use exporter_impl::BulkExporterImpl;

// 重导出 Trait 接口
pub use exporter_trait::{BulkExporter, ObjectStore, QueryCriteria, SearchIndex, StoredObject};
