// ==========================================
// 数字仓储批量导入导出系统 - 配置层
// ==========================================
// 职责: 运行级配置的类型化定义
// 红线: 配置作为构造参数显式传入,不做全局读取
// ==========================================

pub mod field_mapping;
pub mod tenant;

// 重导出核心配置类型
pub use field_mapping::{
    DispatchPolicy, ExporterConfig, FieldMapping, FieldMappingConfig, ImporterConfig,
    DEFAULT_RECORDS_SPLIT_COUNT,
};
pub use tenant::TenantContext;
