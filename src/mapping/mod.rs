// ==========================================
// 数字仓储批量导入导出系统 - 映射层
// ==========================================
// 职责: 字段映射配置的解析与导出展平
// 红线: 纯函数 + 构造期缓存,不做 I/O
// ==========================================

pub mod flattener;
pub mod resolver;

// 重导出核心类型
pub use flattener::{export_headers, flatten_field, flatten_metadata};
pub use resolver::{FieldMappingResolver, MappingConfigError, RelatedMapping};
