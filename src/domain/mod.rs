// ==========================================
// 数字仓储批量导入导出系统 - 领域层
// ==========================================
// 职责: 领域实体与类型定义,不含业务流程
// ==========================================

pub mod entry;
pub mod types;

// 重导出核心类型
pub use entry::{ClassifiedRecord, Entry, EntryError, Row, Run};
pub use types::{DispatchMode, EntryStatus, ExportScope, ObjectType, RelationKind, RunState};
