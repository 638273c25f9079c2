// ==========================================
// 数字仓储批量导入导出系统 - 数据仓储层
// ==========================================
// 职责: 提供条目/运行的数据访问接口,屏蔽数据库细节
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod entry_repo;
pub mod entry_repo_impl;
pub mod error;

// 重导出核心仓储
pub use entry_repo::EntryRepository;
pub use entry_repo_impl::SqliteEntryRepository;
pub use error::{RepositoryError, RepositoryResult};
