// ==========================================
// 数字仓储批量导入导出系统 - 条目仓储 Trait
// ==========================================
// 职责: 定义条目/运行的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则,只做数据 CRUD
// ==========================================

use crate::domain::entry::{Entry, EntryError, Run};
use crate::domain::types::{EntryStatus, ObjectType};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// EntryRepository Trait
// ==========================================
// 用途: 条目与运行的持久化访问
// 实现者: SqliteEntryRepository（使用 rusqlite）
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// 按 (owner_id, identifier, object_type) 建档或复用既有条目
    ///
    /// # 返回
    /// - Ok((entry, created)): created=true 表示新建,false 表示复用
    async fn create_or_find_entry(&self, entry: Entry) -> RepositoryResult<(Entry, bool)>;

    /// 更新条目状态（作业完成回调路径）
    async fn update_entry_status(
        &self,
        owner_id: &str,
        identifier: &str,
        object_type: ObjectType,
        status: EntryStatus,
        error: Option<EntryError>,
    ) -> RepositoryResult<()>;

    /// 列出某 owner 的全部条目（建档顺序）
    async fn list_entries(&self, owner_id: &str) -> RepositoryResult<Vec<Entry>>;

    /// 查询某 owner 的失败条目（建档顺序）
    async fn find_failed_entries(&self, owner_id: &str) -> RepositoryResult<Vec<Entry>>;

    /// 插入运行记录
    async fn insert_run(&self, run: &Run) -> RepositoryResult<()>;

    /// 更新运行汇总（状态/计数器/时间戳）
    async fn update_run_summary(&self, run: &Run) -> RepositoryResult<()>;

    /// 读取运行记录
    async fn find_run(&self, run_id: &str) -> RepositoryResult<Option<Run>>;
}
