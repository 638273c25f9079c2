// ==========================================
// 数字仓储批量导入导出系统 - 导出接口定义
// ==========================================
// 职责: 定义导出编排接口与导出侧外部协作者接口
//       （不包含实现）
// 红线: 对象存储与搜索索引只在接口边界出现,
//       其持久化/索引实现不属于本核心
// ==========================================

use crate::domain::entry::Run;
use crate::domain::types::{ExportScope, ObjectType};
use crate::exporter::error::ExportResult;
use async_trait::async_trait;
use std::path::PathBuf;

// ==========================================
// QueryCriteria - 索引查询条件
// ==========================================
// 按对象类型分桶 + 导出器配置范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCriteria {
    pub object_type: ObjectType,
    pub scope: ExportScope,
}

// ==========================================
// SearchIndex Trait
// ==========================================
// 用途: 枚举导出候选对象标识
// 实现者: 外部搜索索引（测试中为固定表假对象）
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn query(&self, criteria: &QueryCriteria) -> ExportResult<Vec<String>>;
}

// ==========================================
// StoredObject - 对象存储返回的仓储对象
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct StoredObject {
    pub identifier: String,
    /// 挂接的文件集标识
    pub file_set_ids: Vec<String>,
    /// 语义字段元数据（导出展平输入）
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

// ==========================================
// ObjectStore Trait
// ==========================================
// 用途: 按标识取仓储对象（仅导出路径使用）
// 实现者: 外部对象存储
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn find(&self, identifier: &str) -> ExportResult<Option<StoredObject>>;
}

// ==========================================
// BulkExporter Trait
// ==========================================
// 用途: 导出编排主接口
// 实现者: BulkExporterImpl
#[async_trait]
pub trait BulkExporter: Send {
    /// 查询索引 → 解析子文件集 → 建档 → 派发导出作业
    ///
    /// # 约束
    /// - 配置的 limit 是跨桶合计的作业上限;0 表示不设限
    /// - 达到上限后不再解析剩余标识（含未派发作品的文件集）
    async fn create_new_entries(&mut self) -> ExportResult<Run>;

    /// 通过对象存储解析作品挂接的文件集标识
    ///
    /// # 幂等
    /// - 已取过的作品不再访问对象存储
    ///
    /// # 返回
    /// - 累计的文件集标识列表（保持解析顺序,去重）
    async fn find_child_file_sets(&mut self, work_identifiers: &[String])
        -> ExportResult<Vec<String>>;

    /// 计算并就位本次导出的输出文件（含表头行）
    ///
    /// # 路径（逐位一致）
    /// - tmp/exports/<accountId>/<siteId>/<runIndex>/export_<label>.csv
    async fn setup_export_file(&self, run_index: usize) -> ExportResult<PathBuf>;

    /// 运行总数: 配置上限优先（非零）,否则为已解析标识数
    fn total(&self) -> usize;

    /// 内部分批行数（默认 1000）
    fn records_split_count(&self) -> usize;
}
