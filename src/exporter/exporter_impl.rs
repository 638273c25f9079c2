// ==========================================
// 数字仓储批量导入导出系统 - 导出编排器实现
// ==========================================
// 职责: 索引枚举 → 子文件集解析 → 建档 → 导出作业派发
// 流程: 集合桶 → 作品桶 → 文件集桶,跨桶合计上限
// 红线: 上限耗尽即停,未派发作品的文件集不再解析
// 红线: 单标识失败只进计数器,不中断循环
// ==========================================

use crate::config::field_mapping::ExporterConfig;
use crate::config::tenant::TenantContext;
use crate::domain::entry::{Entry, Run};
use crate::domain::types::{DispatchMode, ExportScope, ObjectType, RunState};
use crate::exporter::error::ExportResult;
use crate::exporter::exporter_trait::{
    BulkExporter, ObjectStore, QueryCriteria, SearchIndex, StoredObject,
};
use crate::jobs::JobDispatcher;
use crate::mapping::flattener::{export_headers, flatten_metadata};
use crate::repository::entry_repo::EntryRepository;
use async_trait::async_trait;
use chrono::Utc;
use csv::WriterBuilder;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

// ==========================================
// BulkExporterImpl - 导出编排器
// ==========================================
pub struct BulkExporterImpl<R>
where
    R: EntryRepository,
{
    // 数据访问层
    entry_repo: R,

    // 运行配置
    config: ExporterConfig,
    tenant: TenantContext,

    // 外部协作者
    search_index: Box<dyn SearchIndex>,
    object_store: Box<dyn ObjectStore>,
    job_dispatcher: Box<dyn JobDispatcher>,

    // 运行状态（单实例独占,无需加锁）
    run: Run,
    dispatched: usize,
    resolved_total: usize,
    seen_collections: HashSet<String>,
    seen_works: HashSet<String>,
    seen_file_sets: HashSet<String>,

    // find_child_file_sets 幂等状态
    fetched_works: HashSet<String>,
    resolved_file_set_ids: Vec<String>,
    resolved_file_set_seen: HashSet<String>,
}

impl<R> BulkExporterImpl<R>
where
    R: EntryRepository,
{
    pub fn new(
        entry_repo: R,
        config: ExporterConfig,
        tenant: TenantContext,
        search_index: Box<dyn SearchIndex>,
        object_store: Box<dyn ObjectStore>,
        job_dispatcher: Box<dyn JobDispatcher>,
    ) -> Self {
        let owner_id = format!("exporter_{}", config.id);
        let run = Run::new(owner_id);

        Self {
            entry_repo,
            config,
            tenant,
            search_index,
            object_store,
            job_dispatcher,
            run,
            dispatched: 0,
            resolved_total: 0,
            seen_collections: HashSet::new(),
            seen_works: HashSet::new(),
            seen_file_sets: HashSet::new(),
            fetched_works: HashSet::new(),
            resolved_file_set_ids: Vec::new(),
            resolved_file_set_seen: HashSet::new(),
        }
    }

    /// 当前运行汇总
    pub fn run(&self) -> &Run {
        &self.run
    }

    /// 已派发的导出作业数
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    fn limit_reached(&self) -> bool {
        self.config.limit > 0 && self.dispatched >= self.config.limit
    }

    fn criteria(&self, object_type: ObjectType) -> QueryCriteria {
        QueryCriteria {
            object_type,
            scope: self.config.scope.clone(),
        }
    }

    fn seen_set_mut(&mut self, object_type: ObjectType) -> &mut HashSet<String> {
        match object_type {
            ObjectType::Collection => &mut self.seen_collections,
            ObjectType::Work => &mut self.seen_works,
            ObjectType::FileSet => &mut self.seen_file_sets,
        }
    }

    /// 单标识建档 + 派发;返回是否派发了作业
    async fn materialize(&mut self, identifier: &str, object_type: ObjectType) -> bool {
        if self.limit_reached() {
            return false;
        }
        // 同类型重复标识只建档一次
        if !self.seen_set_mut(object_type).insert(identifier.to_string()) {
            return false;
        }

        let entry = match self.build_entry(identifier, object_type).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(identifier, error = %e, "导出条目构建失败");
                self.run.failed_count += 1;
                return false;
            }
        };

        match self.entry_repo.create_or_find_entry(entry).await {
            Ok((_stored, created)) => {
                if !created {
                    debug!(identifier, "复用既有导出条目");
                }
                match self.config.dispatch {
                    DispatchMode::Immediate => {
                        self.job_dispatcher
                            .enqueue_now(identifier, &self.run.run_id)
                            .await
                    }
                    DispatchMode::Deferred => {
                        self.job_dispatcher
                            .enqueue_later(identifier, &self.run.run_id)
                            .await
                    }
                }
                self.dispatched += 1;
                self.run.succeeded_count += 1;
                true
            }
            Err(e) => {
                warn!(identifier, error = %e, "导出条目建档失败");
                self.run.failed_count += 1;
                false
            }
        }
    }

    /// 从对象存储取元数据并展平为导出列
    async fn build_entry(&self, identifier: &str, object_type: ObjectType) -> ExportResult<Entry> {
        let stored = self.object_store.find(identifier).await?;

        let mut entry = Entry::new(
            identifier,
            object_type,
            self.run.owner_id.clone(),
            self.run.run_id.clone(),
        );

        // id 与 model 恒为前两列,其余按映射展平
        entry.parsed_metadata = vec![
            ("id".to_string(), identifier.to_string()),
            ("model".to_string(), object_type.as_str().to_string()),
        ];
        if let Some(StoredObject { metadata, .. }) = stored {
            entry
                .parsed_metadata
                .extend(flatten_metadata(&self.config.field_mappings, &metadata));
        }

        Ok(entry)
    }
}

#[async_trait]
impl<R> BulkExporter for BulkExporterImpl<R>
where
    R: EntryRepository,
{
    #[instrument(skip(self), fields(run_id = %self.run.run_id))]
    async fn create_new_entries(&mut self) -> ExportResult<Run> {
        info!(scope = ?self.config.scope, limit = self.config.limit, "开始批量导出");
        self.run.state = RunState::Running;
        self.entry_repo.insert_run(&self.run).await?;

        // === 集合桶 ===
        let collection_ids = self
            .search_index
            .query(&self.criteria(ObjectType::Collection))
            .await?;
        self.resolved_total += collection_ids.len();
        self.run.collections_total = collection_ids.len();
        for id in &collection_ids {
            if self.limit_reached() {
                break;
            }
            self.materialize(id, ObjectType::Collection).await;
        }

        // === 作品桶 ===
        let work_ids = self
            .search_index
            .query(&self.criteria(ObjectType::Work))
            .await?;
        self.resolved_total += work_ids.len();
        let mut dispatched_works = Vec::new();
        for id in &work_ids {
            if self.limit_reached() {
                break;
            }
            if self.materialize(id, ObjectType::Work).await {
                dispatched_works.push(id.clone());
            }
        }

        // === 文件集桶 ===
        // 上限耗尽后不再解析,未派发作品的文件集永不访问
        let mut file_set_ids = Vec::new();
        if !self.limit_reached() {
            if self.config.scope == ExportScope::All {
                let indexed = self
                    .search_index
                    .query(&self.criteria(ObjectType::FileSet))
                    .await?;
                file_set_ids.extend(indexed);
            }
            let children = self.find_child_file_sets(&dispatched_works).await?;
            for child in children {
                if !file_set_ids.contains(&child) {
                    file_set_ids.push(child);
                }
            }
        }
        self.resolved_total += file_set_ids.len();
        for id in &file_set_ids {
            if self.limit_reached() {
                break;
            }
            self.materialize(id, ObjectType::FileSet).await;
        }

        // === 汇总落库 ===
        self.run.total = self.total();
        self.run.state = RunState::Completed;
        self.run.finished_at = Some(Utc::now());
        self.entry_repo.update_run_summary(&self.run).await?;

        info!(
            total = self.run.total,
            dispatched = self.dispatched,
            succeeded = self.run.succeeded_count,
            failed = self.run.failed_count,
            "批量导出完成"
        );
        Ok(self.run.clone())
    }

    async fn find_child_file_sets(
        &mut self,
        work_identifiers: &[String],
    ) -> ExportResult<Vec<String>> {
        for work_id in work_identifiers {
            // 已取过的作品不再访问对象存储
            if !self.fetched_works.insert(work_id.clone()) {
                continue;
            }

            match self.object_store.find(work_id).await {
                Ok(Some(object)) => {
                    for fs_id in object.file_set_ids {
                        if self.resolved_file_set_seen.insert(fs_id.clone()) {
                            self.resolved_file_set_ids.push(fs_id);
                        }
                    }
                }
                Ok(None) => {
                    debug!(%work_id, "对象存储未找到作品,无子文件集");
                }
                Err(e) => {
                    // 单作品解析失败不中断其余作品
                    warn!(%work_id, error = %e, "子文件集解析失败");
                    self.run.failed_count += 1;
                }
            }
        }

        Ok(self.resolved_file_set_ids.clone())
    }

    async fn setup_export_file(&self, run_index: usize) -> ExportResult<PathBuf> {
        let dir = self.tenant.export_prefix().join(run_index.to_string());
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("export_{}.csv", self.config.label));

        // 表头来自已建档条目的解析元数据样本
        let entries = self.entry_repo.list_entries(&self.run.owner_id).await?;
        let headers = export_headers(entries.iter().map(|e| &e.parsed_metadata));

        let mut writer = WriterBuilder::new().from_path(&path)?;
        writer.write_record(&headers)?;
        writer.flush()?;

        info!(path = %path.display(), columns = headers.len(), "导出文件已就位");
        Ok(path)
    }

    fn total(&self) -> usize {
        if self.config.limit > 0 {
            self.config.limit
        } else {
            self.resolved_total
        }
    }

    fn records_split_count(&self) -> usize {
        self.config.records_split_count
    }
}
