// ==========================================
// 数字仓储批量导入导出系统 - 导入编排器实现
// ==========================================
// 职责: 整合导入流程,从源文件到建档与作业派发
// 流程: 解析 → 分类 → 逐桶建档 → 计数落库
// 红线: 行级失败只进计数器与条目,不中断循环
// 红线: 结构性解析失败中止整个运行,记录一次
// ==========================================

use crate::classifier::RowClassifier;
use crate::config::field_mapping::ImporterConfig;
use crate::config::tenant::TenantContext;
use crate::domain::entry::{ClassifiedRecord, Entry, EntryError, Run};
use crate::domain::types::{DispatchMode, ObjectType, RelationKind, RunState};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::CsvParser;
use crate::importer::importer_trait::{BulkImporter, IdentifierGenerator};
use crate::importer::recovery;
use crate::jobs::JobDispatcher;
use crate::mapping::resolver::FieldMappingResolver;
use crate::repository::entry_repo::EntryRepository;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

// ==========================================
// RowOutcome - 单行处理结果
// ==========================================
// 显式结果类型,由桶循环聚合进计数器
enum RowOutcome {
    Created,                 // 建档成功,作业已派发
    Duplicate,               // 同桶内重复标识,静默跳过
    Failed(EntryError),      // 行级失败,原因入条目/计数器
}

// ==========================================
// BulkImporterImpl - 导入编排器
// ==========================================
pub struct BulkImporterImpl<R>
where
    R: EntryRepository,
{
    // 数据访问层
    entry_repo: R,

    // 运行配置（显式传入,不读全局状态）
    config: ImporterConfig,
    tenant: TenantContext,

    // 外部协作者
    job_dispatcher: Box<dyn JobDispatcher>,
    id_generator: Option<Box<dyn IdentifierGenerator>>,

    // 构造期解析的映射配置
    resolver: FieldMappingResolver,

    // 运行状态（单实例独占,无需加锁）
    run: Run,
    seen_collections: HashSet<String>,
    seen_works: HashSet<String>,
    seen_file_sets: HashSet<String>,
    source_headers: Vec<String>,
    classified_total: usize,
}

impl<R> BulkImporterImpl<R>
where
    R: EntryRepository,
{
    /// 创建导入编排器
    ///
    /// # 错误
    /// - 映射配置错误（如关系映射重复）在此同步抛出
    pub fn new(
        entry_repo: R,
        config: ImporterConfig,
        tenant: TenantContext,
        job_dispatcher: Box<dyn JobDispatcher>,
        id_generator: Option<Box<dyn IdentifierGenerator>>,
    ) -> ImportResult<Self> {
        let resolver =
            FieldMappingResolver::new(&config.field_mappings, &config.model_field_mappings)?;
        let owner_id = format!("importer_{}", config.id);
        let run = Run::new(owner_id);

        Ok(Self {
            entry_repo,
            config,
            tenant,
            job_dispatcher,
            id_generator,
            resolver,
            run,
            seen_collections: HashSet::new(),
            seen_works: HashSet::new(),
            seen_file_sets: HashSet::new(),
            source_headers: Vec::new(),
            classified_total: 0,
        })
    }

    /// 当前运行汇总
    pub fn run(&self) -> &Run {
        &self.run
    }

    /// 集合桶建档: 逐行解析标识 → 去重 → 建档 → 派发
    pub async fn create_collections(&mut self, records: &[ClassifiedRecord]) {
        self.process_bucket(records, "collections").await;
    }

    /// 作品桶建档: 额外支持空白标识生成器兜底
    pub async fn create_works(&mut self, records: &[ClassifiedRecord]) {
        self.process_bucket(records, "works").await;
    }

    /// 文件集桶建档: 额外记录父作品标识
    pub async fn create_file_sets(&mut self, records: &[ClassifiedRecord]) {
        self.process_bucket(records, "file_sets").await;
    }

    async fn process_bucket(&mut self, records: &[ClassifiedRecord], bucket: &'static str) {
        let mut created = 0usize;
        for record in records {
            // 每个"尝试行"恰好更新一次计数器;重复行不计数
            match self.process_record(record).await {
                RowOutcome::Created => {
                    created += 1;
                    self.run.succeeded_count += 1;
                }
                RowOutcome::Duplicate => {
                    debug!(bucket, "重复标识,跳过");
                }
                RowOutcome::Failed(cause) => {
                    warn!(bucket, kind = %cause.kind, reason = %cause.message, "行级失败");
                    self.run.failed_count += 1;
                }
            }
        }
        info!(bucket, attempted = records.len(), created, "分桶建档完成");
    }

    /// 单行建档,失败以结果返回,绝不让异常跳出循环
    async fn process_record(&mut self, record: &ClassifiedRecord) -> RowOutcome {
        let object_type = record.object_type;

        // === 标识解析: 映射/字面列 → 生成器兜底 → 失败 ===
        let identifier = match &record.source_identifier {
            Some(id) => Some(id.clone()),
            None => self
                .id_generator
                .as_ref()
                .map(|generator| generator.next_identifier(&record.row)),
        };

        let Some(identifier) = identifier else {
            return RowOutcome::Failed(EntryError::new(
                "MissingIdentifier",
                "源标识缺失且未配置生成器",
            ));
        };

        // === SeenSet 去重: 首次出现生效 ===
        if !self.seen_set_mut(object_type).insert(identifier.clone()) {
            return RowOutcome::Duplicate;
        }

        // === 建档 ===
        let mut entry = Entry::new(
            identifier.clone(),
            object_type,
            self.run.owner_id.clone(),
            self.run.run_id.clone(),
        );
        entry.raw_metadata = record.row.clone();
        if object_type == ObjectType::FileSet {
            entry.parent_identifier = self.resolve_parent_identifier(record);
        }

        match self.entry_repo.create_or_find_entry(entry).await {
            Ok((_stored, created)) => {
                if !created {
                    debug!(identifier = %identifier, "复用既有条目");
                }
                self.dispatch_job(object_type, &identifier).await;
                RowOutcome::Created
            }
            Err(e) => RowOutcome::Failed(EntryError::new("EntryCreateError", e.to_string())),
        }
    }

    /// 通过父关系映射解析文件集所属作品标识
    fn resolve_parent_identifier(&self, record: &ClassifiedRecord) -> Option<String> {
        let mapping = self.resolver.related_mapping(RelationKind::Parent);
        let column = mapping.raw_column.as_ref()?;
        record
            .row
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    }

    /// 按条目类别的配置调度模式派发创建作业
    async fn dispatch_job(&self, object_type: ObjectType, identifier: &str) {
        let mode = match object_type {
            ObjectType::Collection => self.config.dispatch.collections,
            ObjectType::Work => self.config.dispatch.works,
            ObjectType::FileSet => self.config.dispatch.file_sets,
        };

        match mode {
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
    }

    fn seen_set_mut(&mut self, object_type: ObjectType) -> &mut HashSet<String> {
        match object_type {
            ObjectType::Collection => &mut self.seen_collections,
            ObjectType::Work => &mut self.seen_works,
            ObjectType::FileSet => &mut self.seen_file_sets,
        }
    }

    fn run_dir(&self) -> PathBuf {
        recovery::import_run_dir(&self.tenant, self.config.id, self.config.created_at)
    }
}

#[async_trait]
impl<R> BulkImporter for BulkImporterImpl<R>
where
    R: EntryRepository,
{
    #[instrument(skip(self, file_path), fields(run_id = %self.run.run_id))]
    async fn import(&mut self, file_path: &Path) -> ImportResult<Run> {
        info!(file = %file_path.display(), "开始批量导入");
        self.run.state = RunState::Running;
        self.entry_repo.insert_run(&self.run).await?;

        // === 步骤 1: 解析文件（结构性失败中止运行）===
        let parser = CsvParser;
        let parsed = match parser.parse_to_rows(file_path) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(error = %e, "源文件解析失败,运行中止");
                self.run.state = RunState::Aborted;
                self.run.fatal_error = Some(e.to_string());
                self.run.finished_at = Some(Utc::now());
                self.entry_repo.update_run_summary(&self.run).await?;
                return Err(e);
            }
        };
        self.source_headers = parsed.headers.clone();

        // === 步骤 2: 行分类 ===
        let resolver = self.resolver.clone();
        let classifier = RowClassifier::new(parsed.rows, &resolver);
        let collections = classifier.collections().to_vec();
        let works = classifier.works().to_vec();
        let file_sets = classifier.file_sets().to_vec();
        self.classified_total = classifier.total_rows();

        self.run.total = self.total();
        self.run.collections_total = collections.len();
        info!(
            total = self.classified_total,
            collections = collections.len(),
            works = works.len(),
            file_sets = file_sets.len(),
            "行分类完成"
        );

        // === 步骤 3: 逐桶建档（源顺序,单线程确定性）===
        self.create_collections(&collections).await;
        self.create_works(&works).await;
        self.create_file_sets(&file_sets).await;

        // === 步骤 4: 汇总落库 ===
        self.run.state = RunState::Completed;
        self.run.finished_at = Some(Utc::now());
        self.entry_repo.update_run_summary(&self.run).await?;

        info!(
            total = self.run.total,
            succeeded = self.run.succeeded_count,
            failed = self.run.failed_count,
            collections_total = self.run.collections_total,
            "批量导入完成"
        );
        Ok(self.run.clone())
    }

    async fn write_errored_entries_file(&self) -> ImportResult<bool> {
        let failed = self.entry_repo.find_failed_entries(&self.run.owner_id).await?;

        // 集合失败走独立的重建路径,不进修正文件
        let non_collection: Vec<Entry> = failed
            .into_iter()
            .filter(|e| e.object_type != ObjectType::Collection)
            .collect();

        recovery::write_errored_entries_file(&self.run_dir(), &self.source_headers, &non_collection)
    }

    async fn write_partial_import_file(&self, uploaded_file: &Path) -> ImportResult<PathBuf> {
        recovery::write_partial_import_file(&self.run_dir(), uploaded_file)
    }

    fn total(&self) -> usize {
        self.config.total_override.unwrap_or(self.classified_total)
    }

    fn records_split_count(&self) -> usize {
        self.config.records_split_count
    }
}
