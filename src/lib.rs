// ==========================================
// 数字仓储批量导入导出系统 - 核心库
// ==========================================
// 系统定位: 表格源文件 → 行分类 → 建档 → 作业派发
// 边界: 对象持久化/搜索索引/作业执行均为外部协作者,
//       本核心只决定建什么、以何标识、属何类型,并汇总成败
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 配置层 - 运行级配置
pub mod config;

// 映射层 - 字段映射解析与导出展平
pub mod mapping;

// 行分类器
pub mod classifier;

// 数据仓储层 - 条目/运行持久化
pub mod repository;

// 导入层 - 源文件到建档
pub mod importer;

// 导出层 - 索引枚举到导出文件
pub mod exporter;

// 作业调度边界
pub mod jobs;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    DispatchMode, EntryStatus, ExportScope, ObjectType, RelationKind, RunState,
};

// 领域实体
pub use domain::{ClassifiedRecord, Entry, EntryError, Row, Run};

// 配置
pub use config::{
    DispatchPolicy, ExporterConfig, FieldMapping, FieldMappingConfig, ImporterConfig,
    TenantContext,
};

// 映射
pub use mapping::{export_headers, FieldMappingResolver, MappingConfigError, RelatedMapping};

// 分类器
pub use classifier::RowClassifier;

// 仓储
pub use repository::{EntryRepository, RepositoryError, SqliteEntryRepository};

// 导入/导出编排
pub use exporter::{
    BulkExporter, BulkExporterImpl, ExportError, ObjectStore, QueryCriteria, SearchIndex,
    StoredObject,
};
pub use importer::{BulkImporter, BulkImporterImpl, CsvParser, IdentifierGenerator, ImportError};

// 作业调度
pub use jobs::JobDispatcher;
