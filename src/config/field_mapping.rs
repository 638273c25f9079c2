// ==========================================
// 数字仓储批量导入导出系统 - 字段映射配置
// ==========================================
// 职责: 语义字段 → 源列映射规则的类型化配置
// 红线: 配置在运行开始时一次性提供,此后只读
// ==========================================
// 说明: 原系统以动态散列遍历读取标志位,这里改为
//       固定形状的记录 + 运行启动时一次索引扫描
// ==========================================

use crate::domain::types::{DispatchMode, ExportScope};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 内部分批处理的默认行数
pub const DEFAULT_RECORDS_SPLIT_COUNT: usize = 1000;

fn default_records_split_count() -> usize {
    DEFAULT_RECORDS_SPLIT_COUNT
}

// ==========================================
// FieldMapping - 单个语义字段的映射规则
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldMapping {
    /// 源列名（有序,首个命中的非空列生效）
    #[serde(default)]
    pub from: Vec<String>,

    /// 该字段提供源标识 (source_identifier)
    #[serde(default)]
    pub source_identifier: bool,

    /// 该字段由系统合成,导入时跳过字面映射
    #[serde(default)]
    pub generated: bool,

    /// 该字段承载父对象关系（全配置中至多一个）
    #[serde(default)]
    pub related_parents_field_mapping: bool,

    /// 该字段承载子对象关系（全配置中至多一个）
    #[serde(default)]
    pub related_children_field_mapping: bool,

    /// 多值拆分/拼接定界符
    #[serde(default)]
    pub split: Option<String>,

    /// 将多个映射列归入同一个可重复子对象组
    #[serde(default)]
    pub object: Option<String>,

    /// 标记字段在对象组内是可重复数组
    #[serde(default)]
    pub nested_type: Option<String>,
}

/// 全量字段映射: 语义字段名 → 映射规则
/// BTreeMap 保证扫描顺序确定
pub type FieldMappingConfig = BTreeMap<String, FieldMapping>;

// ==========================================
// DispatchPolicy - 按条目类别的调度模式
// ==========================================
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DispatchPolicy {
    #[serde(default)]
    pub collections: DispatchMode,
    #[serde(default)]
    pub works: DispatchMode,
    #[serde(default)]
    pub file_sets: DispatchMode,
}

// ==========================================
// ImporterConfig - 导入器配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImporterConfig {
    /// 导入器标识（恢复文件路径组成部分）
    pub id: i64,

    /// 导入器创建时间（恢复文件路径组成部分,压缩格式 %Y%m%d%H%M%S）
    pub created_at: DateTime<Utc>,

    /// 字段映射配置
    #[serde(default)]
    pub field_mappings: FieldMappingConfig,

    /// 模型解析列（总以字面列 model 终结,见 FieldMappingResolver）
    #[serde(default)]
    pub model_field_mappings: Vec<String>,

    /// 作业调度策略
    #[serde(default)]
    pub dispatch: DispatchPolicy,

    /// 显式配置的总数（存在时覆盖分类行数）
    #[serde(default)]
    pub total_override: Option<usize>,

    /// 内部分批行数
    #[serde(default = "default_records_split_count")]
    pub records_split_count: usize,
}

impl ImporterConfig {
    pub fn new(id: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            field_mappings: FieldMappingConfig::new(),
            model_field_mappings: Vec::new(),
            dispatch: DispatchPolicy::default(),
            total_override: None,
            records_split_count: DEFAULT_RECORDS_SPLIT_COUNT,
        }
    }
}

// ==========================================
// ExporterConfig - 导出器配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// 导出器标识
    pub id: i64,

    /// 导出文件名标签: export_<label>.csv
    pub label: String,

    /// 导出范围
    #[serde(default)]
    pub scope: ExportScope,

    /// 导出作业总数上限,跨桶合计;0 表示不设限
    #[serde(default)]
    pub limit: usize,

    /// 字段映射配置（导出展平使用）
    #[serde(default)]
    pub field_mappings: FieldMappingConfig,

    /// 导出作业调度模式
    #[serde(default)]
    pub dispatch: DispatchMode,

    /// 内部分批行数
    #[serde(default = "default_records_split_count")]
    pub records_split_count: usize,
}

impl ExporterConfig {
    pub fn new(id: i64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            scope: ExportScope::All,
            limit: 0,
            field_mappings: FieldMappingConfig::new(),
            dispatch: DispatchMode::Deferred,
            records_split_count: DEFAULT_RECORDS_SPLIT_COUNT,
        }
    }
}
