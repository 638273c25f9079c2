// ==========================================
// 数字仓储批量导入导出系统 - 条目与运行领域模型
// ==========================================
// 用途: Entry 是单行/单标识的导入导出跟踪单元
//       Run 是单次导入或导出调用的聚合计数器
// 红线: Run 计数器只由持有它的编排器写入
// ==========================================

use crate::domain::types::{EntryStatus, ObjectType, RunState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 原始行: 列名 → 字符串值,读入后不可变
pub type Row = HashMap<String, String>;

// ==========================================
// EntryError - 条目级结构化失败原因
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryError {
    pub kind: String,    // 错误类别（如 MissingIdentifier / EntryCreateError）
    pub message: String, // 可读原因
}

impl EntryError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

// ==========================================
// Entry - 跟踪条目
// ==========================================
// 用途: 编排器建档,作业回调更新状态
// 对齐: entries 表 (owner_id, identifier, object_type 唯一)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    // ===== 标识 =====
    pub identifier: String,       // 源标识,单次运行内唯一
    pub object_type: ObjectType,  // Collection / Work / FileSet
    pub owner_id: String,         // 所属导入器/导出器标识
    pub run_id: String,           // 建档它的运行

    // ===== 元数据 =====
    pub raw_metadata: Row,                      // 原始行（导入路径）
    pub parsed_metadata: Vec<(String, String)>, // 映射展平输出（导出路径,保持首见顺序）
    pub parent_identifier: Option<String>,      // 父作品标识（FileSet 专用）

    // ===== 状态 =====
    pub status: EntryStatus,
    pub error: Option<EntryError>,

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// 新建待处理条目
    pub fn new(
        identifier: impl Into<String>,
        object_type: ObjectType,
        owner_id: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            identifier: identifier.into(),
            object_type,
            owner_id: owner_id.into(),
            run_id: run_id.into(),
            raw_metadata: Row::new(),
            parsed_metadata: Vec::new(),
            parent_identifier: None,
            status: EntryStatus::Pending,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// ==========================================
// Run - 单次导入/导出运行
// ==========================================
// 状态机: PENDING → RUNNING → {COMPLETED, ABORTED}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub run_id: String,
    pub owner_id: String,
    pub state: RunState,

    // ===== 聚合计数器 =====
    pub total: usize,
    pub succeeded_count: usize,
    pub failed_count: usize,
    pub collections_total: usize,

    // ===== 致命错误（仅结构性失败记录一次）=====
    pub fatal_error: Option<String>,

    // ===== 时间戳 =====
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Run {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            state: RunState::Pending,
            total: 0,
            succeeded_count: 0,
            failed_count: 0,
            collections_total: 0,
            fatal_error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}

// ==========================================
// ClassifiedRecord - 已分类行
// ==========================================
// 用途: 行分类器输出,两个编排器消费
// 说明: source_identifier 在此处只做映射/字面列解析,
//       空白标识的生成器兜底由导入编排器负责
#[derive(Debug, Clone)]
pub struct ClassifiedRecord {
    pub object_type: ObjectType,
    pub source_identifier: Option<String>,
    pub row: Row,
}
