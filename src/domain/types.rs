// ==========================================
// 数字仓储批量导入导出系统 - 领域类型定义
// ==========================================
// 依据: 仓储对象模型 - 三类对象分桶体系
// 红线: 分类是全函数,无法识别的模型一律归为 Work
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 对象类型 (Object Type)
// ==========================================
// 红线: 每行恰好一个类型标签,三桶划分不重不漏
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Collection, // 集合
    Work,       // 作品（默认桶）
    FileSet,    // 文件集
}

impl ObjectType {
    /// 按模型列取值解析对象类型（大小写不敏感）
    ///
    /// # 规则
    /// - "collection"（任意大小写）→ Collection
    /// - "fileset"（任意大小写）→ FileSet
    /// - 其他值（含空值）→ Work
    pub fn from_model_value(value: &str) -> Self {
        let v = value.trim();
        if v.eq_ignore_ascii_case("collection") {
            ObjectType::Collection
        } else if v.eq_ignore_ascii_case("fileset") {
            ObjectType::FileSet
        } else {
            ObjectType::Work
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Collection => "Collection",
            ObjectType::Work => "Work",
            ObjectType::FileSet => "FileSet",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 条目状态 (Entry Status)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Pending,   // 已建档,等待作业完成
    Succeeded, // 作业回调确认成功
    Failed,    // 行级失败,原因记录在 error 字段
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Pending => write!(f, "PENDING"),
            EntryStatus::Succeeded => write!(f, "SUCCEEDED"),
            EntryStatus::Failed => write!(f, "FAILED"),
        }
    }
}

// ==========================================
// 运行状态 (Run State)
// ==========================================
// 状态机: PENDING → RUNNING → {COMPLETED, ABORTED}
// 红线: ABORTED 仅由致命结构错误触发,行级失败不中止运行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Pending => write!(f, "PENDING"),
            RunState::Running => write!(f, "RUNNING"),
            RunState::Completed => write!(f, "COMPLETED"),
            RunState::Aborted => write!(f, "ABORTED"),
        }
    }
}

// ==========================================
// 作业调度模式 (Dispatch Mode)
// ==========================================
// 由配置按条目类别指定,本核心不做决策
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchMode {
    Immediate, // 进程内立即执行
    Deferred,  // 队列异步执行
}

impl Default for DispatchMode {
    fn default() -> Self {
        DispatchMode::Deferred
    }
}

// ==========================================
// 关系映射方向 (Relation Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    Parent, // 父对象映射 (related_parents_field_mapping)
    Child,  // 子对象映射 (related_children_field_mapping)
}

impl RelationKind {
    /// 未配置关系映射时的默认解析字段名
    pub fn default_parsed_field(&self) -> &'static str {
        match self {
            RelationKind::Parent => "parents",
            RelationKind::Child => "children",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::Parent => write!(f, "parent"),
            RelationKind::Child => write!(f, "child"),
        }
    }
}

// ==========================================
// 导出范围 (Export Scope)
// ==========================================
// 导出器配置目标: 全部 / 指定集合 / 指定作品类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportScope {
    All,
    Collection(String), // 集合标识
    WorkType(String),   // 作品类型名
}

impl Default for ExportScope {
    fn default() -> Self {
        ExportScope::All
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_type_case_insensitive() {
        assert_eq!(ObjectType::from_model_value("Collection"), ObjectType::Collection);
        assert_eq!(ObjectType::from_model_value("COLLECTION"), ObjectType::Collection);
        assert_eq!(ObjectType::from_model_value("cOllEcTiOn"), ObjectType::Collection);
        assert_eq!(ObjectType::from_model_value("FileSet"), ObjectType::FileSet);
        assert_eq!(ObjectType::from_model_value("fileset"), ObjectType::FileSet);
    }

    #[test]
    fn test_object_type_default_work() {
        assert_eq!(ObjectType::from_model_value(""), ObjectType::Work);
        assert_eq!(ObjectType::from_model_value("Image"), ObjectType::Work);
        assert_eq!(ObjectType::from_model_value("  "), ObjectType::Work);
    }

    #[test]
    fn test_relation_kind_default_field() {
        assert_eq!(RelationKind::Parent.default_parsed_field(), "parents");
        assert_eq!(RelationKind::Child.default_parsed_field(), "children");
    }
}
