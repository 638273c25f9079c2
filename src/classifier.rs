// ==========================================
// 数字仓储批量导入导出系统 - 行分类器
// ==========================================
// 职责: 将全量行按模型列划分为 集合/作品/文件集 三桶
// 红线: 划分不重不漏;分类是行+配置的纯函数
// 红线: 懒计算一次并缓存,访问器不重扫行集
// ==========================================

use crate::domain::entry::{ClassifiedRecord, Row};
use crate::domain::types::ObjectType;
use crate::mapping::resolver::FieldMappingResolver;
use std::sync::OnceLock;
use tracing::debug;

// ==========================================
// Partition - 三桶划分结果
// ==========================================
#[derive(Debug, Default)]
struct Partition {
    collections: Vec<ClassifiedRecord>,
    works: Vec<ClassifiedRecord>,
    file_sets: Vec<ClassifiedRecord>,
}

// ==========================================
// RowClassifier - 行分类器
// ==========================================
pub struct RowClassifier<'a> {
    rows: Vec<Row>,
    resolver: &'a FieldMappingResolver,
    partition: OnceLock<Partition>,
}

impl<'a> RowClassifier<'a> {
    pub fn new(rows: Vec<Row>, resolver: &'a FieldMappingResolver) -> Self {
        Self {
            rows,
            resolver,
            partition: OnceLock::new(),
        }
    }

    /// 集合桶（按源顺序）
    pub fn collections(&self) -> &[ClassifiedRecord] {
        &self.partition().collections
    }

    /// 作品桶（按源顺序,默认桶）
    pub fn works(&self) -> &[ClassifiedRecord] {
        &self.partition().works
    }

    /// 文件集桶（按源顺序）
    pub fn file_sets(&self) -> &[ClassifiedRecord] {
        &self.partition().file_sets
    }

    /// 全量行数
    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    fn partition(&self) -> &Partition {
        self.partition
            .get_or_init(|| Self::classify(&self.rows, self.resolver))
    }

    /// 单一类型解析规则: 首个非空模型列取值,大小写不敏感匹配
    fn classify(rows: &[Row], resolver: &FieldMappingResolver) -> Partition {
        let mut partition = Partition::default();

        for row in rows {
            let object_type = resolver
                .resolve_model_value(row)
                .map(ObjectType::from_model_value)
                .unwrap_or(ObjectType::Work);

            let record = ClassifiedRecord {
                object_type,
                source_identifier: resolver.resolve_source_identifier(row),
                row: row.clone(),
            };

            match object_type {
                ObjectType::Collection => partition.collections.push(record),
                ObjectType::Work => partition.works.push(record),
                ObjectType::FileSet => partition.file_sets.push(record),
            }
        }

        debug!(
            collections = partition.collections.len(),
            works = partition.works.len(),
            file_sets = partition.file_sets.len(),
            "行分类完成"
        );

        partition
    }
}
