// ==========================================
// 数字仓储批量导入导出系统 - 字段映射解析器
// ==========================================
// 职责: 对字段映射配置做一次索引扫描,
//       提供模型列/关系映射/合成字段/源标识查询
// 红线: 标志位查询在构造时解析一次,之后不再重扫配置
// 红线: 同一关系方向配置多个映射是配置错误,同步抛给调用方
// ==========================================

use crate::config::field_mapping::FieldMappingConfig;
use crate::domain::entry::Row;
use crate::domain::types::RelationKind;
use std::collections::HashSet;
use thiserror::Error;

/// 模型解析兜底的字面列名
const MODEL_COLUMN: &str = "model";

/// 字面源标识列名
const SOURCE_IDENTIFIER_COLUMN: &str = "source_identifier";

// ==========================================
// MappingConfigError - 映射配置错误
// ==========================================
#[derive(Error, Debug)]
pub enum MappingConfigError {
    #[error("关系映射重复配置 ({kind}): 字段 {first} 与 {second} 均带有该标志")]
    DuplicateRelatedMapping {
        kind: RelationKind,
        first: String,
        second: String,
    },
}

// ==========================================
// RelatedMapping - 关系映射解析结果
// ==========================================
// raw_column: 源列名,未配置时为 None
// parsed_field: 解析字段名,未配置时为默认名 parents/children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedMapping {
    pub raw_column: Option<String>,
    pub parsed_field: String,
}

// ==========================================
// FieldMappingResolver - 字段映射解析器
// ==========================================
// 所有查询在 new 中一次性计算并缓存,实例生命周期内不变
#[derive(Debug, Clone)]
pub struct FieldMappingResolver {
    model_fields: Vec<String>,
    parents: RelatedMapping,
    children: RelatedMapping,
    generated: HashSet<String>,
    source_identifier_columns: Vec<String>,
}

impl FieldMappingResolver {
    /// 构建解析器（单次索引扫描）
    ///
    /// # 参数
    /// - config: 字段映射配置
    /// - model_field_mappings: 配置的模型解析列（可为空）
    ///
    /// # 错误
    /// - DuplicateRelatedMapping: 同一关系方向配置了多个映射
    pub fn new(
        config: &FieldMappingConfig,
        model_field_mappings: &[String],
    ) -> Result<Self, MappingConfigError> {
        // 模型列: 配置列表 + 字面列 model 终结
        let mut model_fields: Vec<String> = model_field_mappings.to_vec();
        if !model_fields.iter().any(|c| c == MODEL_COLUMN) {
            model_fields.push(MODEL_COLUMN.to_string());
        }

        let mut parents: Option<(String, RelatedMapping)> = None;
        let mut children: Option<(String, RelatedMapping)> = None;
        let mut generated = HashSet::new();
        let mut source_identifier_columns = Vec::new();

        for (field, mapping) in config {
            if mapping.related_parents_field_mapping {
                let related = RelatedMapping {
                    raw_column: mapping.from.first().cloned(),
                    parsed_field: field.clone(),
                };
                if let Some((first, _)) = &parents {
                    return Err(MappingConfigError::DuplicateRelatedMapping {
                        kind: RelationKind::Parent,
                        first: first.clone(),
                        second: field.clone(),
                    });
                }
                parents = Some((field.clone(), related));
            }

            if mapping.related_children_field_mapping {
                let related = RelatedMapping {
                    raw_column: mapping.from.first().cloned(),
                    parsed_field: field.clone(),
                };
                if let Some((first, _)) = &children {
                    return Err(MappingConfigError::DuplicateRelatedMapping {
                        kind: RelationKind::Child,
                        first: first.clone(),
                        second: field.clone(),
                    });
                }
                children = Some((field.clone(), related));
            }

            if mapping.generated {
                generated.insert(field.clone());
            }

            if mapping.source_identifier && source_identifier_columns.is_empty() {
                if mapping.from.is_empty() {
                    // 无源列的标识映射按字段名取列
                    source_identifier_columns.push(field.clone());
                } else {
                    source_identifier_columns.extend(mapping.from.iter().cloned());
                }
            }
        }

        let default_related = |kind: RelationKind| RelatedMapping {
            raw_column: None,
            parsed_field: kind.default_parsed_field().to_string(),
        };

        Ok(Self {
            model_fields,
            parents: parents
                .map(|(_, m)| m)
                .unwrap_or_else(|| default_related(RelationKind::Parent)),
            children: children
                .map(|(_, m)| m)
                .unwrap_or_else(|| default_related(RelationKind::Child)),
            generated,
            source_identifier_columns,
        })
    }

    /// 模型解析列（有序,以字面列 model 终结）
    pub fn model_field_mappings(&self) -> &[String] {
        &self.model_fields
    }

    /// 关系映射查询（构造时已缓存,不重扫配置）
    pub fn related_mapping(&self, kind: RelationKind) -> &RelatedMapping {
        match kind {
            RelationKind::Parent => &self.parents,
            RelationKind::Child => &self.children,
        }
    }

    /// 合成字段集合（导入时跳过字面映射）
    pub fn generated_field_names(&self) -> &HashSet<String> {
        &self.generated
    }

    /// 从行中解析源标识
    ///
    /// # 顺序
    /// 1. 带 source_identifier 标志的映射列（按 from 顺序取首个非空）
    /// 2. 字面列 source_identifier
    /// 3. None（生成器兜底由编排器负责）
    pub fn resolve_source_identifier(&self, row: &Row) -> Option<String> {
        for column in &self.source_identifier_columns {
            if let Some(value) = row.get(column) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }

        row.get(SOURCE_IDENTIFIER_COLUMN)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    }

    /// 从行中读取模型列取值（首个非空列生效）
    pub fn resolve_model_value<'a>(&self, row: &'a Row) -> Option<&'a str> {
        for column in &self.model_fields {
            if let Some(value) = row.get(column) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::field_mapping::FieldMapping;

    fn mapping_with(f: impl FnOnce(&mut FieldMapping)) -> FieldMapping {
        let mut m = FieldMapping::default();
        f(&mut m);
        m
    }

    #[test]
    fn test_model_fields_default() {
        let config = FieldMappingConfig::new();
        let resolver = FieldMappingResolver::new(&config, &[]).unwrap();
        assert_eq!(resolver.model_field_mappings(), &["model".to_string()]);
    }

    #[test]
    fn test_model_fields_terminated_by_model() {
        let config = FieldMappingConfig::new();
        let configured = vec!["work_type".to_string(), "type".to_string()];
        let resolver = FieldMappingResolver::new(&config, &configured).unwrap();
        assert_eq!(
            resolver.model_field_mappings(),
            &["work_type".to_string(), "type".to_string(), "model".to_string()]
        );
    }

    #[test]
    fn test_related_mapping_defaults() {
        let config = FieldMappingConfig::new();
        let resolver = FieldMappingResolver::new(&config, &[]).unwrap();

        let parents = resolver.related_mapping(RelationKind::Parent);
        assert_eq!(parents.raw_column, None);
        assert_eq!(parents.parsed_field, "parents");

        let children = resolver.related_mapping(RelationKind::Child);
        assert_eq!(children.raw_column, None);
        assert_eq!(children.parsed_field, "children");
    }

    #[test]
    fn test_related_mapping_configured() {
        let mut config = FieldMappingConfig::new();
        config.insert(
            "parents".to_string(),
            mapping_with(|m| {
                m.from = vec!["parent_column".to_string()];
                m.related_parents_field_mapping = true;
            }),
        );

        let resolver = FieldMappingResolver::new(&config, &[]).unwrap();
        let parents = resolver.related_mapping(RelationKind::Parent);
        assert_eq!(parents.raw_column.as_deref(), Some("parent_column"));
        assert_eq!(parents.parsed_field, "parents");
    }

    #[test]
    fn test_related_mapping_duplicate_is_config_error() {
        let mut config = FieldMappingConfig::new();
        config.insert(
            "parents_a".to_string(),
            mapping_with(|m| m.related_parents_field_mapping = true),
        );
        config.insert(
            "parents_b".to_string(),
            mapping_with(|m| m.related_parents_field_mapping = true),
        );

        let result = FieldMappingResolver::new(&config, &[]);
        assert!(matches!(
            result,
            Err(MappingConfigError::DuplicateRelatedMapping {
                kind: RelationKind::Parent,
                ..
            })
        ));
    }

    #[test]
    fn test_related_mapping_cached_between_calls() {
        let mut config = FieldMappingConfig::new();
        config.insert(
            "children".to_string(),
            mapping_with(|m| {
                m.from = vec!["child_column".to_string()];
                m.related_children_field_mapping = true;
            }),
        );

        let resolver = FieldMappingResolver::new(&config, &[]).unwrap();
        let first = resolver.related_mapping(RelationKind::Child).clone();
        let second = resolver.related_mapping(RelationKind::Child);
        // 第二次调用返回同一缓存结果
        assert_eq!(&first, second);
        assert!(std::ptr::eq(
            resolver.related_mapping(RelationKind::Child),
            resolver.related_mapping(RelationKind::Child)
        ));
    }

    #[test]
    fn test_generated_field_names() {
        let mut config = FieldMappingConfig::new();
        config.insert(
            "file_url".to_string(),
            mapping_with(|m| m.generated = true),
        );
        config.insert("title".to_string(), FieldMapping::default());

        let resolver = FieldMappingResolver::new(&config, &[]).unwrap();
        assert!(resolver.generated_field_names().contains("file_url"));
        assert!(!resolver.generated_field_names().contains("title"));
    }

    #[test]
    fn test_source_identifier_from_flagged_mapping() {
        let mut config = FieldMappingConfig::new();
        config.insert(
            "identifier".to_string(),
            mapping_with(|m| {
                m.from = vec!["object_id".to_string()];
                m.source_identifier = true;
            }),
        );

        let resolver = FieldMappingResolver::new(&config, &[]).unwrap();
        let mut row = Row::new();
        row.insert("object_id".to_string(), " obj-1 ".to_string());
        assert_eq!(resolver.resolve_source_identifier(&row), Some("obj-1".to_string()));
    }

    #[test]
    fn test_source_identifier_literal_column_fallback() {
        let config = FieldMappingConfig::new();
        let resolver = FieldMappingResolver::new(&config, &[]).unwrap();

        let mut row = Row::new();
        row.insert("source_identifier".to_string(), "obj-2".to_string());
        assert_eq!(resolver.resolve_source_identifier(&row), Some("obj-2".to_string()));

        let empty = Row::new();
        assert_eq!(resolver.resolve_source_identifier(&empty), None);
    }

    #[test]
    fn test_resolve_model_value_first_populated_wins() {
        let config = FieldMappingConfig::new();
        let configured = vec!["work_type".to_string()];
        let resolver = FieldMappingResolver::new(&config, &configured).unwrap();

        let mut row = Row::new();
        row.insert("work_type".to_string(), "".to_string());
        row.insert("model".to_string(), "Collection".to_string());
        assert_eq!(resolver.resolve_model_value(&row), Some("Collection"));

        row.insert("work_type".to_string(), "FileSet".to_string());
        assert_eq!(resolver.resolve_model_value(&row), Some("FileSet"));
    }
}
