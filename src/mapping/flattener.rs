// ==========================================
// 数字仓储批量导入导出系统 - 导出展平器
// ==========================================
// 职责: (1) 语义字段值 → 带序号后缀的导出列
//       (2) 从已建档条目样本归并导出表头
// 约束: 表头以 id, model 开头,其余保持首见顺序去重
// 约束: 后缀在展平阶段生成 (field_1 / field_1_2),
//       表头归并阶段只做去重排序,不再造后缀
// ==========================================

use crate::config::field_mapping::{FieldMapping, FieldMappingConfig};
use serde_json::Value;
use std::collections::HashSet;

/// 表头固定前两列
const HEADER_ID: &str = "id";
const HEADER_MODEL: &str = "model";

/// 从条目样本的解析元数据归并导出表头
///
/// # 参数
/// - samples: 每个条目的解析元数据键值对（键已含序号后缀）
///
/// # 返回
/// - 去重后的列名序列,id 与 model 恒在最前,其余按首见顺序
pub fn export_headers<'a, I>(samples: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Vec<(String, String)>>,
{
    let mut headers = vec![HEADER_ID.to_string(), HEADER_MODEL.to_string()];
    let mut seen: HashSet<String> = headers.iter().cloned().collect();

    for sample in samples {
        for (key, _) in sample {
            if seen.insert(key.clone()) {
                headers.push(key.clone());
            }
        }
    }

    headers
}

/// 展平单个语义字段为导出列
///
/// # 规则
/// - object 组字段: 值为「出现次序」数组,每次出现展开为 <子键>_<i>;
///   子键值本身为数组时（nested_type）追加第二级序号 <子键>_<i>_<j>
/// - 普通多值字段: 配置了 split 定界符时拼为单列,否则展开为 <字段>_<i>
/// - 标量: 单列原样输出
pub fn flatten_field(
    field_name: &str,
    mapping: &FieldMapping,
    value: &Value,
) -> Vec<(String, String)> {
    if mapping.object.is_some() {
        return flatten_object_field(value);
    }

    match value {
        Value::Array(items) => match &mapping.split {
            Some(delimiter) => {
                let joined = items
                    .iter()
                    .map(scalar_to_string)
                    .collect::<Vec<_>>()
                    .join(delimiter);
                vec![(field_name.to_string(), joined)]
            }
            None => items
                .iter()
                .enumerate()
                .map(|(i, item)| (format!("{}_{}", field_name, i + 1), scalar_to_string(item)))
                .collect(),
        },
        other => vec![(field_name.to_string(), scalar_to_string(other))],
    }
}

/// 展平整份解析元数据
///
/// # 参数
/// - config: 字段映射配置（查不到的字段按默认规则展平）
/// - metadata: 语义字段名 → 值（serde_json 对象,保序由调用方负责）
pub fn flatten_metadata(
    config: &FieldMappingConfig,
    metadata: &serde_json::Map<String, Value>,
) -> Vec<(String, String)> {
    let default_mapping = FieldMapping::default();
    let mut flattened = Vec::new();

    for (field, value) in metadata {
        let mapping = config.get(field).unwrap_or(&default_mapping);
        flattened.extend(flatten_field(field, mapping, value));
    }

    flattened
}

/// object 组字段展平: 出现次序 × 子键 (× 嵌套序号)
fn flatten_object_field(value: &Value) -> Vec<(String, String)> {
    let occurrences = match value {
        Value::Array(items) => items.as_slice(),
        single @ Value::Object(_) => std::slice::from_ref(single),
        _ => return Vec::new(),
    };

    let mut flattened = Vec::new();
    for (i, occurrence) in occurrences.iter().enumerate() {
        let Value::Object(members) = occurrence else {
            continue;
        };
        for (sub_key, sub_value) in members {
            match sub_value {
                Value::Array(nested) => {
                    // nested_type 数组: 二级序号
                    for (j, nested_value) in nested.iter().enumerate() {
                        flattened.push((
                            format!("{}_{}_{}", sub_key, i + 1, j + 1),
                            scalar_to_string(nested_value),
                        ));
                    }
                }
                other => {
                    flattened.push((format!("{}_{}", sub_key, i + 1), scalar_to_string(other)));
                }
            }
        }
    }

    flattened
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
