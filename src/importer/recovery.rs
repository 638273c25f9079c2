// ==========================================
// 数字仓储批量导入导出系统 - 恢复文件读写
// ==========================================
// 职责: (1) 失败条目原始行 → 修正 CSV
//       (2) 修正上传文件 → 本次导入的确定性路径（移动）
// 约束: 路径必须逐位一致:
//       tmp/imports[/<tenant>]/<importerId>_<createdAt%Y%m%d%H%M%S>/
// ==========================================

use crate::config::tenant::TenantContext;
use crate::domain::entry::Entry;
use crate::importer::error::{ImportError, ImportResult};
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 修正文件固定后缀
const CORRECTED_SUFFIX: &str = "_corrected_entries.csv";

/// 失败条目修正文件的基础名
const FAILED_BASE_NAME: &str = "failed";

/// 本次导入的运行目录: <prefix>/<importerId>_<createdAtCompact>
pub fn import_run_dir(
    tenant: &TenantContext,
    importer_id: i64,
    created_at: DateTime<Utc>,
) -> PathBuf {
    tenant.import_prefix().join(format!(
        "{}_{}",
        importer_id,
        created_at.format("%Y%m%d%H%M%S")
    ))
}

/// 将失败条目的原始行写为修正 CSV
///
/// # 参数
/// - run_dir: 本次导入的运行目录
/// - headers: 源文件列序;为空时按失败条目键集合补齐
/// - entries: 失败的非集合条目（过滤由调用方完成）
///
/// # 返回
/// - Ok(true): 文件已写出
/// - Ok(false): 条目为空,未写文件
pub fn write_errored_entries_file(
    run_dir: &Path,
    headers: &[String],
    entries: &[Entry],
) -> ImportResult<bool> {
    if entries.is_empty() {
        return Ok(false);
    }

    let headers = if headers.is_empty() {
        derive_headers(entries)
    } else {
        headers.to_vec()
    };

    fs::create_dir_all(run_dir)?;
    let dest = run_dir.join(format!("{}{}", FAILED_BASE_NAME, CORRECTED_SUFFIX));

    let mut writer = WriterBuilder::new().from_path(&dest)?;
    writer.write_record(&headers)?;

    for entry in entries {
        let record: Vec<&str> = headers
            .iter()
            .map(|h| entry.raw_metadata.get(h).map(String::as_str).unwrap_or(""))
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;

    info!(path = %dest.display(), count = entries.len(), "失败条目修正文件已写出");
    Ok(true)
}

/// 将修正后的上传文件移动到运行目录
///
/// # 目标名
/// - <原始文件基础名>_corrected_entries.csv
///
/// # 约束
/// - 移动而非复制,调用后源路径不再存在
pub fn write_partial_import_file(run_dir: &Path, uploaded_file: &Path) -> ImportResult<PathBuf> {
    if !uploaded_file.exists() {
        return Err(ImportError::FileNotFound(
            uploaded_file.display().to_string(),
        ));
    }

    let stem = uploaded_file
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            ImportError::RecoveryFileError(format!(
                "无法取得上传文件基础名: {}",
                uploaded_file.display()
            ))
        })?;

    fs::create_dir_all(run_dir)?;
    let dest = run_dir.join(format!("{}{}", stem, CORRECTED_SUFFIX));

    // rename 失败（跨文件系统）时退化为 copy + remove
    if let Err(e) = fs::rename(uploaded_file, &dest) {
        warn!(error = %e, "rename 失败,退化为 copy + remove");
        fs::copy(uploaded_file, &dest)?;
        fs::remove_file(uploaded_file)?;
    }

    info!(
        from = %uploaded_file.display(),
        to = %dest.display(),
        "修正上传文件已就位"
    );
    Ok(dest)
}

/// 无源表头时按失败条目键集合推导（排序保证确定性）
fn derive_headers(entries: &[Entry]) -> Vec<String> {
    let mut keys = BTreeSet::new();
    for entry in entries {
        keys.extend(entry.raw_metadata.keys().cloned());
    }
    keys.into_iter().collect()
}
