// ==========================================
// 数字仓储批量导入导出系统 - 租户上下文
// ==========================================
// 职责: 显式传入的租户信息,决定恢复/导出文件路径前缀
// 红线: 不读取全局状态,多租户标志由调用方提供
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ==========================================
// TenantContext - 租户上下文
// ==========================================
// 单租户: account_name = None → tmp/imports
// 多租户: account_name = Some → tmp/imports/<account>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantContext {
    /// 多租户模式下的账户名;None 表示单租户
    #[serde(default)]
    pub account_name: Option<String>,

    /// 账户标识（导出路径组成部分）
    pub account_id: String,

    /// 站点标识（导出路径组成部分）
    pub site_id: String,

    /// 导入文件基础路径,默认 tmp/imports
    #[serde(default = "default_import_path")]
    pub import_path: PathBuf,

    /// 导出文件基础路径,默认 tmp/exports
    #[serde(default = "default_export_path")]
    pub export_path: PathBuf,
}

fn default_import_path() -> PathBuf {
    PathBuf::from("tmp/imports")
}

fn default_export_path() -> PathBuf {
    PathBuf::from("tmp/exports")
}

impl TenantContext {
    /// 单租户上下文
    pub fn single_tenant(account_id: impl Into<String>, site_id: impl Into<String>) -> Self {
        Self {
            account_name: None,
            account_id: account_id.into(),
            site_id: site_id.into(),
            import_path: default_import_path(),
            export_path: default_export_path(),
        }
    }

    /// 多租户上下文
    pub fn multi_tenant(
        account_name: impl Into<String>,
        account_id: impl Into<String>,
        site_id: impl Into<String>,
    ) -> Self {
        Self {
            account_name: Some(account_name.into()),
            account_id: account_id.into(),
            site_id: site_id.into(),
            import_path: default_import_path(),
            export_path: default_export_path(),
        }
    }

    /// 是否多租户模式
    pub fn is_multi_tenant(&self) -> bool {
        self.account_name.is_some()
    }

    /// 导入路径前缀: tmp/imports 或 tmp/imports/<account>
    pub fn import_prefix(&self) -> PathBuf {
        match &self.account_name {
            Some(account) => self.import_path.join(account),
            None => self.import_path.clone(),
        }
    }

    /// 导出路径前缀: tmp/exports/<accountId>/<siteId>
    pub fn export_prefix(&self) -> PathBuf {
        self.export_path.join(&self.account_id).join(&self.site_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_tenant_import_prefix() {
        let tenant = TenantContext::single_tenant("acc1", "site1");
        assert_eq!(tenant.import_prefix(), PathBuf::from("tmp/imports"));
        assert!(!tenant.is_multi_tenant());
    }

    #[test]
    fn test_multi_tenant_import_prefix() {
        let tenant = TenantContext::multi_tenant("library", "acc1", "site1");
        assert_eq!(tenant.import_prefix(), PathBuf::from("tmp/imports/library"));
        assert!(tenant.is_multi_tenant());
    }

    #[test]
    fn test_export_prefix() {
        let tenant = TenantContext::single_tenant("acc9", "site2");
        assert_eq!(tenant.export_prefix(), PathBuf::from("tmp/exports/acc9/site2"));
    }
}
