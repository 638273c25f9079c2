// ==========================================
// 数字仓储批量导入导出系统 - 导入接口定义
// ==========================================
// 职责: 定义导入编排接口与导入侧外部协作者接口
//       （不包含实现）
// ==========================================

use crate::domain::entry::{Row, Run};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

// ==========================================
// BulkImporter Trait
// ==========================================
// 用途: 导入编排主接口
// 实现者: BulkImporterImpl
#[async_trait]
pub trait BulkImporter: Send {
    /// 从源文件执行一次完整导入
    ///
    /// # 流程
    /// 1. 解析文件（结构性失败 → 运行 ABORTED,返回 Err）
    /// 2. 行分类（集合/作品/文件集）
    /// 3. 逐桶建档 + 作业派发,行级失败只计数不中断
    /// 4. 汇总计数器落库
    ///
    /// # 返回
    /// - Ok(Run): 运行汇总（total/succeeded/failed/collections_total）
    async fn import(&mut self, file_path: &Path) -> ImportResult<Run>;

    /// 将失败的非集合条目原始行写为修正源文件
    ///
    /// # 返回
    /// - Ok(true): 文件已写出
    /// - Ok(false): 无失败条目,未写文件
    async fn write_errored_entries_file(&self) -> ImportResult<bool>;

    /// 将修正后的上传文件移动到本次导入的确定性路径
    ///
    /// # 约束
    /// - 移动而非复制: 调用后源路径不再存在该文件
    async fn write_partial_import_file(&self, uploaded_file: &Path) -> ImportResult<PathBuf>;

    /// 运行总数: 显式配置的 total 优先,否则为分类行数
    fn total(&self) -> usize;

    /// 内部分批行数（默认 1000）
    fn records_split_count(&self) -> usize;
}

// ==========================================
// IdentifierGenerator Trait
// ==========================================
// 用途: 空白源标识的兜底生成器（可选配置）
// 实现者: 外部标识服务（测试中为顺序假对象）
pub trait IdentifierGenerator: Send + Sync {
    /// 为缺失标识的行合成一个标识
    fn next_identifier(&self, row: &Row) -> String;
}
