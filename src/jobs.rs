// ==========================================
// 数字仓储批量导入导出系统 - 作业调度边界
// ==========================================
// 职责: 定义异步作业设施接口（不包含实现）
// 红线: fire-and-forget,设施自身的失败不在本核心捕获
// 红线: 编排器计数反映建档,不反映作业完成
// ==========================================

use async_trait::async_trait;

// ==========================================
// JobDispatcher Trait
// ==========================================
// 用途: 把单条目的创建/导出动作移交给外部异步执行设施
// 实现者: 外部作业子系统（测试中为记录型假对象）
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    /// 进程内立即执行
    async fn enqueue_now(&self, entry_identifier: &str, run_id: &str);

    /// 队列异步执行
    async fn enqueue_later(&self, entry_identifier: &str, run_id: &str);
}
