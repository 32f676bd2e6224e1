//! 作用域与执行环境能力接口
//!
//! 注册表不关心宿主数据模型的实现，只通过这里定义的窄接口访问作用域和执行环境。

use std::fmt::Debug;
use std::sync::Arc;

/// 执行环境
///
/// 对应一次事务/会话，组件通过它访问宿主数据模型。
pub trait Environment: Send + Sync + Debug {
    /// 当前执行句柄标识
    fn handle(&self) -> &str;

    /// 获取绑定到当前环境的目标类型模型
    fn model(&self, target_type: &str) -> Option<ModelRef>;

    /// 尝试获取事务级咨询锁，锁在事务结束时释放
    ///
    /// 已被其他事务持有时立即返回 `false`，不会阻塞。
    fn try_advisory_lock(&self, key: &str) -> bool;
}

/// 作用域
///
/// 组件可以被限制在某个作用域（租户、后端、连接器实例等）内。
pub trait Scope: Send + Sync + Debug {
    /// 作用域标识，与组件声明中的 `scope_filter` 比较
    fn scope_id(&self) -> &str;

    /// 当前执行环境
    fn env(&self) -> Arc<dyn Environment>;
}

/// 绑定到执行环境的模型引用
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelRef {
    /// 目标类型名称
    pub target_type: String,
    /// 所属执行句柄
    pub env_handle: String,
}

impl ModelRef {
    /// 创建新的模型引用
    pub fn new(target_type: impl Into<String>, env_handle: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
            env_handle: env_handle.into(),
        }
    }
}
