//! 进程级全局注册表

use crate::registry::ComponentRegistry;
use once_cell::sync::Lazy;
use std::sync::Arc;

static GLOBAL_REGISTRY: Lazy<Arc<ComponentRegistry>> = Lazy::new(|| Arc::new(ComponentRegistry::new()));

/// 获取全局注册表
///
/// 使用默认选项创建。需要自定义基础组件名称时应自行创建 [`ComponentRegistry`] 并显式传递。
pub fn global_registry() -> Arc<ComponentRegistry> {
    GLOBAL_REGISTRY.clone()
}
