//! # 连接器基础组件
//!
//! `connector` 模块声明抽象组件 `base.connector`，所有连接器组件都可以继承它，
//! 获得基于事务级咨询锁的并发保护。

pub mod advisory_lock;

pub use advisory_lock::{advisory_lock_or_retry, import_lock_key, ConnectorExt};

use component_registry::ComponentDeclaration;
use infrastructure_composition::{StaticModule, CORE_MODULE_NAME};

/// 连接器模块名称
pub const CONNECTOR_MODULE_NAME: &str = "connector";

/// 连接器基础组件名称
pub const BASE_CONNECTOR: &str = "base.connector";

/// 咨询锁方法名称
pub const ADVISORY_LOCK_METHOD: &str = "advisory_lock_or_retry";

/// 上下文属性：获取锁失败时的默认重试间隔（秒）
pub const LOCK_RETRY_SECONDS: &str = "connector.lock_retry_seconds";

/// 未配置重试间隔时使用的默认值（秒）
pub const DEFAULT_RETRY_SECONDS: u64 = 1;

/// 连接器模块
pub fn connector_module() -> StaticModule {
    StaticModule::new(CONNECTOR_MODULE_NAME)
        .depends_on(CORE_MODULE_NAME)
        .component(
            ComponentDeclaration::new()
                .name(BASE_CONNECTOR)
                .abstract_component()
                .method(ADVISORY_LOCK_METHOD, advisory_lock::advisory_lock_method),
        )
}
