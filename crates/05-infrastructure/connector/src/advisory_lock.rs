//! 咨询锁
//!
//! 锁在当前事务结束时自动释放。其他事务持有同一把锁时不会阻塞等待，
//! 而是返回可重试错误，由任务调度稍后重试。

use crate::{ADVISORY_LOCK_METHOD, DEFAULT_RETRY_SECONDS, LOCK_RETRY_SECONDS};
use component_registry::{Component, Invocation};
use infrastructure_common::{ComponentError, RetryableJobError};
use serde_json::{json, Value};
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, warn};

/// 导入单条外部记录时使用的锁键
pub fn import_lock_key(
    scope_id: &str,
    record_id: impl Display,
    target_type: &str,
    external_id: impl Display,
) -> String {
    format!("import_record({scope_id}, {record_id}, {target_type}, {external_id})")
}

/// 获取咨询锁，失败时返回可重试错误
///
/// 未指定 `retry_seconds` 时依次使用组件属性、上下文属性 [`LOCK_RETRY_SECONDS`] 和默认值。
/// 返回的错误不计入任务的重试次数。
pub fn advisory_lock_or_retry(
    component: &Component,
    lock: &str,
    retry_seconds: Option<u64>,
) -> Result<(), ComponentError> {
    if component.env().try_advisory_lock(lock) {
        debug!("获取咨询锁成功: {}", lock);
        return Ok(());
    }

    let retry_seconds = match retry_seconds {
        Some(seconds) => seconds,
        None => component
            .attribute_as::<u64>(LOCK_RETRY_SECONDS)
            .map_err(|e| ComponentError::invalid_arguments(ADVISORY_LOCK_METHOD, e.to_string()))?
            .unwrap_or(DEFAULT_RETRY_SECONDS),
    };
    warn!("咨询锁 {} 已被其他事务持有，{} 秒后重试", lock, retry_seconds);

    Err(RetryableJobError::new(format!("无法获取锁 {lock}，稍后重试"))
        .with_retry_after(Duration::from_secs(retry_seconds))
        .ignoring_retry()
        .into())
}

pub(crate) fn advisory_lock_method(call: &Invocation<'_>) -> Result<Value, ComponentError> {
    let lock: String = call
        .arg_as("lock")?
        .ok_or_else(|| ComponentError::invalid_arguments(call.method(), "缺少参数 lock"))?;
    let retry_seconds = call.arg_as::<u64>("retry_seconds")?;
    advisory_lock_or_retry(call.component(), &lock, retry_seconds)?;
    Ok(Value::Null)
}

/// 组件上的连接器方法
pub trait ConnectorExt {
    /// 通过组件方法分派获取咨询锁，子组件可以覆盖该方法
    fn advisory_lock_or_retry(&self, lock: &str, retry_seconds: Option<u64>) -> Result<(), ComponentError>;
}

impl ConnectorExt for Component {
    fn advisory_lock_or_retry(&self, lock: &str, retry_seconds: Option<u64>) -> Result<(), ComponentError> {
        self.call(
            ADVISORY_LOCK_METHOD,
            json!({ "lock": lock, "retry_seconds": retry_seconds }),
        )
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_lock_key() {
        assert_eq!(
            import_lock_key("backend.name", 1, "res.partner", "999999"),
            "import_record(backend.name, 1, res.partner, 999999)"
        );
    }
}
