//! 内存中的作用域与执行环境实现
//!
//! 用于示例程序和测试，不依赖任何外部数据库。

use crate::capability::{Environment, ModelRef, Scope};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// 咨询锁表
///
/// 模拟数据库的事务级咨询锁：同一执行句柄可重复获取，其他句柄获取失败。
#[derive(Debug, Default)]
pub struct LockTable {
    holders: DashMap<String, String>,
}

impl LockTable {
    /// 创建新的锁表
    pub fn new() -> Self {
        Self::default()
    }

    /// 尝试为指定持有者获取锁
    pub fn try_lock(&self, key: &str, holder: &str) -> bool {
        match self.holders.entry(key.to_string()) {
            Entry::Occupied(entry) => entry.get() == holder,
            Entry::Vacant(entry) => {
                entry.insert(holder.to_string());
                true
            }
        }
    }

    /// 释放持有者的所有锁
    pub fn release_all(&self, holder: &str) -> usize {
        let before = self.holders.len();
        self.holders.retain(|_, current| current.as_str() != holder);
        before - self.holders.len()
    }

    /// 查询锁的持有者
    pub fn holder_of(&self, key: &str) -> Option<String> {
        self.holders.get(key).map(|holder| holder.value().clone())
    }
}

/// 内存执行环境
#[derive(Debug)]
pub struct MemoryEnvironment {
    handle: String,
    models: HashSet<String>,
    locks: Arc<LockTable>,
}

impl MemoryEnvironment {
    /// 创建新的执行环境，每个环境拥有独立的执行句柄
    pub fn new(locks: Arc<LockTable>) -> Self {
        Self {
            handle: uuid::Uuid::new_v4().to_string(),
            models: HashSet::new(),
            locks,
        }
    }

    /// 声明环境提供的目标类型模型
    pub fn with_model(mut self, target_type: impl Into<String>) -> Self {
        self.models.insert(target_type.into());
        self
    }

    /// 结束事务，释放本环境持有的所有咨询锁
    pub fn commit(&self) {
        let released = self.locks.release_all(&self.handle);
        debug!("事务 {} 结束，释放 {} 个咨询锁", self.handle, released);
    }
}

impl Environment for MemoryEnvironment {
    fn handle(&self) -> &str {
        &self.handle
    }

    fn model(&self, target_type: &str) -> Option<ModelRef> {
        self.models
            .contains(target_type)
            .then(|| ModelRef::new(target_type, self.handle.as_str()))
    }

    fn try_advisory_lock(&self, key: &str) -> bool {
        self.locks.try_lock(key, &self.handle)
    }
}

/// 内存作用域
#[derive(Debug, Clone)]
pub struct MemoryScope {
    id: String,
    env: Arc<MemoryEnvironment>,
}

impl MemoryScope {
    /// 创建新的作用域
    pub fn new(id: impl Into<String>, env: Arc<MemoryEnvironment>) -> Self {
        Self { id: id.into(), env }
    }

    /// 获取具体的内存环境
    pub fn memory_env(&self) -> &Arc<MemoryEnvironment> {
        &self.env
    }
}

impl Scope for MemoryScope {
    fn scope_id(&self) -> &str {
        &self.id
    }

    fn env(&self) -> Arc<dyn Environment> {
        self.env.clone()
    }
}
