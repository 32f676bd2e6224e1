//! 工作上下文
//!
//! 携带作用域、目标类型以及需要传播的额外属性，每个组件实例都绑定到一个上下文。

use crate::component::Component;
use crate::lookup::LookupQuery;
use crate::registry::ComponentRegistry;
use infrastructure_common::{Attributes, Environment, LookupError, ModelRef, Scope};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 工作上下文
///
/// 创建代价很低，按逻辑工作单元创建，不会保存在注册表中。
#[derive(Clone)]
pub struct WorkContext {
    registry: Arc<ComponentRegistry>,
    scope: Arc<dyn Scope>,
    target_type: String,
    attributes: Attributes,
}

impl WorkContext {
    /// 创建新的工作上下文
    pub fn new(
        registry: Arc<ComponentRegistry>,
        scope: Arc<dyn Scope>,
        target_type: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            scope,
            target_type: target_type.into(),
            attributes: Attributes::new(),
        }
    }

    /// 在全局注册表上创建工作上下文
    pub fn global(scope: Arc<dyn Scope>, target_type: impl Into<String>) -> Self {
        Self::new(crate::global::global_registry(), scope, target_type)
    }

    /// 添加需要传播的属性
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key, value);
        self
    }

    /// 批量设置传播属性
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        for (key, value) in attributes.iter() {
            self.attributes.insert(key, value.clone());
        }
        self
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    pub fn scope(&self) -> &Arc<dyn Scope> {
        &self.scope
    }

    /// 当前执行环境
    pub fn env(&self) -> Arc<dyn Environment> {
        self.scope.env()
    }

    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    /// 绑定到当前环境的目标类型模型
    pub fn model(&self) -> Option<ModelRef> {
        self.env().model(&self.target_type)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// 读取属性并反序列化
    pub fn attribute_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, serde_json::Error> {
        self.attributes.get_as(key)
    }

    /// 派生一个针对其他目标类型的上下文
    ///
    /// 共享同一作用域并复制所有传播属性，原上下文不受影响。
    pub fn work_on(&self, target_type: impl Into<String>) -> WorkContext {
        Self {
            registry: self.registry.clone(),
            scope: self.scope.clone(),
            target_type: target_type.into(),
            attributes: self.attributes.clone(),
        }
    }

    /// 目标类型不同时派生新上下文，否则复用当前上下文
    pub(crate) fn retarget(&self, target_type: Option<&str>) -> WorkContext {
        match target_type {
            Some(target_type) if target_type != self.target_type => {
                debug!("切换工作上下文目标类型: {} -> {}", self.target_type, target_type);
                self.work_on(target_type)
            }
            _ => self.clone(),
        }
    }

    /// 按名称获取组件
    pub fn component_by_name(&self, name: &str) -> Result<Component, LookupError> {
        self.component_by_name_for(name, None)
    }

    /// 按名称获取组件，并绑定到指定目标类型
    pub fn component_by_name_for(
        &self,
        name: &str,
        target_type: Option<&str>,
    ) -> Result<Component, LookupError> {
        let descriptor = self.registry.descriptor(name)?;
        Ok(Component::new(descriptor, self.retarget(target_type)))
    }

    /// 查找唯一匹配的组件
    ///
    /// 未指定目标类型时使用上下文当前的目标类型。
    pub fn component(
        &self,
        purpose: Option<&str>,
        target_type: Option<&str>,
    ) -> Result<Component, LookupError> {
        let query = self.query(purpose, target_type);
        let descriptor = self.registry.lookup_one(&query)?;
        Ok(Component::new(descriptor, self.retarget(target_type)))
    }

    /// 查找所有匹配的组件，按模块加载顺序返回
    pub fn components(
        &self,
        purpose: Option<&str>,
        target_type: Option<&str>,
    ) -> Result<Vec<Component>, LookupError> {
        let query = self.query(purpose, target_type);
        let work = self.retarget(target_type);
        Ok(self
            .registry
            .lookup_all(&query)?
            .into_iter()
            .map(|descriptor| Component::new(descriptor, work.clone()))
            .collect())
    }

    fn query(&self, purpose: Option<&str>, target_type: Option<&str>) -> LookupQuery {
        LookupQuery {
            scope: self.scope.scope_id().to_string(),
            purpose: purpose.map(str::to_string),
            target_type: Some(target_type.unwrap_or(&self.target_type).to_string()),
        }
    }
}

impl fmt::Debug for WorkContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkContext")
            .field("scope", &self.scope.scope_id())
            .field("target_type", &self.target_type)
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl fmt::Display for WorkContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkContext({:?},{})", self.scope.scope_id(), self.target_type)
    }
}
