//! 组件实例与方法分派
//!
//! 组件实例是解析后描述符与工作上下文的组合。方法调用按解析顺序找到第一个定义该方法的声明，
//! 声明内部可以通过 [`Invocation::call_super`] 继续调用顺序中下一个实现。

use crate::context::WorkContext;
use crate::declaration::MethodFn;
use crate::descriptor::{MroEntry, ResolvedDescriptor};
use infrastructure_common::{ComponentError, Environment, LookupError, ModelRef, Scope};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// 组件实例
#[derive(Debug, Clone)]
pub struct Component {
    descriptor: Arc<ResolvedDescriptor>,
    work: WorkContext,
}

impl Component {
    pub(crate) fn new(descriptor: Arc<ResolvedDescriptor>, work: WorkContext) -> Self {
        Self { descriptor, work }
    }

    /// 组件名称
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &Arc<ResolvedDescriptor> {
        &self.descriptor
    }

    /// 绑定的工作上下文
    pub fn work(&self) -> &WorkContext {
        &self.work
    }

    pub fn scope(&self) -> &Arc<dyn Scope> {
        self.work.scope()
    }

    pub fn env(&self) -> Arc<dyn Environment> {
        self.work.env()
    }

    pub fn target_type(&self) -> &str {
        self.work.target_type()
    }

    pub fn model(&self) -> Option<ModelRef> {
        self.work.model()
    }

    /// 是否可以调用指定方法
    pub fn has_method(&self, method: &str) -> bool {
        self.descriptor.defines_method(method)
    }

    /// 读取组件属性，组件未定义时回退到工作上下文的传播属性
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.descriptor
            .attribute(key)
            .or_else(|| self.work.attribute(key))
    }

    /// 读取属性并反序列化
    pub fn attribute_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, serde_json::Error> {
        self.attribute(key)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
    }

    /// 调用组件方法
    pub fn call(&self, method: &str, args: Value) -> Result<Value, ComponentError> {
        match self.find_method(method, 0) {
            Some((position, method_fn)) => {
                trace!("调用组件方法: {}.{}", self.name(), method);
                let invocation = Invocation {
                    component: self,
                    method,
                    args: &args,
                    position,
                };
                method_fn(&invocation)
            }
            None => Err(ComponentError::MethodNotFound {
                component: self.name().to_string(),
                method: method.to_string(),
            }),
        }
    }

    /// 按名称获取组件，共享当前工作上下文
    pub fn component_by_name(&self, name: &str, target_type: Option<&str>) -> Result<Component, LookupError> {
        self.work.component_by_name_for(name, target_type)
    }

    /// 在当前工作上下文中查找唯一匹配的组件
    pub fn component(&self, purpose: Option<&str>, target_type: Option<&str>) -> Result<Component, LookupError> {
        self.work.component(purpose, target_type)
    }

    /// 在当前工作上下文中查找所有匹配的组件
    pub fn components(
        &self,
        purpose: Option<&str>,
        target_type: Option<&str>,
    ) -> Result<Vec<Component>, LookupError> {
        self.work.components(purpose, target_type)
    }

    fn find_method(&self, method: &str, start: usize) -> Option<(usize, &MethodFn)> {
        self.descriptor
            .entries()
            .iter()
            .enumerate()
            .skip(start)
            .find_map(|(position, entry)| match entry {
                MroEntry::Contribution(contribution) => contribution
                    .declaration()
                    .method_fn(method)
                    .map(|method_fn| (position, method_fn)),
                MroEntry::Component { .. } => None,
            })
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name())
    }
}

/// 一次方法调用
pub struct Invocation<'a> {
    component: &'a Component,
    method: &'a str,
    args: &'a Value,
    position: usize,
}

impl<'a> Invocation<'a> {
    /// 被调用的组件实例
    pub fn component(&self) -> &'a Component {
        self.component
    }

    pub fn method(&self) -> &'a str {
        self.method
    }

    pub fn args(&self) -> &'a Value {
        self.args
    }

    /// 读取命名参数并反序列化，参数缺失时返回 `None`
    pub fn arg_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ComponentError> {
        match self.args.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| ComponentError::invalid_arguments(self.method, format!("{key}: {e}"))),
        }
    }

    /// 调用解析顺序中下一个实现
    pub fn call_super(&self, args: Value) -> Result<Value, ComponentError> {
        match self.component.find_method(self.method, self.position + 1) {
            Some((position, method_fn)) => {
                let invocation = Invocation {
                    component: self.component,
                    method: self.method,
                    args: &args,
                    position,
                };
                method_fn(&invocation)
            }
            None => Err(ComponentError::NoSuperMethod {
                component: self.component.name().to_string(),
                method: self.method.to_string(),
            }),
        }
    }
}
