//! 组件声明
//!
//! 每个模块为它贡献的每个组件类提交一份声明，由构建引擎合并到注册表中。

use crate::component::Invocation;
use crate::descriptor::BuildCompletion;
use indexmap::IndexMap;
use infrastructure_common::{Attributes, ComponentError};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// 组件方法
pub type MethodFn = Arc<dyn Fn(&Invocation<'_>) -> Result<Value, ComponentError> + Send + Sync>;

/// 组件构建完成钩子
pub type CompletionHook = Arc<dyn Fn(&mut BuildCompletion<'_>) -> anyhow::Result<()> + Send + Sync>;

/// 名称列表
///
/// 单个名称视为只有一个元素的列表。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameList(Vec<String>);

impl NameList {
    /// 展开为具体的名称列表
    pub fn resolve(&self) -> Vec<String> {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for NameList {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<String> for NameList {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<Vec<String>> for NameList {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<Vec<&str>> for NameList {
    fn from(names: Vec<&str>) -> Self {
        Self(names.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for NameList {
    fn from(names: [&str; N]) -> Self {
        Self(names.into_iter().map(str::to_string).collect())
    }
}

impl From<Option<&str>> for NameList {
    fn from(name: Option<&str>) -> Self {
        name.map(Self::from).unwrap_or_default()
    }
}

/// 组件声明
///
/// # 示例
///
/// ```rust
/// use component_registry::ComponentDeclaration;
/// use serde_json::json;
///
/// let importer = ComponentDeclaration::new()
///     .name("importer")
///     .inherit("base")
///     .purpose("import")
///     .applies_to("order")
///     .attribute("batch_size", 100)
///     .method("run", |call| Ok(json!({ "component": call.component().name() })));
/// ```
#[derive(Clone, Default)]
pub struct ComponentDeclaration {
    name: Option<String>,
    inherit: NameList,
    scope_filter: Option<String>,
    applies_to: Option<NameList>,
    purpose: Option<String>,
    is_abstract: Option<bool>,
    module: Option<String>,
    attributes: Attributes,
    methods: IndexMap<String, MethodFn>,
    completion_hook: Option<CompletionHook>,
}

impl ComponentDeclaration {
    /// 创建空声明
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建对已有组件的纯扩展声明
    pub fn extend(name: impl Into<String>) -> Self {
        Self::new().inherit(name.into())
    }

    /// 设置组件名称
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 设置继承的组件
    pub fn inherit(mut self, inherit: impl Into<NameList>) -> Self {
        self.inherit = inherit.into();
        self
    }

    /// 限制组件只在指定作用域中可见
    pub fn scope_filter(mut self, scope: impl Into<String>) -> Self {
        self.scope_filter = Some(scope.into());
        self
    }

    /// 限制组件适用的目标类型
    pub fn applies_to(mut self, targets: impl Into<NameList>) -> Self {
        self.applies_to = Some(targets.into());
        self
    }

    /// 设置组件用途
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    /// 标记为抽象组件，只作为构建块，不会被查找返回
    pub fn abstract_component(mut self) -> Self {
        self.is_abstract = Some(true);
        self
    }

    /// 显式标记为具体组件
    pub fn concrete(mut self) -> Self {
        self.is_abstract = Some(false);
        self
    }

    /// 设置声明所属模块
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// 添加属性
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key, value);
        self
    }

    /// 添加方法
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> Result<Value, ComponentError> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }

    /// 设置构建完成钩子
    ///
    /// 钩子在注册过程中同步运行，可以读取注册表（`names`、`contains`），
    /// 但不能在钩子内注册组件或封存注册表。
    pub fn on_complete<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut BuildCompletion<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.completion_hook = Some(Arc::new(hook));
        self
    }

    pub fn declared_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn inherit_list(&self) -> &NameList {
        &self.inherit
    }

    pub fn declared_scope_filter(&self) -> Option<&str> {
        self.scope_filter.as_deref()
    }

    pub fn declared_applies_to(&self) -> Option<&NameList> {
        self.applies_to.as_ref()
    }

    pub fn declared_purpose(&self) -> Option<&str> {
        self.purpose.as_deref()
    }

    pub fn declared_abstract(&self) -> Option<bool> {
        self.is_abstract
    }

    pub fn declared_module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// 是否定义了指定方法
    pub fn defines_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    pub(crate) fn method_fn(&self, method: &str) -> Option<&MethodFn> {
        self.methods.get(method)
    }

    pub(crate) fn completion_hook(&self) -> Option<&CompletionHook> {
        self.completion_hook.as_ref()
    }

    /// 解析组件的有效名称
    ///
    /// 未指定 `name` 且只继承一个组件时，声明是对该组件的纯扩展。
    pub(crate) fn effective_name(&self) -> Option<String> {
        match (&self.name, self.inherit.len()) {
            (Some(name), _) => Some(name.clone()),
            (None, 1) => self.inherit.iter().next().map(str::to_string),
            (None, _) => None,
        }
    }
}

impl fmt::Debug for ComponentDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDeclaration")
            .field("name", &self.name)
            .field("inherit", &self.inherit)
            .field("scope_filter", &self.scope_filter)
            .field("applies_to", &self.applies_to)
            .field("purpose", &self.purpose)
            .field("is_abstract", &self.is_abstract)
            .field("module", &self.module)
            .field("attributes", &self.attributes)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("completion_hook", &self.completion_hook.is_some())
            .finish()
    }
}
