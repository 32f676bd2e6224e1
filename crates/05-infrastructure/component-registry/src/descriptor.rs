//! 合并组件描述符
//!
//! 同名的所有声明合并为一个描述符。描述符的基列表由两类条目组成：
//! 单个声明（贡献）以及对其他组件描述符的按名引用。引用在解析时才展开，
//! 因此父组件之后的扩展对所有子组件可见。
//!
//! 解析顺序采用 C3 线性化：
//!
//! ```text
//!   L(D) = D + merge(L(B1), ..., L(Bn), [B1, ..., Bn])
//! ```

use crate::declaration::ComponentDeclaration;
use indexmap::{IndexMap, IndexSet};
use infrastructure_common::{Attributes, BuildError};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

/// 声明在注册表中的序号
pub type ContributionId = u64;

/// 一份已注册的声明
#[derive(Debug)]
pub struct Contribution {
    id: ContributionId,
    component: String,
    module: Option<String>,
    declaration: ComponentDeclaration,
}

impl Contribution {
    pub(crate) fn new(
        id: ContributionId,
        component: impl Into<String>,
        declaration: ComponentDeclaration,
    ) -> Self {
        Self {
            id,
            component: component.into(),
            module: declaration.declared_module().map(str::to_string),
            declaration,
        }
    }

    pub fn id(&self) -> ContributionId {
        self.id
    }

    /// 声明所属组件名称
    pub fn component(&self) -> &str {
        &self.component
    }

    /// 声明所属模块
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn declaration(&self) -> &ComponentDeclaration {
        &self.declaration
    }
}

/// 描述符的直接基
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Base {
    Contribution(ContributionId),
    Component(String),
}

/// 加载阶段的可变描述符
#[derive(Debug, Clone, Default)]
pub(crate) struct MergedDescriptor {
    pub(crate) bases: IndexSet<Base>,
    pub(crate) inherit_children: IndexSet<String>,
    pub(crate) derived: Attributes,
}

/// 加载阶段的注册表状态
#[derive(Debug, Default, Clone)]
pub(crate) struct BuildState {
    pub(crate) descriptors: IndexMap<String, MergedDescriptor>,
    pub(crate) contributions: HashMap<ContributionId, Arc<Contribution>>,
    pub(crate) modules: IndexMap<String, Vec<String>>,
    pub(crate) next_id: ContributionId,
}

/// 线性化结果中的节点
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Node {
    Component(String),
    Contribution(ContributionId),
}

impl From<&Base> for Node {
    fn from(base: &Base) -> Self {
        match base {
            Base::Contribution(id) => Node::Contribution(*id),
            Base::Component(name) => Node::Component(name.clone()),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Component(name) => write!(f, "{name}"),
            Node::Contribution(id) => write!(f, "#{id}"),
        }
    }
}

/// 已完成的线性化结果，只在同一份状态的一轮解析中复用
pub(crate) type LinearizationCache = HashMap<String, Vec<Node>>;

impl BuildState {
    /// 计算组件的 C3 线性化
    fn linearize(
        &self,
        name: &str,
        visiting: &mut Vec<String>,
        cache: &mut LinearizationCache,
    ) -> Result<Vec<Node>, String> {
        if let Some(nodes) = cache.get(name) {
            return Ok(nodes.clone());
        }
        if visiting.iter().any(|current| current == name) {
            return Err(format!("继承循环: {} -> {}", visiting.join(" -> "), name));
        }
        let descriptor = self
            .descriptors
            .get(name)
            .ok_or_else(|| format!("组件 {name} 不存在"))?;

        visiting.push(name.to_string());
        let mut sequences: Vec<VecDeque<Node>> = Vec::with_capacity(descriptor.bases.len() + 1);
        for base in &descriptor.bases {
            match base {
                Base::Contribution(id) => sequences.push(VecDeque::from([Node::Contribution(*id)])),
                Base::Component(parent) => {
                    sequences.push(self.linearize(parent, visiting, cache)?.into_iter().collect())
                }
            }
        }
        visiting.pop();
        sequences.push(descriptor.bases.iter().map(Node::from).collect());

        let mut result = vec![Node::Component(name.to_string())];
        loop {
            sequences.retain(|sequence| !sequence.is_empty());
            if sequences.is_empty() {
                cache.insert(name.to_string(), result.clone());
                return Ok(result);
            }

            let head = sequences
                .iter()
                .filter_map(|sequence| sequence.front())
                .find(|candidate| {
                    !sequences
                        .iter()
                        .any(|sequence| sequence.iter().skip(1).any(|node| node == *candidate))
                })
                .cloned()
                .ok_or_else(|| {
                    let heads = sequences
                        .iter()
                        .filter_map(|sequence| sequence.front())
                        .map(Node::to_string)
                        .collect::<Vec<_>>();
                    format!("无法确定 {} 的一致解析顺序，冲突的基: {}", name, heads.join(", "))
                })?;

            for sequence in sequences.iter_mut() {
                if sequence.front() == Some(&head) {
                    sequence.pop_front();
                }
            }
            result.push(head);
        }
    }

    /// 将组件解析为不可变描述符
    pub(crate) fn resolve(&self, name: &str) -> Result<ResolvedDescriptor, BuildError> {
        self.resolve_cached(name, &mut LinearizationCache::new())
    }

    /// 解析组件，复用同一轮解析中已完成的线性化
    pub(crate) fn resolve_cached(
        &self,
        name: &str,
        cache: &mut LinearizationCache,
    ) -> Result<ResolvedDescriptor, BuildError> {
        let nodes = self
            .linearize(name, &mut Vec::new(), cache)
            .map_err(|detail| BuildError::InconsistentHierarchy {
                name: name.to_string(),
                detail,
            })?;

        let mut entries = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Component(component) => {
                    let derived = self
                        .descriptors
                        .get(&component)
                        .map(|descriptor| descriptor.derived.clone())
                        .unwrap_or_default();
                    entries.push(MroEntry::Component {
                        name: component,
                        derived,
                    });
                }
                Node::Contribution(id) => {
                    if let Some(contribution) = self.contributions.get(&id) {
                        entries.push(MroEntry::Contribution(contribution.clone()));
                    }
                }
            }
        }

        let inherit_children = self
            .descriptors
            .get(name)
            .map(|descriptor| descriptor.inherit_children.iter().cloned().collect())
            .unwrap_or_default();

        Ok(ResolvedDescriptor::new(name, entries, inherit_children))
    }

    /// 收集组件的所有后代
    pub(crate) fn descendants(&self, name: &str) -> IndexSet<String> {
        let mut found = IndexSet::new();
        let mut pending = vec![name.to_string()];
        while let Some(current) = pending.pop() {
            if let Some(descriptor) = self.descriptors.get(&current) {
                for child in &descriptor.inherit_children {
                    if child != name && found.insert(child.clone()) {
                        pending.push(child.clone());
                    }
                }
            }
        }
        found
    }
}

/// 解析顺序中的条目
#[derive(Debug, Clone)]
pub enum MroEntry {
    /// 组件节点，携带构建钩子写入的派生属性
    Component { name: String, derived: Attributes },
    /// 单个声明
    Contribution(Arc<Contribution>),
}

/// 解析后的组件描述符
///
/// 封存后不可变，可被任意线程共享。
#[derive(Debug, Clone)]
pub struct ResolvedDescriptor {
    name: String,
    entries: Vec<MroEntry>,
    inherit_children: Vec<String>,
    scope_filter: Option<String>,
    applies_to: Option<Vec<String>>,
    purpose: Option<String>,
    is_abstract: bool,
}

impl ResolvedDescriptor {
    fn new(name: &str, entries: Vec<MroEntry>, inherit_children: Vec<String>) -> Self {
        let contributions = || {
            entries.iter().filter_map(|entry| match entry {
                MroEntry::Contribution(contribution) => Some(contribution),
                MroEntry::Component { .. } => None,
            })
        };

        let scope_filter =
            contributions().find_map(|c| c.declaration().declared_scope_filter().map(str::to_string));
        let applies_to =
            contributions().find_map(|c| c.declaration().declared_applies_to().map(|targets| targets.resolve()));
        let purpose = contributions().find_map(|c| c.declaration().declared_purpose().map(str::to_string));
        // 抽象标记不从父组件继承
        let is_abstract = contributions()
            .filter(|c| c.component() == name)
            .find_map(|c| c.declaration().declared_abstract())
            .unwrap_or(false);

        Self {
            name: name.to_string(),
            entries,
            inherit_children,
            scope_filter,
            applies_to,
            purpose,
            is_abstract,
        }
    }

    /// 组件名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 解析顺序中的组件名称，第一个为组件自身
    pub fn mro(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                MroEntry::Component { name, .. } => Some(name.as_str()),
                MroEntry::Contribution(_) => None,
            })
            .collect()
    }

    pub fn entries(&self) -> &[MroEntry] {
        &self.entries
    }

    /// 按解析顺序遍历所有声明
    pub fn contributions(&self) -> impl Iterator<Item = &Arc<Contribution>> {
        self.entries.iter().filter_map(|entry| match entry {
            MroEntry::Contribution(contribution) => Some(contribution),
            MroEntry::Component { .. } => None,
        })
    }

    /// 组件自身名下的声明，最近注册的在前
    pub fn own_contributions(&self) -> impl Iterator<Item = &Arc<Contribution>> {
        self.contributions()
            .filter(move |contribution| contribution.component() == self.name)
    }

    /// 继承了本组件的组件名称
    pub fn inherit_children(&self) -> &[String] {
        &self.inherit_children
    }

    pub fn scope_filter(&self) -> Option<&str> {
        self.scope_filter.as_deref()
    }

    pub fn applies_to(&self) -> Option<&[String]> {
        self.applies_to.as_deref()
    }

    pub fn purpose(&self) -> Option<&str> {
        self.purpose.as_deref()
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// 贡献了声明的模块，按解析顺序去重
    pub fn modules(&self) -> Vec<&str> {
        let mut modules = IndexSet::new();
        for contribution in self.contributions() {
            if let Some(module) = contribution.module() {
                modules.insert(module);
            }
        }
        modules.into_iter().collect()
    }

    /// 组件是否在指定作用域中可见
    pub fn matches_scope(&self, scope_id: &str) -> bool {
        self.scope_filter
            .as_deref()
            .map_or(true, |scope| scope == scope_id)
    }

    /// 组件是否适用于指定目标类型
    pub fn applies_to_target(&self, target_type: Option<&str>) -> bool {
        match (&self.applies_to, target_type) {
            (None, _) => true,
            (Some(targets), Some(target_type)) => targets.iter().any(|t| t == target_type),
            (Some(_), None) => false,
        }
    }

    /// 是否有声明定义了指定方法
    pub fn defines_method(&self, method: &str) -> bool {
        self.contributions()
            .any(|contribution| contribution.declaration().defines_method(method))
    }

    /// 按解析顺序查找属性，派生属性优先于同位置之后的声明
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find_map(|entry| match entry {
            MroEntry::Component { derived, .. } => derived.get(key),
            MroEntry::Contribution(contribution) => contribution.declaration().attributes().get(key),
        })
    }
}

impl fmt::Display for ResolvedDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name)
    }
}

/// 构建完成钩子的上下文
///
/// 钩子可以读取新组件的解析结果，并写入派生属性。
pub struct BuildCompletion<'a> {
    resolved: &'a ResolvedDescriptor,
    derived: &'a mut Attributes,
}

impl<'a> BuildCompletion<'a> {
    pub(crate) fn new(resolved: &'a ResolvedDescriptor, derived: &'a mut Attributes) -> Self {
        Self { resolved, derived }
    }

    /// 组件名称
    pub fn name(&self) -> &str {
        self.resolved.name()
    }

    /// 当前的解析结果
    pub fn descriptor(&self) -> &ResolvedDescriptor {
        self.resolved
    }

    /// 按解析顺序读取属性，已写入的派生属性优先
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.derived
            .get(key)
            .or_else(|| self.resolved.attribute(key))
    }

    /// 写入派生属性
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.derived.insert(key, value);
    }
}
