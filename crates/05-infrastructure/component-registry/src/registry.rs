//! 组件注册表与构建合并引擎

use crate::declaration::ComponentDeclaration;
use crate::descriptor::{
    Base, BuildCompletion, BuildState, Contribution, LinearizationCache, MergedDescriptor,
    ResolvedDescriptor,
};
use indexmap::{IndexMap, IndexSet};
use infrastructure_common::{BuildError, LookupError, RegistryPhase};
use once_cell::sync::OnceCell;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 默认的通用基础组件名称
pub const DEFAULT_BASE_NAME: &str = "base";

/// 注册表选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryOptions {
    /// 通用基础组件名称，除自身外的所有组件都隐式继承它
    pub base_name: String,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            base_name: DEFAULT_BASE_NAME.to_string(),
        }
    }
}

/// 封存后的注册表快照
///
/// 按注册顺序保存所有组件，先加载的模块的组件排在前面。
#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    descriptors: IndexMap<String, Arc<ResolvedDescriptor>>,
}

impl RegistrySnapshot {
    /// 按名称获取组件
    pub fn get(&self, name: &str) -> Option<&Arc<ResolvedDescriptor>> {
        self.descriptors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// 按注册顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResolvedDescriptor>> {
        self.descriptors.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.descriptors.keys().map(String::as_str).collect()
    }
}

/// 组件注册表
///
/// 生命周期分两个阶段：加载阶段由模块加载器顺序调用 [`register`](Self::register)，
/// 调用 [`seal`](Self::seal) 后转为只读，查找操作只读取封存快照。
#[derive(Debug)]
pub struct ComponentRegistry {
    options: RegistryOptions,
    state: RwLock<BuildState>,
    sealed: OnceCell<Arc<RegistrySnapshot>>,
}

impl ComponentRegistry {
    /// 创建新的注册表
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    /// 使用指定选项创建注册表
    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            options,
            state: RwLock::new(BuildState::default()),
            sealed: OnceCell::new(),
        }
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// 通用基础组件名称
    pub fn base_name(&self) -> &str {
        &self.options.base_name
    }

    /// 当前阶段
    pub fn phase(&self) -> RegistryPhase {
        if self.sealed.get().is_some() {
            RegistryPhase::Sealed
        } else {
            RegistryPhase::Loading
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.phase() == RegistryPhase::Sealed
    }

    /// 注册一份组件声明
    ///
    /// 显式名称必须是新的；只有匿名声明（`inherit` 中只有一个名称）才扩展已有描述符。
    /// 注册是原子的：任何错误都不会改变注册表。
    ///
    /// 构建钩子运行期间注册表只持有可升级读锁，钩子可以读取注册表，但不能注册组件或封存注册表。
    pub fn register(
        &self,
        declaration: ComponentDeclaration,
    ) -> Result<Arc<ResolvedDescriptor>, BuildError> {
        let state = self.state.upgradable_read();

        let parents = declaration.inherit_list().resolve();
        let name = declaration
            .effective_name()
            .ok_or_else(|| BuildError::MissingIdentity {
                inherit: parents.clone(),
            })?;

        if self.sealed.get().is_some() {
            warn!("注册表已封存，拒绝注册组件: {}", name);
            return Err(BuildError::RegistrySealed { name });
        }

        if declaration.declared_name().is_some() && state.descriptors.contains_key(&name) {
            warn!("重复声明组件: {}", name);
            return Err(BuildError::DuplicateDeclaration { name });
        }

        let extends_self = parents.iter().any(|parent| parent == &name);
        let mut parents = parents;
        if name != self.options.base_name {
            parents.push(self.options.base_name.clone());
        }

        if let Some(parent) = parents
            .iter()
            .find(|parent| !state.descriptors.contains_key(parent.as_str()))
        {
            warn!("组件 {} 继承了不存在的组件 {}", name, parent);
            return Err(BuildError::UnknownParent {
                name,
                parent: parent.clone(),
            });
        }

        let mut next = state.clone();
        let id = next.next_id;
        next.next_id += 1;
        let module = declaration.declared_module().map(str::to_string);
        next.contributions
            .insert(id, Arc::new(Contribution::new(id, name.as_str(), declaration)));

        let mut descriptor = if extends_self {
            next.descriptors
                .get(&name)
                .cloned()
                .unwrap_or_default()
        } else {
            MergedDescriptor::default()
        };

        // 新声明优先级最高；同名基出现多次时保留最后一次的位置
        let mut bases: IndexSet<Base> = IndexSet::new();
        bases.insert(Base::Contribution(id));
        for parent in &parents {
            if parent == &name {
                for base in &descriptor.bases {
                    push_last(&mut bases, base.clone());
                }
            } else {
                push_last(&mut bases, Base::Component(parent.clone()));
                if let Some(parent_descriptor) = next.descriptors.get_mut(parent) {
                    parent_descriptor.inherit_children.insert(name.clone());
                }
            }
        }
        descriptor.bases = bases;
        next.descriptors.insert(name.clone(), descriptor);

        // 扩展可能改变所有后代的解析顺序
        let mut cache = LinearizationCache::new();
        for descendant in next.descendants(&name) {
            next.resolve_cached(&descendant, &mut cache)?;
        }
        let resolved = next.resolve_cached(&name, &mut cache)?;

        // 钩子按解析顺序查找，父组件的钩子同样作用于子组件
        let hook = resolved
            .contributions()
            .find_map(|contribution| contribution.declaration().completion_hook().cloned());
        let resolved = match hook {
            Some(hook) => {
                let mut derived = next
                    .descriptors
                    .get(&name)
                    .map(|descriptor| descriptor.derived.clone())
                    .unwrap_or_default();
                hook(&mut BuildCompletion::new(&resolved, &mut derived)).map_err(|source| {
                    BuildError::CompletionHookFailed {
                        name: name.clone(),
                        source,
                    }
                })?;
                if let Some(descriptor) = next.descriptors.get_mut(&name) {
                    descriptor.derived = derived;
                }
                next.resolve_cached(&name, &mut cache)?
            }
            None => resolved,
        };

        if let Some(module) = module {
            next.modules.entry(module).or_default().push(name.clone());
        }

        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        *state = next;
        debug!(
            "构建组件 {}，解析顺序: {:?}，声明数: {}",
            name,
            resolved.mro(),
            resolved.contributions().count()
        );
        Ok(Arc::new(resolved))
    }

    /// 按顺序注册多份声明
    pub fn register_all<I>(&self, declarations: I) -> Result<Vec<Arc<ResolvedDescriptor>>, BuildError>
    where
        I: IntoIterator<Item = ComponentDeclaration>,
    {
        declarations
            .into_iter()
            .map(|declaration| self.register(declaration))
            .collect()
    }

    /// 封存注册表
    ///
    /// 解析所有组件并生成只读快照。重复调用返回同一快照。
    pub fn seal(&self) -> Result<Arc<RegistrySnapshot>, BuildError> {
        let state = self.state.write();
        if let Some(snapshot) = self.sealed.get() {
            return Ok(snapshot.clone());
        }

        let mut cache = LinearizationCache::new();
        let mut descriptors = IndexMap::with_capacity(state.descriptors.len());
        for name in state.descriptors.keys() {
            descriptors.insert(name.clone(), Arc::new(state.resolve_cached(name, &mut cache)?));
        }
        let snapshot = Arc::new(RegistrySnapshot { descriptors });
        let snapshot = self.sealed.get_or_init(|| snapshot).clone();
        info!("注册表已封存，共 {} 个组件", snapshot.len());
        Ok(snapshot)
    }

    /// 封存后的快照
    pub fn snapshot(&self) -> Result<Arc<RegistrySnapshot>, LookupError> {
        self.sealed.get().cloned().ok_or(LookupError::RegistryNotSealed)
    }

    /// 是否已注册指定名称
    pub fn contains(&self, name: &str) -> bool {
        match self.sealed.get() {
            Some(snapshot) => snapshot.contains(name),
            None => self.state.read().descriptors.contains_key(name),
        }
    }

    /// 按注册顺序列出组件名称
    pub fn names(&self) -> Vec<String> {
        match self.sealed.get() {
            Some(snapshot) => snapshot.names().into_iter().map(str::to_string).collect(),
            None => self.state.read().descriptors.keys().cloned().collect(),
        }
    }

    /// 模块声明过的组件，按注册顺序，用于诊断
    pub fn module_components(&self, module: &str) -> Vec<String> {
        self.state
            .read()
            .modules
            .get(module)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn push_last(bases: &mut IndexSet<Base>, base: Base) {
    bases.shift_remove(&base);
    bases.insert(base);
}
