//! 扩展模块
//!
//! 模块是一组组件声明的载体，按依赖顺序交给模块加载器注册。

use component_registry::ComponentDeclaration;

/// 内置核心模块名称
pub const CORE_MODULE_NAME: &str = "component";

/// 扩展模块
pub trait AddonModule: Send + Sync {
    /// 模块名称
    fn name(&self) -> &str;

    /// 必须先于本模块加载的模块
    fn depends(&self) -> Vec<String> {
        Vec::new()
    }

    /// 模块贡献的组件声明，按声明顺序注册
    fn components(&self) -> Vec<ComponentDeclaration>;
}

/// 声明式模块
#[derive(Debug, Clone)]
pub struct StaticModule {
    name: String,
    depends: Vec<String>,
    components: Vec<ComponentDeclaration>,
}

impl StaticModule {
    /// 创建空模块
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depends: Vec::new(),
            components: Vec::new(),
        }
    }

    /// 添加依赖模块
    pub fn depends_on(mut self, module: impl Into<String>) -> Self {
        self.depends.push(module.into());
        self
    }

    /// 添加组件声明
    pub fn component(mut self, declaration: ComponentDeclaration) -> Self {
        self.components.push(declaration);
        self
    }

    /// 批量添加组件声明
    pub fn with_components<I>(mut self, declarations: I) -> Self
    where
        I: IntoIterator<Item = ComponentDeclaration>,
    {
        self.components.extend(declarations);
        self
    }
}

impl AddonModule for StaticModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn depends(&self) -> Vec<String> {
        self.depends.clone()
    }

    fn components(&self) -> Vec<ComponentDeclaration> {
        self.components.clone()
    }
}

/// 内置核心模块，声明抽象的通用基础组件
pub fn core_module(base_name: &str) -> StaticModule {
    StaticModule::new(CORE_MODULE_NAME).component(
        ComponentDeclaration::new()
            .name(base_name)
            .abstract_component(),
    )
}
