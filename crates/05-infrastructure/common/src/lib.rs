//! # Infrastructure Common
//!
//! 这个 crate 提供了组件注册表基础设施的公共类型和工具。
//!
//! ## 核心内容
//!
//! - [`errors`] - 构建、查找、调用、加载和配置错误类型
//! - [`Scope`] / [`Environment`] - 组件访问宿主系统的窄接口
//! - [`Attributes`] - 类型化属性表
//! - [`RegistryPhase`] - 注册表生命周期阶段
//! - [`memory`] - 内存中的作用域与环境实现

pub mod attributes;
pub mod capability;
pub mod errors;
pub mod lifecycle;
pub mod memory;

pub use attributes::*;
pub use capability::*;
pub use errors::*;
pub use lifecycle::*;
