//! 注册表生命周期

use std::fmt;

/// 注册表阶段
///
/// 加载阶段顺序注册、允许修改；封存后只读，可被任意数量的读者并发访问。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RegistryPhase {
    /// 模块加载中
    #[default]
    Loading,
    /// 已封存
    Sealed,
}

impl fmt::Display for RegistryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Sealed => write!(f, "sealed"),
        }
    }
}
