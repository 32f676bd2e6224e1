//! 组件查找引擎
//!
//! 按作用域、用途和目标类型逐级过滤封存快照，每一级都保持注册顺序。

use crate::descriptor::ResolvedDescriptor;
use crate::registry::ComponentRegistry;
use infrastructure_common::LookupError;
use std::sync::Arc;
use tracing::debug;

/// 查找条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupQuery {
    /// 作用域标识
    pub scope: String,
    /// 用途，`None` 表示不按用途过滤
    pub purpose: Option<String>,
    /// 目标类型
    pub target_type: Option<String>,
}

impl LookupQuery {
    /// 创建指定作用域的查找条件
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            ..Self::default()
        }
    }

    /// 设置用途
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    /// 设置目标类型
    pub fn target_type(mut self, target_type: impl Into<String>) -> Self {
        self.target_type = Some(target_type.into());
        self
    }

    fn no_component(&self) -> LookupError {
        LookupError::NoComponent {
            scope: self.scope.clone(),
            purpose: self.purpose.clone(),
            target_type: self.target_type.clone(),
        }
    }
}

impl ComponentRegistry {
    /// 查找所有匹配的组件，按注册顺序返回
    ///
    /// 候选为空时返回 [`LookupError::NoComponent`]。
    pub fn lookup_all(&self, query: &LookupQuery) -> Result<Vec<Arc<ResolvedDescriptor>>, LookupError> {
        let snapshot = self.snapshot()?;

        let scope_candidates = snapshot
            .iter()
            .filter(|descriptor| !descriptor.is_abstract() && descriptor.matches_scope(&query.scope));

        // 指定了用途但没有匹配时不回退到未过滤的候选
        let candidates: Vec<Arc<ResolvedDescriptor>> = scope_candidates
            .filter(|descriptor| match query.purpose.as_deref() {
                Some(purpose) => descriptor.purpose() == Some(purpose),
                None => true,
            })
            .filter(|descriptor| descriptor.applies_to_target(query.target_type.as_deref()))
            .cloned()
            .collect();

        debug!(
            "查找组件: 作用域 {}，用途 {:?}，目标类型 {:?}，候选 {:?}",
            query.scope,
            query.purpose,
            query.target_type,
            candidates.iter().map(|c| c.name()).collect::<Vec<_>>()
        );

        if candidates.is_empty() {
            return Err(query.no_component());
        }
        Ok(candidates)
    }

    /// 查找唯一匹配的组件
    ///
    /// 多于一个候选时返回 [`LookupError::SeveralComponents`]，列出所有候选。
    pub fn lookup_one(&self, query: &LookupQuery) -> Result<Arc<ResolvedDescriptor>, LookupError> {
        let mut candidates = self.lookup_all(query)?;
        if candidates.len() > 1 {
            return Err(LookupError::SeveralComponents {
                scope: query.scope.clone(),
                purpose: query.purpose.clone(),
                target_type: query.target_type.clone(),
                found: candidates.iter().map(|c| c.name().to_string()).collect(),
            });
        }
        candidates.pop().ok_or_else(|| query.no_component())
    }

    /// 按名称获取组件，不做任何过滤
    pub fn descriptor(&self, name: &str) -> Result<Arc<ResolvedDescriptor>, LookupError> {
        self.snapshot()?
            .get(name)
            .cloned()
            .ok_or_else(|| LookupError::UnknownName {
                name: name.to_string(),
            })
    }
}
