//! 查找引擎与工作上下文的集成测试

use component_registry::{ComponentDeclaration, ComponentRegistry, LookupError, LookupQuery, WorkContext};
use infrastructure_common::memory::{LockTable, MemoryEnvironment, MemoryScope};
use serde_json::json;
use std::sync::Arc;

fn sealed_registry() -> Arc<ComponentRegistry> {
    let registry = Arc::new(ComponentRegistry::new());
    registry
        .register_all([
            ComponentDeclaration::new().name("base").abstract_component(),
            ComponentDeclaration::new()
                .name("importer")
                .purpose("import")
                .applies_to("order"),
            ComponentDeclaration::new()
                .name("exporter")
                .purpose("export")
                .applies_to(["order", "invoice"]),
            ComponentDeclaration::new()
                .name("csv_importer")
                .inherit("importer")
                .scope_filter("backend.csv"),
            ComponentDeclaration::new().name("tracker"),
        ])
        .unwrap();
    registry.seal().unwrap();
    registry
}

fn work(registry: Arc<ComponentRegistry>, scope: &str, target_type: &str) -> WorkContext {
    let env = Arc::new(MemoryEnvironment::new(Arc::new(LockTable::new())).with_model(target_type));
    WorkContext::new(registry, Arc::new(MemoryScope::new(scope, env)), target_type)
}

fn names(found: &[Arc<component_registry::ResolvedDescriptor>]) -> Vec<&str> {
    found.iter().map(|descriptor| descriptor.name()).collect()
}

#[test]
fn test_single_lookup_by_purpose_and_target() {
    let work = work(sealed_registry(), "main", "order");

    let importer = work.component(Some("import"), None).unwrap();
    assert_eq!(importer.name(), "importer");
    assert_eq!(importer.target_type(), "order");
    assert_eq!(importer.to_string(), "Component(importer)");

    let error = work.component(Some("import"), Some("invoice")).unwrap_err();
    assert_eq!(
        error,
        LookupError::NoComponent {
            scope: "main".to_string(),
            purpose: Some("import".to_string()),
            target_type: Some("invoice".to_string()),
        }
    );
}

#[test]
fn test_explicit_purpose_never_falls_back() {
    let registry = sealed_registry();

    let error = registry
        .lookup_all(&LookupQuery::new("main").purpose("serialize").target_type("order"))
        .unwrap_err();
    assert!(matches!(error, LookupError::NoComponent { .. }));
}

#[test]
fn test_scope_filter_and_ambiguity() {
    let registry = sealed_registry();
    let query = LookupQuery::new("backend.csv").purpose("import").target_type("order");

    // csv_importer 从 importer 继承用途和目标类型
    let error = registry.lookup_one(&query).unwrap_err();
    match error {
        LookupError::SeveralComponents { found, .. } => {
            assert_eq!(found, vec!["importer".to_string(), "csv_importer".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }

    let all = registry.lookup_all(&query).unwrap();
    assert_eq!(names(&all), vec!["importer", "csv_importer"]);

    // 其他作用域看不到受限组件
    let other = registry
        .lookup_one(&LookupQuery::new("backend.xml").purpose("import").target_type("order"))
        .unwrap();
    assert_eq!(other.name(), "importer");
}

#[test]
fn test_multi_lookup_keeps_load_order() {
    let registry = sealed_registry();
    let query = LookupQuery::new("main").target_type("order");

    let first = registry.lookup_all(&query).unwrap();
    let second = registry.lookup_all(&query).unwrap();

    // base 是抽象组件，不会被返回
    assert_eq!(names(&first), vec!["importer", "exporter", "tracker"]);
    assert_eq!(names(&first), names(&second));
}

#[test]
fn test_missing_target_type_only_matches_unrestricted() {
    let registry = sealed_registry();

    let found = registry.lookup_all(&LookupQuery::new("main")).unwrap();
    assert_eq!(names(&found), vec!["tracker"]);
}

#[test]
fn test_component_by_name_bypasses_filters() {
    let work = work(sealed_registry(), "main", "order");

    let base = work.component_by_name("base").unwrap();
    assert!(base.descriptor().is_abstract());

    let csv = work.component_by_name_for("csv_importer", Some("invoice")).unwrap();
    assert_eq!(csv.target_type(), "invoice");

    assert_eq!(
        work.component_by_name("missing").unwrap_err(),
        LookupError::UnknownName {
            name: "missing".to_string()
        }
    );
}

#[test]
fn test_work_on_propagates_attributes() {
    let original = work(sealed_registry(), "main", "order")
        .with_attribute("batch_size", 50)
        .with_attribute("dry_run", true);

    let retargeted = original.work_on("invoice");

    assert_eq!(retargeted.target_type(), "invoice");
    assert_eq!(retargeted.attribute("batch_size"), Some(&json!(50)));
    assert_eq!(retargeted.attribute_as::<bool>("dry_run").unwrap(), Some(true));
    assert_eq!(retargeted.scope().scope_id(), "main");
    assert_eq!(original.target_type(), "order");

    let retargeted = retargeted.with_attribute("batch_size", 10);
    assert_eq!(original.attribute("batch_size"), Some(&json!(50)));
    assert_eq!(retargeted.attribute("batch_size"), Some(&json!(10)));
}

#[test]
fn test_lookup_for_other_target_retargets_context() {
    let work = work(sealed_registry(), "main", "order").with_attribute("dry_run", true);

    let exporters = work.components(Some("export"), Some("invoice")).unwrap();
    assert_eq!(exporters.len(), 1);
    let exporter = &exporters[0];
    assert_eq!(exporter.target_type(), "invoice");
    assert_eq!(exporter.attribute("dry_run"), Some(&json!(true)));
    // 环境只提供 order 模型
    assert!(exporter.model().is_none());
    assert_eq!(work.model().unwrap().target_type, "order");
}

#[test]
fn test_lookup_requires_sealed_registry() {
    let registry = Arc::new(ComponentRegistry::new());
    registry
        .register(ComponentDeclaration::new().name("base"))
        .unwrap();
    let work = work(registry, "main", "order");

    assert_eq!(
        work.components(None, None).unwrap_err(),
        LookupError::RegistryNotSealed
    );
}
