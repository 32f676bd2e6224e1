//! 端到端场景测试：模块组合、扩展、钻石继承与查找规则

use component_registry::{Component, ComponentDeclaration, LookupError, WorkContext};
use infrastructure_common::memory::{LockTable, MemoryEnvironment, MemoryScope};
use infrastructure_composition::{ComposedRegistry, RegistryBuilder, StaticModule};
use serde_json::{json, Value};
use std::sync::Arc;

fn context(composed: &ComposedRegistry, scope: &str, target_type: &str) -> WorkContext {
    let env = Arc::new(MemoryEnvironment::new(Arc::new(LockTable::new())));
    composed.work_context(Arc::new(MemoryScope::new(scope, env)), target_type)
}

fn names(components: &[Component]) -> Vec<&str> {
    components.iter().map(Component::name).collect()
}

fn label(tag: &'static str) -> ComponentDeclaration {
    ComponentDeclaration::new().method("label", move |call| match call.call_super(json!({})) {
        Ok(Value::String(inner)) => Ok(json!(format!("{tag}>{inner}"))),
        Ok(_) => Ok(json!(tag)),
        Err(_) => Ok(json!(tag)),
    })
}

#[test]
fn test_importer_lookup_scenario() {
    let composed = RegistryBuilder::new()
        .add_module(
            StaticModule::new("sales").component(
                ComponentDeclaration::new()
                    .name("importer")
                    .inherit("base")
                    .purpose("import")
                    .applies_to("order"),
            ),
        )
        .build()
        .unwrap();
    let work = context(&composed, "main", "order");

    let found = work.components(Some("import"), Some("order")).unwrap();
    assert_eq!(names(&found), vec!["importer"]);
    assert_eq!(work.component(Some("import"), Some("order")).unwrap().name(), "importer");

    assert!(matches!(
        work.component(Some("import"), Some("invoice")),
        Err(LookupError::NoComponent { .. })
    ));
}

#[test]
fn test_pure_extension_scenario() {
    let composed = RegistryBuilder::new()
        .add_module(
            StaticModule::new("sales").component(
                label("importer")
                    .name("importer")
                    .purpose("import")
                    .applies_to("order")
                    .attribute("version", 1),
            ),
        )
        .add_module(
            StaticModule::new("importer.v2")
                .depends_on("sales")
                .component(label("importer.v2").inherit("importer").attribute("version", 2)),
        )
        .build()
        .unwrap();

    let importers: Vec<&str> = composed
        .snapshot()
        .names()
        .into_iter()
        .filter(|name| name.starts_with("importer"))
        .collect();
    assert_eq!(importers, vec!["importer"]);

    let importer = context(&composed, "main", "order")
        .component(Some("import"), None)
        .unwrap();
    assert_eq!(importer.attribute("version"), Some(&json!(2)));
    assert_eq!(importer.call("label", json!({})).unwrap(), json!("importer.v2>importer"));
    assert_eq!(importer.descriptor().modules(), vec!["importer.v2", "sales", "component"]);
}

#[test]
fn test_diamond_shared_descriptor_scenario() {
    let composed = RegistryBuilder::new()
        .add_module(
            StaticModule::new("shapes")
                .component(label("a").name("a"))
                .component(ComponentDeclaration::new().name("b").inherit("a"))
                .component(ComponentDeclaration::new().name("c").inherit("a"))
                .component(ComponentDeclaration::new().name("d").inherit(["b", "c"])),
        )
        .add_module(
            StaticModule::new("shapes_override")
                .depends_on("shapes")
                .component(label("a.override").inherit("a")),
        )
        .build()
        .unwrap();

    let d = context(&composed, "main", "order").component_by_name("d").unwrap();
    assert_eq!(d.descriptor().mro(), vec!["d", "b", "c", "a", "base"]);
    assert_eq!(d.call("label", json!({})).unwrap(), json!("a.override>a"));
}

#[test]
fn test_ambiguity_is_surfaced_with_all_matches() {
    let composed = RegistryBuilder::new()
        .add_module(
            StaticModule::new("first").component(
                ComponentDeclaration::new()
                    .name("partner.importer")
                    .purpose("import")
                    .applies_to("partner")
                    .scope_filter("backend.shop"),
            ),
        )
        .add_module(
            StaticModule::new("second").component(
                ComponentDeclaration::new()
                    .name("partner.importer.alt")
                    .purpose("import")
                    .applies_to("partner")
                    .scope_filter("backend.shop"),
            ),
        )
        .build()
        .unwrap();
    let work = context(&composed, "backend.shop", "partner");

    match work.component(Some("import"), None) {
        Err(LookupError::SeveralComponents { found, .. }) => {
            assert_eq!(found, vec!["partner.importer", "partner.importer.alt"]);
        }
        other => panic!("unexpected result: {:?}", other.map(|c| c.name().to_string())),
    }

    // 多值查找按模块加载顺序，重复调用结果一致
    for _ in 0..3 {
        let found = work.components(Some("import"), None).unwrap();
        assert_eq!(names(&found), vec!["partner.importer", "partner.importer.alt"]);
    }

    // 其他作用域看不到这些组件
    let other = context(&composed, "backend.erp", "partner");
    assert!(matches!(
        other.components(Some("import"), None),
        Err(LookupError::NoComponent { .. })
    ));
}

#[test]
fn test_duplicate_root_aborts_startup() {
    let result = RegistryBuilder::new()
        .add_module(StaticModule::new("first").component(ComponentDeclaration::new().name("importer")))
        .add_module(StaticModule::new("second").component(ComponentDeclaration::new().name("importer")))
        .build();

    let error = result.unwrap_err();
    assert!(error.to_string().contains("importer"));
}
