//! 模块加载与注册表构建的集成测试

use crate::builder::RegistryBuilder;
use crate::loader::ModuleLoader;
use crate::module::{core_module, StaticModule, CORE_MODULE_NAME};
use crate::settings::RegistrySettings;
use component_registry::{ComponentDeclaration, ComponentRegistry, global_registry};
use infrastructure_common::memory::{LockTable, MemoryEnvironment, MemoryScope};
use infrastructure_common::{BuildError, InfrastructureError, LoadError};
use std::io::Write;
use std::sync::{Arc, Once};
use tempfile::NamedTempFile;

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志系统（只初始化一次）
fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .try_init()
            .ok();
    });
}

fn sales_module() -> StaticModule {
    StaticModule::new("sales")
        .depends_on(CORE_MODULE_NAME)
        .component(
            ComponentDeclaration::new()
                .name("order.importer")
                .purpose("import")
                .applies_to("order"),
        )
        .component(ComponentDeclaration::new().name("order.exporter").purpose("export"))
}

fn scope(id: &str) -> Arc<MemoryScope> {
    let env = Arc::new(MemoryEnvironment::new(Arc::new(LockTable::new())));
    Arc::new(MemoryScope::new(id, env))
}

#[test]
fn test_loader_records_modules() {
    init_test_logger();
    let registry = Arc::new(ComponentRegistry::new());
    let mut loader = ModuleLoader::new(registry.clone());

    loader.load(&core_module("base")).unwrap();
    let report = loader.load(&sales_module()).unwrap();
    assert_eq!(report.components, vec!["order.importer", "order.exporter"]);

    // 扩展模块的声明归属于扩展模块
    let sales_v2 = StaticModule::new("sales_v2")
        .depends_on("sales")
        .component(ComponentDeclaration::extend("order.importer").attribute("batch_size", 500));
    loader.load(&sales_v2).unwrap();
    assert!(loader.is_loaded("sales_v2"));
    assert_eq!(registry.module_components("sales_v2"), vec!["order.importer".to_string()]);

    let (snapshot, report) = loader.finish().unwrap();
    assert_eq!(report.module_names(), vec![CORE_MODULE_NAME, "sales", "sales_v2"]);
    assert_eq!(report.component_count, 3);
    assert!(report.duration().is_some());

    let importer = snapshot.get("order.importer").unwrap();
    assert_eq!(importer.modules(), vec!["sales_v2", "sales", CORE_MODULE_NAME]);
}

#[test]
fn test_loader_rejects_bad_order() {
    let mut loader = ModuleLoader::new(Arc::new(ComponentRegistry::new()));

    let error = loader.load(&sales_module()).unwrap_err();
    assert!(matches!(
        error,
        LoadError::MissingDependency { ref module, ref dependency }
            if module == "sales" && dependency == CORE_MODULE_NAME
    ));

    loader.load(&core_module("base")).unwrap();
    let error = loader.load(&core_module("base")).unwrap_err();
    assert!(matches!(error, LoadError::DuplicateModule { .. }));
}

#[test]
fn test_loader_surfaces_build_errors() {
    let mut loader = ModuleLoader::new(Arc::new(ComponentRegistry::new()));
    loader.load(&core_module("base")).unwrap();

    let broken = StaticModule::new("broken")
        .component(ComponentDeclaration::new().name("child").inherit("missing"));
    let error = loader.load(&broken).unwrap_err();

    match error {
        LoadError::Build { module, source } => {
            assert_eq!(module, "broken");
            assert!(matches!(source, BuildError::UnknownParent { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!loader.is_loaded("broken"));
}

#[test]
fn test_builder_composes_sealed_registry() {
    init_test_logger();
    let composed = RegistryBuilder::new().add_module(sales_module()).build().unwrap();

    assert!(composed.registry().is_sealed());
    assert_eq!(composed.snapshot().names(), vec!["base", "order.importer", "order.exporter"]);
    assert!(composed.snapshot().get("base").unwrap().is_abstract());

    let work = composed.work_context(scope("main"), "order");
    let importer = work.component(Some("import"), None).unwrap();
    assert_eq!(importer.name(), "order.importer");
    assert_eq!(importer.descriptor().mro(), vec!["order.importer", "base"]);
}

#[test]
fn test_builder_with_custom_base_from_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "base_component = \"core\"").unwrap();

    let composed = RegistryBuilder::from_config_file(Some(file.path()))
        .unwrap()
        .add_module(StaticModule::new("tools").component(ComponentDeclaration::new().name("tool")))
        .build()
        .unwrap();

    let tool = composed.snapshot().get("tool").unwrap();
    assert_eq!(tool.mro(), vec!["tool", "core"]);
}

#[test]
fn test_builder_without_seed_requires_explicit_base() {
    let settings = RegistrySettings {
        seed_base: false,
        ..RegistrySettings::default()
    };

    let error = RegistryBuilder::with_settings(settings.clone())
        .add_module(StaticModule::new("tools").component(ComponentDeclaration::new().name("tool")))
        .build()
        .unwrap_err();
    assert!(matches!(error, InfrastructureError::LoadError { .. }));

    let composed = RegistryBuilder::with_settings(settings)
        .add_module(
            StaticModule::new("own_base")
                .component(ComponentDeclaration::new().name("base").attribute("origin", "own_base"))
                .component(ComponentDeclaration::new().name("tool")),
        )
        .build()
        .unwrap();
    assert!(!composed.snapshot().get("base").unwrap().is_abstract());
}

#[test]
fn test_builder_rejects_mismatched_registry() {
    let settings = RegistrySettings {
        base_component: "core".to_string(),
        ..RegistrySettings::default()
    };

    let result = RegistryBuilder::with_settings(settings)
        .with_registry(global_registry())
        .build();
    assert!(matches!(result, Err(InfrastructureError::BootstrapFailed { .. })));
}

#[test]
fn test_missing_config_file() {
    let result = RegistryBuilder::from_config_file(Some("non_existent_registry.toml"));
    assert!(matches!(result, Err(InfrastructureError::ConfigError { .. })));
}

#[test]
fn test_json_config_file() {
    let mut file: NamedTempFile = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, "{}", serde_json::json!({ "logging": { "level": "trace" } })).unwrap();

    let builder = RegistryBuilder::from_config_file(Some(file.path())).unwrap();
    assert_eq!(builder.settings().log_level().unwrap(), tracing::Level::TRACE);
}
