//! 封存后并发读取测试

use component_registry::{ComponentDeclaration, WorkContext};
use infrastructure_common::memory::{LockTable, MemoryEnvironment, MemoryScope};
use infrastructure_composition::{RegistryBuilder, StaticModule};
use serde_json::json;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers() -> anyhow::Result<()> {
    let mut module = StaticModule::new("catalog");
    for index in 0..20 {
        module = module.component(
            ComponentDeclaration::new()
                .name(format!("worker.{index}"))
                .purpose(if index % 2 == 0 { "even" } else { "odd" })
                .applies_to("job")
                .method("index", move |_| Ok(json!(index))),
        );
    }
    let composed = Arc::new(RegistryBuilder::new().add_module(module).build()?);
    let locks = Arc::new(LockTable::new());

    let mut handles = Vec::new();
    for task in 0..32 {
        let composed = composed.clone();
        let locks = locks.clone();
        handles.push(tokio::spawn(async move {
            let env = Arc::new(MemoryEnvironment::new(locks));
            let work: WorkContext = composed
                .work_context(Arc::new(MemoryScope::new("main", env)), "job")
                .with_attribute("task", task);

            let purpose = if task % 2 == 0 { "even" } else { "odd" };
            let workers = work.components(Some(purpose), None)?;
            let mut indexes = Vec::with_capacity(workers.len());
            for worker in &workers {
                indexes.push(worker.call("index", json!({}))?);
                assert_eq!(worker.work().attribute("task"), Some(&json!(task)));
            }
            Ok::<_, anyhow::Error>(indexes)
        }));
    }

    for (task, handle) in handles.into_iter().enumerate() {
        let indexes = handle.await??;
        let expected: Vec<_> = (0..20)
            .filter(|index| index % 2 == task % 2)
            .map(|index| json!(index))
            .collect();
        assert_eq!(indexes, expected);
    }
    Ok(())
}
