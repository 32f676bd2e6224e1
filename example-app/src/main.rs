//! # 示例应用程序
//!
//! 组合核心模块、连接器模块和演示模块，然后按命令行参数查找组件并调用方法。
//!
//! ```text
//! example-app --purpose import --target-type order --method run --args '{"external_id": "SO042"}'
//! example-app --multi --target-type order
//! example-app --name base.connector
//! ```

use anyhow::Context;
use clap::Parser;
use component_registry::{Component, ComponentDeclaration, WorkContext};
use connector::{connector_module, import_lock_key, ConnectorExt, BASE_CONNECTOR, LOCK_RETRY_SECONDS};
use infrastructure_common::memory::{LockTable, MemoryEnvironment, MemoryScope};
use infrastructure_common::ComponentError;
use infrastructure_composition::{LoggingConfig, RegistryBuilder, StaticModule};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "组件注册表示例应用")]
struct Args {
    /// 配置文件路径（TOML 或 JSON）
    #[arg(short, long)]
    config: Option<String>,

    /// 作用域标识
    #[arg(long, default_value = "main")]
    scope: String,

    /// 目标类型
    #[arg(long, default_value = "order")]
    target_type: String,

    /// 组件用途
    #[arg(long)]
    purpose: Option<String>,

    /// 返回所有匹配的组件
    #[arg(long)]
    multi: bool,

    /// 按名称获取组件，忽略用途和目标类型过滤
    #[arg(long)]
    name: Option<String>,

    /// 要调用的方法
    #[arg(long)]
    method: Option<String>,

    /// 方法参数（JSON）
    #[arg(long, default_value = "{}")]
    args: String,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 打印加载报告
    #[arg(long)]
    report: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = tracing::Level::from_str(&args.log_level)
        .with_context(|| format!("无效的日志级别: {}", args.log_level))?;
    let logging = LoggingConfig::verbose(level);

    let composed = RegistryBuilder::from_config_file(args.config.as_deref())?
        .with_logging(logging)
        .add_module(connector_module())
        .add_module(sales_module())
        .add_module(sales_v2_module())
        .build()?;
    info!("启动示例应用，组件: {:?}", composed.snapshot().names());

    if args.report {
        println!("{}", serde_json::to_string_pretty(composed.report())?);
    }

    let locks = Arc::new(LockTable::new());
    let env = Arc::new(MemoryEnvironment::new(locks).with_model("order").with_model("invoice"));
    let work = composed
        .work_context(Arc::new(MemoryScope::new(args.scope.as_str(), env.clone())), args.target_type.as_str())
        .with_attribute(LOCK_RETRY_SECONDS, 2);

    let components = find_components(&work, &args)?;
    let call_args: Value = serde_json::from_str(&args.args).context("方法参数不是合法的 JSON")?;

    for component in &components {
        println!(
            "{} 解析顺序: {:?} 模块: {:?}",
            component,
            component.descriptor().mro(),
            component.descriptor().modules()
        );
        if let Some(method) = &args.method {
            match component.call(method, call_args.clone()) {
                Ok(result) => println!("  {}.{} -> {}", component.name(), method, result),
                Err(e) if e.is_retryable() => println!("  {}.{} 需要重试: {}", component.name(), method, e),
                Err(e) => return Err(e.into()),
            }
        }
    }

    env.commit();
    Ok(())
}

fn find_components(work: &WorkContext, args: &Args) -> anyhow::Result<Vec<Component>> {
    let components = match &args.name {
        Some(name) => vec![work.component_by_name(name)?],
        None if args.multi => work.components(args.purpose.as_deref(), None)?,
        None => vec![work.component(args.purpose.as_deref(), None)?],
    };
    Ok(components)
}

/// 演示模块：订单导入与导出
fn sales_module() -> StaticModule {
    StaticModule::new("sales")
        .depends_on("connector")
        .component(
            ComponentDeclaration::new()
                .name("sale.importer")
                .inherit(BASE_CONNECTOR)
                .purpose("import")
                .applies_to("order")
                .attribute("batch_size", 100)
                .method("run", |call| {
                    let component = call.component();
                    let external_id: String = call.arg_as("external_id")?.unwrap_or_else(|| "SO001".to_string());
                    let lock = import_lock_key(
                        component.scope().scope_id(),
                        0,
                        component.target_type(),
                        &external_id,
                    );
                    component.advisory_lock_or_retry(&lock, None)?;
                    Ok(json!({
                        "imported": external_id,
                        "batch_size": component.attribute("batch_size"),
                        "model": component.model().map(|model| model.target_type),
                    }))
                }),
        )
        .component(
            ComponentDeclaration::new()
                .name("sale.exporter")
                .purpose("export")
                .applies_to(["order", "invoice"])
                .method("run", |call| {
                    Ok(json!({ "exported": call.component().target_type() }))
                }),
        )
}

/// 演示模块：扩展导入组件
fn sales_v2_module() -> StaticModule {
    StaticModule::new("sales_v2").depends_on("sales").component(
        ComponentDeclaration::extend("sale.importer")
            .attribute("batch_size", 500)
            .method("run", |call| {
                let mut result = call.call_super(call.args().clone())?;
                let object = result.as_object_mut().ok_or_else(|| ComponentError::Failed {
                    component: call.component().name().to_string(),
                    method: call.method().to_string(),
                    message: "上级实现返回的不是对象".to_string(),
                })?;
                object.insert("extended_by".to_string(), json!("sales_v2"));
                Ok(result)
            }),
    )
}
