//! `capforge list|invoke|read|prompt` — Capability bridge operations against
//! an exported worker. Each command opens a fresh MCP session.

use capforge_bridge::{BridgeOptions, CapabilityBridge};
use capforge_config::AppConfig;
use serde_json::Value;

fn bridge() -> Result<CapabilityBridge, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    Ok(CapabilityBridge::new(BridgeOptions {
        workers_dir: config.workers_dir.clone(),
        worker_command: config.worker_command.clone(),
        session_timeout: config.session_timeout(),
    }))
}

fn parse_args(args: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let value: Value = serde_json::from_str(args)
        .map_err(|e| format!("Arguments must be a JSON object: {e}"))?;
    if !value.is_object() {
        return Err("Arguments must be a JSON object".into());
    }
    Ok(value)
}

pub async fn list(target: String, kind: String) -> Result<(), Box<dyn std::error::Error>> {
    let items = bridge()?.list_by_name(&target, &kind).await?;

    println!("🔌 {kind}s exposed by '{target}' ({})", items.len());
    for item in &items {
        let name = item
            .get("name")
            .or_else(|| item.get("uri"))
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>");
        match item.get("description").and_then(Value::as_str) {
            Some(description) if !description.is_empty() => {
                println!("  {name} — {description}")
            }
            _ => println!("  {name}"),
        }
    }
    Ok(())
}

pub async fn invoke(
    target: String,
    name: String,
    args: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let arguments = parse_args(&args)?;
    let result = bridge()?.invoke_tool(&target, &name, arguments).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub async fn read(target: String, uri: String) -> Result<(), Box<dyn std::error::Error>> {
    let result = bridge()?.read_resource(&target, &uri).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub async fn prompt(
    target: String,
    name: String,
    args: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let arguments = parse_args(&args)?;
    let result = bridge()?.get_prompt(&target, &name, arguments).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
