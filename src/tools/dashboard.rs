//! Dashboard tools: the three operations the model can take against the
//! dashboard, plus the store interface they act through.
//!
//! The store is an injected collaborator rather than ambient global state so
//! the tools stay pure with respect to their inputs and testable with a fake.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::base::Tool;
use super::registry::{DuplicateToolError, ToolRegistry};

/// Module types the dashboard knows how to render.
pub const MODULE_TYPES: &[&str] = &["portfolioChart", "expensesTable", "netWorthSummary"];

/// One module instance on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInstance {
    pub id: String,
    pub module_type: String,
    pub config: Value,
    pub status: String,
}

/// The dashboard as the agent sees it.
///
/// Mutations are the store's responsibility and are not synchronized by the
/// agent core; concurrent runs mutating the same store can race, which is a
/// caller concern.
pub trait DashboardStore: Send + Sync {
    /// Snapshot of the current dashboard state as a JSON object.
    fn get_state(&self) -> Value;

    /// Add a module; returns the new module's id.
    fn add_module(&self, module_type: &str, config: Value) -> Result<String>;

    /// Remove a module by id.
    fn remove_module(&self, module_id: &str) -> Result<()>;

    /// Replace a module's configuration.
    fn update_config(&self, module_id: &str, new_config: Value) -> Result<()>;
}

/// In-memory dashboard store for the CLI and tests.
#[derive(Default)]
pub struct InMemoryDashboard {
    modules: Mutex<Vec<ModuleInstance>>,
    next_id: AtomicU64,
}

impl InMemoryDashboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DashboardStore for InMemoryDashboard {
    fn get_state(&self) -> Value {
        let modules = self.modules.lock().unwrap_or_else(|e| e.into_inner());
        json!({ "modules": *modules })
    }

    fn add_module(&self, module_type: &str, config: Value) -> Result<String> {
        let id = format!("m{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let mut modules = self.modules.lock().unwrap_or_else(|e| e.into_inner());
        modules.push(ModuleInstance {
            id: id.clone(),
            module_type: module_type.to_string(),
            config,
            status: "loading".to_string(),
        });
        Ok(id)
    }

    fn remove_module(&self, module_id: &str) -> Result<()> {
        let mut modules = self.modules.lock().unwrap_or_else(|e| e.into_inner());
        let before = modules.len();
        modules.retain(|m| m.id != module_id);
        if modules.len() == before {
            bail!("Module '{}' not found", module_id);
        }
        Ok(())
    }

    fn update_config(&self, module_id: &str, new_config: Value) -> Result<()> {
        let mut modules = self.modules.lock().unwrap_or_else(|e| e.into_inner());
        match modules.iter_mut().find(|m| m.id == module_id) {
            Some(module) => {
                module.config = new_config;
                module.status = "loading".to_string();
                Ok(())
            }
            None => bail!("Module '{}' not found", module_id),
        }
    }
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

pub struct AddModuleTool {
    store: Arc<dyn DashboardStore>,
}

#[async_trait]
impl Tool for AddModuleTool {
    fn name(&self) -> &str {
        "addModule"
    }

    fn description(&self) -> &str {
        "Add a new dashboard module"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "moduleType": { "type": "string" },
                "config": { "type": "object" },
            },
            "required": ["moduleType", "config"],
        })
    }

    async fn call(&self, args: Map<String, Value>) -> Result<Value> {
        let module_type = args
            .get("moduleType")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let config = args.get("config").cloned().unwrap_or(json!({}));
        let module_id = self.store.add_module(module_type, config)?;
        Ok(json!({ "status": "success", "moduleId": module_id }))
    }
}

pub struct RemoveModuleTool {
    store: Arc<dyn DashboardStore>,
}

#[async_trait]
impl Tool for RemoveModuleTool {
    fn name(&self) -> &str {
        "removeModule"
    }

    fn description(&self) -> &str {
        "Remove a module by ID"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "moduleId": { "type": "string" },
            },
            "required": ["moduleId"],
        })
    }

    async fn call(&self, args: Map<String, Value>) -> Result<Value> {
        let module_id = args
            .get("moduleId")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        self.store.remove_module(module_id)?;
        Ok(json!({ "status": "success" }))
    }
}

pub struct UpdateModuleConfigTool {
    store: Arc<dyn DashboardStore>,
}

#[async_trait]
impl Tool for UpdateModuleConfigTool {
    fn name(&self) -> &str {
        "updateModuleConfig"
    }

    fn description(&self) -> &str {
        "Update the configuration of an existing module"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "moduleId": { "type": "string" },
                "newConfig": { "type": "object" },
            },
            "required": ["moduleId", "newConfig"],
        })
    }

    async fn call(&self, args: Map<String, Value>) -> Result<Value> {
        let module_id = args
            .get("moduleId")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let new_config = args.get("newConfig").cloned().unwrap_or(json!({}));
        self.store.update_config(module_id, new_config)?;
        Ok(json!({ "status": "success" }))
    }
}

/// Register the three dashboard tools against the given store.
pub fn register_dashboard_tools(
    registry: &mut ToolRegistry,
    store: Arc<dyn DashboardStore>,
) -> Result<(), DuplicateToolError> {
    registry.register(Box::new(AddModuleTool {
        store: store.clone(),
    }))?;
    registry.register(Box::new(RemoveModuleTool {
        store: store.clone(),
    }))?;
    registry.register(Box::new(UpdateModuleConfigTool { store }))?;
    Ok(())
}
