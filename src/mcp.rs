use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::{ServerHandler, ServiceExt, tool, tool_handler, tool_router, transport::stdio};
use serde::Serialize;

use crate::bridge::{Bridge, BridgeError};

// ---------------------------------------------------------------------------
// Parameter structs
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct CreateGroupParams {
    /// Display name of the new group.
    name: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct GroupParams {
    /// Id of the group, as returned by `list_groups` or `create_group`.
    group_id: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct AddCommandParams {
    /// Id of the group that will own the command.
    group_id: String,
    /// Display name of the command.
    name: String,
    /// Shell command text, run through `sh -c` (`cmd /C` on Windows) unless configured otherwise.
    command: String,
    /// Launch in the background without waiting or capturing output.
    #[schemars(default)]
    is_detached: Option<bool>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct StoredCommandParams {
    /// Id of the group that owns the command.
    group_id: String,
    /// Id of the command within that group.
    command_id: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct ExecuteParams {
    /// Shell command text to run.
    command: String,
    /// Launch in the background and return immediately.
    #[schemars(default)]
    detached: Option<bool>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct ExportParams {
    /// Optional file to write the document to.
    #[schemars(default)]
    path: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct ImportParams {
    /// JSON catalog document, as produced by `export_data`.
    data: String,
    /// Merge into the existing catalog instead of replacing it.
    #[schemars(default)]
    merge: Option<bool>,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CmdgroupMcp {
    bridge: Arc<Mutex<Bridge>>,
    tool_router: ToolRouter<Self>,
}

/// Convert any `Display` error into an MCP internal error.
fn mcp_err(e: impl std::fmt::Display) -> rmcp::ErrorData {
    rmcp::ErrorData::internal_error(e.to_string(), None)
}

/// Render a bridge result: values as pretty JSON, bridge errors as tool errors.
fn tool_result<T: Serialize>(
    result: Result<T, BridgeError>,
) -> Result<CallToolResult, rmcp::ErrorData> {
    match result {
        Ok(value) => {
            let json = serde_json::to_string_pretty(&value).map_err(mcp_err)?;
            Ok(CallToolResult::success(vec![Content::text(json)]))
        }
        Err(err) => {
            let json = serde_json::to_string_pretty(&err).map_err(mcp_err)?;
            Ok(CallToolResult::error(vec![Content::text(json)]))
        }
    }
}

#[tool_router]
impl CmdgroupMcp {
    fn new(bridge: Bridge) -> Self {
        Self {
            bridge: Arc::new(Mutex::new(bridge)),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "List every command group with its commands, in creation order. Call \
        this first to discover group and command ids."
    )]
    async fn list_groups(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        self.with_bridge(|bridge| Ok(bridge.get_groups())).await
    }

    #[tool(description = "Create a new empty command group and return its id.")]
    async fn create_group(
        &self,
        Parameters(params): Parameters<CreateGroupParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        self.with_bridge(move |bridge| bridge.create_group(&params.name))
            .await
    }

    #[tool(description = "Delete a command group together with all of its commands.")]
    async fn delete_group(
        &self,
        Parameters(params): Parameters<GroupParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        self.with_bridge(move |bridge| bridge.delete_group(&params.group_id))
            .await
    }

    #[tool(description = "Append a named shell command to a group and return its id.")]
    async fn add_command(
        &self,
        Parameters(params): Parameters<AddCommandParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        self.with_bridge(move |bridge| {
            bridge.add_command_to_group(
                &params.group_id,
                &params.name,
                &params.command,
                params.is_detached.unwrap_or(false),
            )
        })
        .await
    }

    #[tool(description = "Remove a single command from a group.")]
    async fn delete_command(
        &self,
        Parameters(params): Parameters<StoredCommandParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        self.with_bridge(move |bridge| {
            bridge.delete_command_from_group(&params.group_id, &params.command_id)
        })
        .await
    }

    #[tool(
        description = "Run arbitrary shell command text. Blocks until it finishes and returns \
        its combined stdout and stderr, or launches it in the background when `detached` is \
        set. There is no timeout."
    )]
    async fn execute_command(
        &self,
        Parameters(params): Parameters<ExecuteParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        self.with_bridge(move |bridge| {
            if params.detached.unwrap_or(false) {
                bridge.execute_command_detached(&params.command)
            } else {
                bridge.execute_command(&params.command)
            }
        })
        .await
    }

    #[tool(description = "Run one stored command, honouring its detached flag.")]
    async fn run_command(
        &self,
        Parameters(params): Parameters<StoredCommandParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        self.with_bridge(move |bridge| {
            bridge.execute_stored_command(&params.group_id, &params.command_id)
        })
        .await
    }

    #[tool(
        description = "Run every command of a group one after another in stored order. A \
        failing command does not stop the rest. Returns each command's name, output and \
        whether it succeeded."
    )]
    async fn run_group(
        &self,
        Parameters(params): Parameters<GroupParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        self.with_bridge(move |bridge| bridge.execute_group_commands(&params.group_id))
            .await
    }

    #[tool(
        description = "Serialize the whole catalog as a JSON document, optionally writing it \
        to a file."
    )]
    async fn export_data(
        &self,
        Parameters(params): Parameters<ExportParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        self.with_bridge(move |bridge| {
            let target = params.path.map(PathBuf::from);
            bridge.export_data(target.as_deref())
        })
        .await
    }

    #[tool(
        description = "Replace (or merge into) the catalog from a JSON document. A malformed \
        document leaves the catalog unchanged."
    )]
    async fn import_data(
        &self,
        Parameters(params): Parameters<ImportParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        self.with_bridge(move |bridge| {
            bridge.import_data(&params.data, params.merge.unwrap_or(false))
        })
        .await
    }
}

impl CmdgroupMcp {
    /// Run `call` against the bridge on the blocking pool; calls are serialized by the lock.
    async fn with_bridge<T, F>(&self, call: F) -> Result<CallToolResult, rmcp::ErrorData>
    where
        T: Serialize + Send + 'static,
        F: FnOnce(&mut Bridge) -> Result<T, BridgeError> + Send + 'static,
    {
        let bridge = Arc::clone(&self.bridge);
        let result = tokio::task::spawn_blocking(move || {
            let mut guard = bridge.lock();
            call(&mut *guard)
        })
        .await
        .map_err(mcp_err)?;
        tool_result(result)
    }
}

#[tool_handler]
impl ServerHandler for CmdgroupMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "cmdgroup keeps a catalog of named shell commands organized into groups. Use \
                list_groups to see what exists, create_group/add_command to extend it, and \
                run_group or run_command to execute stored commands. Commands run one at a \
                time; detached commands are launched in the background and report nothing \
                back."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Start the MCP server over stdio.
///
/// # Errors
///
/// Returns an error if the MCP transport fails.
pub async fn run(bridge: Bridge) -> Result<(), Box<dyn std::error::Error>> {
    let server = CmdgroupMcp::new(bridge);
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}
