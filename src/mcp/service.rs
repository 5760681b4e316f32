//! MCP service implementation using rmcp.
//!
//! Exposes the bridge as MCP tools via the rmcp framework's macros. Every
//! tool is a thin translation onto the shared core: configure, dispatch,
//! status and the schema probes.

use crate::db::{self, PoolManager, schema};
use crate::models::{
    ConnectionInfo, ConnectionSummary, CrudIntent, ParamValue, QueryOutcome, StatusReport,
};
use rmcp::{
    ErrorData as McpError, Json, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Input for the query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryInput {
    /// SQL statement to execute
    pub sql: String,
    /// Positional parameters for $1, $2, ... placeholders
    #[serde(default)]
    pub params: Vec<ParamValue>,
}

/// Output from the setup tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SetupOutput {
    pub success: bool,
    pub message: String,
    /// Accepted connection parameters (password omitted)
    pub connection: ConnectionSummary,
}

/// Input for the describe_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DescribeTableInput {
    /// Name of the table to describe
    pub table: String,
}

/// Output from the list_tables tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListTablesOutput {
    pub tables: Vec<String>,
    pub count: usize,
}

/// Output from the describe_table tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DescribeTableOutput {
    pub table: String,
    pub columns: Vec<schema::ColumnInfo>,
}

#[derive(Clone)]
pub struct PgService {
    /// Shared pool manager backing every tool call
    manager: Arc<PoolManager>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl PgService {
    pub fn new(manager: Arc<PoolManager>) -> Self {
        Self {
            manager,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl PgService {
    #[tool(
        description = "Set up the PostgreSQL connection.\nTests the target before accepting it; the previous connection keeps serving if the test fails.\nThe accepted configuration is persisted for the next start."
    )]
    async fn setup(
        &self,
        Parameters(info): Parameters<ConnectionInfo>,
    ) -> Result<Json<SetupOutput>, McpError> {
        let connection = self
            .manager
            .configure(info)
            .await
            .map_err(McpError::from)?;
        Ok(Json(SetupOutput {
            success: true,
            message: "PostgreSQL connection established successfully".to_string(),
            connection,
        }))
    }

    #[tool(
        description = "Run a SQL query against the configured database.\nSupports positional parameters ($1, $2, ...) to prevent SQL injection.\nReturns rows, the row count and the command tag."
    )]
    async fn query(
        &self,
        Parameters(input): Parameters<QueryInput>,
    ) -> Result<Json<QueryOutcome>, McpError> {
        db::dispatch(
            &self.manager,
            CrudIntent::RawQuery {
                sql: input.sql,
                params: input.params,
            },
        )
        .await
        .map(Json)
        .map_err(McpError::from)
    }

    #[tool(
        description = "Check the PostgreSQL connection status.\nReports not_configured, connected or error, with a redacted connection summary."
    )]
    async fn status(&self) -> Json<StatusReport> {
        Json(self.manager.status().await)
    }

    #[tool(description = "List all tables in the public schema of the configured database.")]
    async fn list_tables(&self) -> Result<Json<ListTablesOutput>, McpError> {
        let pool = self.manager.pool().await.map_err(McpError::from)?;
        let tables = schema::list_tables(&pool)
            .await
            .map_err(McpError::from)?;
        let count = tables.len();
        Ok(Json(ListTablesOutput { tables, count }))
    }

    #[tool(
        description = "Get detailed column information for a table.\nReturns name, data type, nullability and default for each column."
    )]
    async fn describe_table(
        &self,
        Parameters(input): Parameters<DescribeTableInput>,
    ) -> Result<Json<DescribeTableOutput>, McpError> {
        let pool = self.manager.pool().await.map_err(McpError::from)?;
        let columns = schema::describe_table(&pool, &input.table)
            .await
            .map_err(McpError::from)?;
        Ok(Json(DescribeTableOutput {
            table: input.table,
            columns,
        }))
    }
}

#[tool_handler]
impl ServerHandler for PgService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "pg-mcp-server".to_owned(),
                title: Some("PostgreSQL MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "PostgreSQL bridge tools.\n\
                \n\
                ## Workflow\n\
                1. Call `setup` with host, database and user (plus password/port/ssl as needed)\n\
                2. Use `query` for SQL, `list_tables`/`describe_table` to explore the schema\n\
                3. `status` reports the connection state with credentials redacted\n\
                \n\
                Until `setup` succeeds once, every other tool reports that the\n\
                database is not configured. Reconfiguring is safe while queries\n\
                are running: in-flight work finishes on the old connection pool."
                    .to_string(),
            ),
        }
    }
}
