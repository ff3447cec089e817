//! MCP server that sends planning, review and analysis requests to Gemini.
//!
//! Every model-backed tool runs the same pipeline: bind parameters, validate,
//! build the prompt, call the model, parse the reply. Parsing never fails, so
//! a successful model call always yields a [`ToolOutput`], structured or
//! degraded.

mod peer;
mod prompt_catalog;
mod resources;
mod types;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

pub use peer::{merge_plan_answers, merge_review_answers, Elicitation};
pub use types::*;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, GetPromptRequestParam, GetPromptResult, Implementation,
        ListPromptsResult, ListResourceTemplatesResult, ListResourcesResult,
        PaginatedRequestParam, PromptMessage, PromptMessageRole, ReadResourceRequestParam,
        ReadResourceResult, ResourceContents, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, tool_handler, tool_router, ErrorData as McpError, RoleServer, ServerHandler,
    ServiceExt,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::error::ToolError;
use crate::llm::{GeminiClient, ModelReply};
use crate::models::*;
use crate::parser;
use crate::prompts::build_prompt;
use crate::workspace::{self, DirectorySnapshot, DirectoryWalker, WalkLimits, WorkspaceError};
use prompt_catalog::PromptTarget;

#[derive(Clone)]
pub struct PlanServer {
    config: Arc<Config>,
    model: GeminiClient,
    walk_limits: WalkLimits,
    tool_router: ToolRouter<Self>,
}

impl PlanServer {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            model: GeminiClient::new(config.clone()),
            config,
            walk_limits: WalkLimits::default(),
            tool_router: Self::tool_router(),
        }
    }

    pub fn with_walk_limits(mut self, limits: WalkLimits) -> Self {
        self.walk_limits = limits;
        self
    }

    // ============================================================
    // Pipeline - shared by the tool handlers and exposed for tests
    // ============================================================

    /// Validate, prompt, call Gemini and parse.
    pub async fn execute(&self, request: ToolRequest) -> Result<ToolOutput, ToolError> {
        let request = request.validate()?;
        let prompt = build_prompt(&request);
        self.complete(request.kind(), &prompt).await
    }

    async fn complete(&self, kind: OperationKind, prompt: &str) -> Result<ToolOutput, ToolError> {
        let reply = self
            .model
            .generate(prompt, &self.model.default_options())
            .await?;
        Ok(Self::finish(kind, &reply))
    }

    fn finish(kind: OperationKind, reply: &ModelReply) -> ToolOutput {
        let outcome = parser::parse(kind, reply);
        if let Some(result) = outcome.structured() {
            tracing::info!(kind = kind.as_str(), "Structured {}", result.summary_line());
        }
        ToolOutput::new(outcome, reply.meta())
    }

    /// Walk a directory and review its source files as one codebase.
    pub async fn review_path(
        &self,
        params: ReviewDirectoryParams,
        ct: CancellationToken,
    ) -> Result<ToolOutput, ToolError> {
        let directory_path = params.directory_path.trim().to_string();
        if directory_path.is_empty() {
            return Err(FieldError {
                field: "directory_path",
            }
            .into());
        }

        let snapshot = self
            .snapshot(
                PathBuf::from(&directory_path),
                &params.include_patterns,
                &params.exclude_patterns,
                ct,
            )
            .await?;
        let context = json!({
            "directory_path": directory_path,
            "include_patterns": params.include_patterns,
            "exclude_patterns": params.exclude_patterns,
            "files_included": snapshot.files_included,
            "truncated": snapshot.truncated,
        });

        let request = ToolRequest::ReviewDirectory(ReviewDirectoryRequest {
            directory_path,
            contents: snapshot.rendered,
            focus_areas: params.focus_areas,
            include_patterns: params.include_patterns,
            exclude_patterns: params.exclude_patterns,
        });
        Ok(self.execute(request).await?.with_context(context))
    }

    async fn snapshot(
        &self,
        root: PathBuf,
        include: &[String],
        exclude: &[String],
        ct: CancellationToken,
    ) -> Result<DirectorySnapshot, ToolError> {
        let walker = DirectoryWalker::new(self.walk_limits.clone())
            .with_patterns(include, exclude)?
            .with_cancellation(ct);
        let snapshot = tokio::task::spawn_blocking(move || walker.snapshot(&root))
            .await
            .map_err(join_error)??;
        Ok(snapshot)
    }

    /// Docs and tests go to the client's model when it can sample, else to Gemini.
    async fn generate_artifact(
        &self,
        request: ToolRequest,
        peer: &rmcp::service::Peer<RoleServer>,
    ) -> Result<ToolOutput, ToolError> {
        let request = request.validate()?;
        let prompt = build_prompt(&request);

        if let Some(sampled) = peer::sample(peer, &prompt).await? {
            let reply = ModelReply::from_text(sampled.text, sampled.model);
            let output = Self::finish(request.kind(), &reply);
            return Ok(output.with_context(json!({ "source": "sampling" })));
        }
        Ok(self
            .complete(request.kind(), &prompt)
            .await?
            .with_context(json!({ "source": "gemini" })))
    }

    /// Text of a `file://`, `dir://` or `workspace://current` resource.
    pub async fn read_resource_text(
        &self,
        uri: &str,
        ct: CancellationToken,
    ) -> Result<String, ToolError> {
        let walker = DirectoryWalker::new(self.walk_limits.clone()).with_cancellation(ct);
        let uri = uri.to_string();
        let text = tokio::task::spawn_blocking(move || workspace::read_resource(&uri, &walker))
            .await
            .map_err(join_error)??;
        Ok(text)
    }

    /// Render a catalog prompt with the given arguments.
    pub async fn render_prompt(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
        ct: CancellationToken,
    ) -> Result<GetPromptResult, ToolError> {
        let request = match prompt_catalog::resolve(name, arguments)? {
            PromptTarget::Request(request) => request,
            PromptTarget::Directory(params) => {
                let snapshot = self
                    .snapshot(
                        PathBuf::from(params.directory_path.trim()),
                        &params.include_patterns,
                        &params.exclude_patterns,
                        ct,
                    )
                    .await?;
                ToolRequest::ReviewDirectory(ReviewDirectoryRequest {
                    directory_path: params.directory_path,
                    contents: snapshot.rendered,
                    focus_areas: params.focus_areas,
                    include_patterns: params.include_patterns,
                    exclude_patterns: params.exclude_patterns,
                })
            }
        };
        let request = request.validate()?;

        Ok(GetPromptResult {
            description: prompt_catalog::description(name).map(str::to_string),
            messages: vec![PromptMessage::new_text(
                PromptMessageRole::User,
                build_prompt(&request),
            )],
        })
    }

    async fn workspace_roots(
        &self,
        peer: &rmcp::service::Peer<RoleServer>,
    ) -> Result<RootsResponse, ToolError> {
        if let Some(roots) = peer::list_roots(peer).await {
            return Ok(RootsResponse {
                source: "client",
                roots,
            });
        }
        let cwd = std::env::current_dir().map_err(|source| WorkspaceError::Io {
            path: ".".to_string(),
            source,
        })?;
        Ok(RootsResponse {
            source: "server_cwd",
            roots: vec![RootInfo {
                uri: format!("{}{}", workspace::FILE_SCHEME, cwd.display()),
                name: cwd.file_name().map(|n| n.to_string_lossy().into_owned()),
                path: Some(cwd.display().to_string()),
            }],
        })
    }
}

fn join_error(e: tokio::task::JoinError) -> ToolError {
    ToolError::Workspace(WorkspaceError::Io {
        path: "<walker>".to_string(),
        source: std::io::Error::other(e),
    })
}

/// Run one tool call inside its own span, racing it against cancellation.
async fn run_tool<T, F>(
    tool: &'static str,
    ct: CancellationToken,
    work: F,
) -> Result<CallToolResult, McpError>
where
    T: Serialize,
    F: Future<Output = Result<T, ToolError>>,
{
    let span = tracing::info_span!("tool", name = tool, request_id = %Uuid::new_v4());
    async move {
        tracing::info!("Tool call started");
        let result = tokio::select! {
            biased;
            _ = ct.cancelled() => Err(ToolError::Cancelled),
            result = work => result,
        };
        match result {
            Ok(value) => {
                tracing::info!("Tool call finished");
                json_result(&value)
            }
            Err(e) => {
                tracing::warn!(kind = e.kind(), "Tool call failed: {}", e);
                e.into_tool_result()
            }
        }
    }
    .instrument(span)
    .await
}

#[tool_router]
impl PlanServer {
    // ============================================================
    // Core Tools
    // ============================================================

    #[tool(
        description = "Create a phased project plan from a description. Returns JSON with status 'structured' (phases, tasks with priorities and dependencies, risks) or 'degraded' (raw model text when the reply could not be structured)."
    )]
    async fn plan_project(
        &self,
        params: Parameters<PlanProjectParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        run_tool("plan_project", context.ct, self.execute(params.0.into())).await
    }

    #[tool(
        description = "Revise an existing project plan based on feedback. Takes the plan returned by plan_project and returns a refined plan in the same shape."
    )]
    async fn refine_plan(
        &self,
        params: Parameters<RefinePlanParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        run_tool("refine_plan", context.ct, self.execute(params.0.into())).await
    }

    #[tool(
        description = "Review code for quality, bugs, security and style. Returns a summary, an overall quality rating, issues with severity and line numbers, suggestions and strengths."
    )]
    async fn review_code(
        &self,
        params: Parameters<ReviewCodeParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        run_tool("review_code", context.ct, self.execute(params.0.into())).await
    }

    #[tool(
        description = "Analyze a program run: explain what went wrong, the root cause, and concrete fixes with confidence levels."
    )]
    async fn analyze_execution(
        &self,
        params: Parameters<AnalyzeExecutionParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        run_tool("analyze_execution", context.ct, self.execute(params.0.into())).await
    }

    #[tool(
        description = "Debug a specific error from its message and optional stack trace. Returns the root cause and suggested fixes with confidence levels."
    )]
    async fn debug_error(
        &self,
        params: Parameters<DebugErrorParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        run_tool("debug_error", context.ct, self.execute(params.0.into())).await
    }

    #[tool(
        description = "Compare two implementations of the same behavior: differences, performance, readability, best practices, and which one to use."
    )]
    async fn compare_implementations(
        &self,
        params: Parameters<CompareImplementationsParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        run_tool("compare_implementations", context.ct, self.execute(params.0.into())).await
    }

    #[tool(
        description = "Review every source file in a directory as one codebase. Hidden files, node_modules, virtualenvs and build output are skipped; the walk is depth and size limited."
    )]
    async fn review_directory(
        &self,
        params: Parameters<ReviewDirectoryParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let work = self.review_path(params.0, context.ct.clone());
        run_tool("review_directory", context.ct, work).await
    }

    // ============================================================
    // Interactive Tools - ask the client for missing details first
    // ============================================================

    #[tool(
        description = "Like plan_project, but first asks the user for requirements, constraints and tech stack when they were not given. Declining the questions plans with what was provided."
    )]
    async fn interactive_plan_project(
        &self,
        params: Parameters<PlanProjectParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let work = async {
            ToolRequest::from(params.clone()).validate()?;
            let questions = peer::plan_questions(&params);
            let answers = peer::elicit(
                &context.peer,
                "A few details will sharpen the project plan.",
                &questions,
            )
            .await;
            let params = match &answers {
                Elicitation::Cancelled => return Err(ToolError::Cancelled),
                Elicitation::Accepted(values) => merge_plan_answers(params, values),
                _ => params,
            };
            let output = self.execute(params.into()).await?;
            Ok(output.with_context(json!({ "elicitation": answers.as_str() })))
        };
        run_tool("interactive_plan_project", context.ct.clone(), work).await
    }

    #[tool(
        description = "Like review_code, but first asks the user what the code is for and what to focus on when that was not given."
    )]
    async fn interactive_review_code(
        &self,
        params: Parameters<ReviewCodeParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let work = async {
            ToolRequest::from(params.clone()).validate()?;
            let questions = peer::review_questions(&params);
            let answers = peer::elicit(
                &context.peer,
                "Tell the reviewer a little more about this code.",
                &questions,
            )
            .await;
            let params = match &answers {
                Elicitation::Cancelled => return Err(ToolError::Cancelled),
                Elicitation::Accepted(values) => merge_review_answers(params, values),
                _ => params,
            };
            let output = self.execute(params.into()).await?;
            Ok(output.with_context(json!({ "elicitation": answers.as_str() })))
        };
        run_tool("interactive_review_code", context.ct.clone(), work).await
    }

    // ============================================================
    // Generation Tools - use the client's model when it can sample
    // ============================================================

    #[tool(
        description = "Write documentation for code. Uses the client's own model via sampling when available, otherwise Gemini. Returns the generated documentation as an artifact."
    )]
    async fn generate_docs(
        &self,
        params: Parameters<GenerateDocsParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let work = self.generate_artifact(params.0.into(), &context.peer);
        run_tool("generate_docs", context.ct.clone(), work).await
    }

    #[tool(
        description = "Write unit tests for code. Uses the client's own model via sampling when available, otherwise Gemini. Returns the generated test file as an artifact."
    )]
    async fn generate_tests(
        &self,
        params: Parameters<GenerateTestsParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let work = self.generate_artifact(params.0.into(), &context.peer);
        run_tool("generate_tests", context.ct.clone(), work).await
    }

    // ============================================================
    // Workspace Tools - use the client's roots
    // ============================================================

    #[tool(
        description = "List the workspace roots the client exposes. Falls back to the server's working directory when the client has none."
    )]
    async fn list_workspace_roots(
        &self,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let work = self.workspace_roots(&context.peer);
        run_tool("list_workspace_roots", context.ct.clone(), work).await
    }

    #[tool(
        description = "Review a whole workspace root as one codebase. Picks the root by URI, path or name, or the first root when none is given."
    )]
    async fn review_workspace(
        &self,
        params: Parameters<ReviewWorkspaceParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let work = async {
            let roots = self.workspace_roots(&context.peer).await?;
            let root = peer::select_root(&roots.roots, params.root.as_deref()).ok_or_else(|| {
                ToolError::Validation(format!(
                    "No workspace root matches '{}'",
                    params.root.as_deref().unwrap_or_default()
                ))
            })?;
            let path = root
                .path
                .clone()
                .ok_or_else(|| WorkspaceError::UnsupportedUri(root.uri.clone()))?;

            let mut directory: ReviewDirectoryParams = params.clone().into();
            directory.directory_path = path;
            self.review_path(directory, context.ct.clone()).await
        };
        run_tool("review_workspace", context.ct.clone(), work).await
    }
}

#[tool_handler]
impl ServerHandler for PlanServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: self.config.server_name.clone(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            instructions: Some(
                r#"plan-mcp sends planning, code review and execution analysis requests to Gemini and returns the replies as JSON.

TOOLS:
- plan_project / interactive_plan_project: phased plan with tasks, priorities and risks
- refine_plan: revise a plan from feedback
- review_code / interactive_review_code: issues with severity, suggestions, strengths
- analyze_execution: root cause and suggested fixes for a failed or surprising run
- debug_error: root cause and fixes for a specific error message
- compare_implementations: differences between two implementations and which to use
- review_directory / review_workspace: review a whole directory or workspace root
- generate_docs / generate_tests: documentation or tests as a single code block
- list_workspace_roots: the roots review_workspace can choose from

RESULTS:
Every model-backed tool returns {"status": "structured", "result": ...} when the reply
matched the expected shape, or {"status": "degraded", "raw_text": ...} with the model's
text unchanged when it did not. Provider failures come back as tool errors with
{"error": "auth" | "upstream" | "quota_exceeded", "message": ...}.

RESOURCES:
- workspace://current: the server's working directory
- file://{path}: a file, or a directory rendering
- dir://{path}: a directory rendering"#
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(resources::list()))
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        Ok(ListResourceTemplatesResult::with_all_items(
            resources::templates(),
        ))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let text = self
            .read_resource_text(&request.uri, context.ct)
            .await
            .map_err(|e| match e {
                ToolError::Workspace(WorkspaceError::NotFound(_)) => {
                    McpError::resource_not_found(e.to_string(), None)
                }
                other => other.into(),
            })?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, request.uri)],
        })
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(ListPromptsResult::with_all_items(prompt_catalog::list()))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        let arguments = request.arguments.unwrap_or_default();
        Ok(self
            .render_prompt(&request.name, &arguments, context.ct)
            .await?)
    }
}

pub async fn run_stdio_server(config: Arc<Config>) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!(model = %config.model, "Starting MCP server via stdio");

    let service = PlanServer::new(config);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}
