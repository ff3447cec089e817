//! Server-to-client requests over a live rmcp session: elicitation, sampling
//! and roots, answered by a scripted in-process client.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use plan_mcp::config::{Config, RetryPolicy};
use plan_mcp::mcp::PlanServer;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, ClientCapabilities, ClientInfo, Content,
    CreateElicitationRequestParam, CreateElicitationResult, CreateMessageRequestParam,
    CreateMessageResult, ElicitationAction, Implementation, ListRootsResult, Role, Root,
    SamplingMessage,
};
use rmcp::service::{RequestContext, RunningService};
use rmcp::{ClientHandler, ErrorData as McpError, RoleClient, ServiceExt};
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/models/gemini-test:generateContent";

const PLAN_REPLY: &str = r#"{"project_name": "Blog", "overview": "A blog", "phases": [{"name": "Build", "description": "All of it", "tasks": [{"id": "1", "title": "Posts", "description": "CRUD", "priority": "high"}]}]}"#;

const REVIEW_REPLY: &str = r#"{"summary": "Tidy", "overall_quality": "good"}"#;

/// Answers every server request from a fixed script and records what it was asked.
#[derive(Clone)]
struct ScriptedClient {
    action: ElicitationAction,
    answers: Value,
    sampled: &'static str,
    roots: Vec<Root>,
    questions: Arc<Mutex<Vec<CreateElicitationRequestParam>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedClient {
    fn new(action: ElicitationAction) -> Self {
        Self {
            action,
            answers: json!({}),
            sampled: "",
            roots: Vec::new(),
            questions: Arc::default(),
            prompts: Arc::default(),
        }
    }
}

impl ClientHandler for ScriptedClient {
    async fn create_elicitation(
        &self,
        request: CreateElicitationRequestParam,
        _context: RequestContext<RoleClient>,
    ) -> Result<CreateElicitationResult, McpError> {
        self.questions.lock().unwrap().push(request);
        let content = match self.action {
            ElicitationAction::Accept => Some(self.answers.clone()),
            _ => None,
        };
        Ok(CreateElicitationResult {
            action: self.action.clone(),
            content,
        })
    }

    async fn create_message(
        &self,
        params: CreateMessageRequestParam,
        _context: RequestContext<RoleClient>,
    ) -> Result<CreateMessageResult, McpError> {
        let prompt = params.messages[0]
            .content
            .as_text()
            .map(|t| t.text.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt);
        Ok(CreateMessageResult {
            model: "client-model".to_string(),
            stop_reason: Some(CreateMessageResult::STOP_REASON_END_TURN.to_string()),
            message: SamplingMessage {
                role: Role::Assistant,
                content: Content::text(self.sampled),
            },
        })
    }

    async fn list_roots(
        &self,
        _context: RequestContext<RoleClient>,
    ) -> Result<ListRootsResult, McpError> {
        Ok(ListRootsResult {
            roots: self.roots.clone(),
        })
    }

    fn get_info(&self) -> ClientInfo {
        ClientInfo {
            protocol_version: Default::default(),
            capabilities: ClientCapabilities::builder()
                .enable_roots()
                .enable_sampling()
                .enable_elicitation()
                .build(),
            client_info: Implementation {
                name: "scripted-client".to_string(),
                version: "1.0.0".to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
        }
    }
}

fn gemini_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    }))
}

async fn connect(
    mock: &MockServer,
    client: ScriptedClient,
) -> RunningService<RoleClient, ScriptedClient> {
    let config = Config::new("test-key")
        .with_model("gemini-test")
        .with_base_url(mock.uri())
        .with_timeout(Duration::from_secs(5))
        .with_retry(RetryPolicy {
            max_retries: 0,
            initial_backoff: Duration::from_millis(10),
            multiplier: 2.0,
            max_backoff: Duration::from_millis(10),
        });
    let server = PlanServer::new(Arc::new(config));

    let (server_transport, client_transport) = tokio::io::duplex(64 * 1024);
    tokio::spawn(async move {
        let running = server.serve(server_transport).await?;
        running.waiting().await?;
        anyhow::Ok(())
    });
    client
        .serve(client_transport)
        .await
        .expect("client handshake")
}

async fn call(
    client: &RunningService<RoleClient, ScriptedClient>,
    tool: &'static str,
    arguments: Value,
) -> Result<CallToolResult, rmcp::ServiceError> {
    client
        .call_tool(CallToolRequestParam {
            name: tool.into(),
            arguments: arguments.as_object().cloned(),
        })
        .await
}

fn body(result: &CallToolResult) -> Value {
    let text = &result.content[0].as_text().expect("text content").text;
    serde_json::from_str(text).expect("json body")
}

#[tokio::test]
async fn accepted_answers_reach_the_planning_prompt() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_string_contains("Technology Stack: Rust, htmx"))
        .respond_with(gemini_reply(PLAN_REPLY))
        .expect(1)
        .mount(&mock)
        .await;

    let mut script = ScriptedClient::new(ElicitationAction::Accept);
    script.answers = json!({
        "requirements": "posts, comments",
        "constraints": "two weeks",
        "tech_stack": "Rust, htmx"
    });
    let questions = script.questions.clone();
    let client = connect(&mock, script).await;

    let result = call(&client, "interactive_plan_project", json!({ "description": "a blog" }))
        .await
        .expect("tool call");
    let body = body(&result);

    assert_eq!(body["status"], "structured");
    assert_eq!(body["context"]["elicitation"], "accepted");
    let asked = questions.lock().unwrap();
    assert_eq!(asked.len(), 1);
    assert_eq!(asked[0].requested_schema.properties.len(), 3);
    drop(asked);

    client.cancel().await.expect("shutdown");
}

#[tokio::test]
async fn declined_questions_review_with_what_was_given() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(gemini_reply(REVIEW_REPLY))
        .expect(1)
        .mount(&mock)
        .await;

    let client = connect(&mock, ScriptedClient::new(ElicitationAction::Decline)).await;

    let result = call(&client, "interactive_review_code", json!({ "code": "x = 1" }))
        .await
        .expect("tool call");

    assert_eq!(body(&result)["context"]["elicitation"], "declined");
    client.cancel().await.expect("shutdown");
}

#[tokio::test]
async fn cancelled_questions_abort_the_call() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(gemini_reply(REVIEW_REPLY))
        .expect(0)
        .mount(&mock)
        .await;

    let client = connect(&mock, ScriptedClient::new(ElicitationAction::Cancel)).await;

    let err = call(&client, "interactive_review_code", json!({ "code": "x = 1" }))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Request cancelled"), "{}", err);
    client.cancel().await.expect("shutdown");
}

#[tokio::test]
async fn tests_are_generated_by_the_client_model() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(gemini_reply("unused"))
        .expect(0)
        .mount(&mock)
        .await;

    let mut script = ScriptedClient::new(ElicitationAction::Decline);
    script.sampled = "```python\ndef test_add():\n    assert add(1, 2) == 3\n```";
    let prompts = script.prompts.clone();
    let client = connect(&mock, script).await;

    let result = call(
        &client,
        "generate_tests",
        json!({ "code": "def add(a, b): return a + b", "test_framework": "pytest" }),
    )
    .await
    .expect("tool call");
    let body = body(&result);

    assert_eq!(body["status"], "structured");
    assert_eq!(body["kind"], "generate_tests");
    assert_eq!(body["context"]["source"], "sampling");
    assert_eq!(body["model"]["model"], "client-model");
    assert!(body["result"]["content"]
        .as_str()
        .is_some_and(|c| c.starts_with("def test_add():")));
    assert!(prompts.lock().unwrap()[0].contains("pytest"));

    client.cancel().await.expect("shutdown");
}

#[tokio::test]
async fn workspace_review_walks_the_client_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("app.py"), "print('hi')\n").expect("write");

    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_string_contains("--- app.py ---"))
        .respond_with(gemini_reply(REVIEW_REPLY))
        .expect(1)
        .mount(&mock)
        .await;

    let mut script = ScriptedClient::new(ElicitationAction::Decline);
    script.roots = vec![Root {
        uri: format!("file://{}", dir.path().display()),
        name: Some("app".to_string()),
    }];
    let client = connect(&mock, script).await;

    let roots = call(&client, "list_workspace_roots", json!({}))
        .await
        .expect("roots");
    let roots = body(&roots);
    assert_eq!(roots["source"], "client");
    assert_eq!(roots["roots"][0]["name"], "app");

    let review = call(&client, "review_workspace", json!({ "root": "app" }))
        .await
        .expect("review");
    let review = body(&review);
    assert_eq!(review["kind"], "review_directory");
    assert_eq!(review["context"]["files_included"], 1);

    client.cancel().await.expect("shutdown");
}
