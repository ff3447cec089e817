//! Requests this server sends back to the connected client: elicitation,
//! sampling and roots.

use std::collections::BTreeMap;

use rmcp::model::{
    Content, CreateElicitationRequestParam, CreateElicitationResult, CreateMessageRequestParam,
    CreateMessageResult, ElicitationAction, ElicitationSchema, PrimitiveSchema, Role,
    SamplingMessage, StringSchema,
};
use rmcp::service::Peer;
use rmcp::RoleServer;
use serde_json::{Map, Value};

use super::types::{PlanProjectParams, ReviewCodeParams, RootInfo};
use crate::error::ToolError;
use crate::workspace::root_uri_to_path;

const SAMPLING_MAX_TOKENS: u32 = 4096;

/// Result of asking the client for more input.
#[derive(Debug, Clone, PartialEq)]
pub enum Elicitation {
    Accepted(Map<String, Value>),
    Declined,
    Cancelled,
    /// The client does not support elicitation or the round trip failed.
    Unavailable,
    /// Nothing needed asking.
    Skipped,
}

impl Elicitation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Elicitation::Accepted(_) => "accepted",
            Elicitation::Declined => "declined",
            Elicitation::Cancelled => "cancelled",
            Elicitation::Unavailable => "unavailable",
            Elicitation::Skipped => "skipped",
        }
    }
}

fn supports_elicitation(peer: &Peer<RoleServer>) -> bool {
    peer.peer_info()
        .is_some_and(|info| info.capabilities.elicitation.is_some())
}

pub fn supports_sampling(peer: &Peer<RoleServer>) -> bool {
    peer.peer_info()
        .is_some_and(|info| info.capabilities.sampling.is_some())
}

fn supports_roots(peer: &Peer<RoleServer>) -> bool {
    peer.peer_info()
        .is_some_and(|info| info.capabilities.roots.is_some())
}

/// Ask the client to fill in `fields`, each a `(name, description)` pair of
/// free-text answers.
pub async fn elicit(
    peer: &Peer<RoleServer>,
    message: &str,
    fields: &[(&str, &str)],
) -> Elicitation {
    if fields.is_empty() {
        return Elicitation::Skipped;
    }
    if !supports_elicitation(peer) {
        tracing::debug!("Client does not support elicitation");
        return Elicitation::Unavailable;
    }

    match peer.create_elicitation(elicitation_request(message, fields)).await {
        Ok(result) => read_elicitation_reply(result),
        Err(e) => {
            tracing::warn!("Elicitation failed, continuing without it: {}", e);
            Elicitation::Unavailable
        }
    }
}

/// One optional free-text property per field.
fn elicitation_request(message: &str, fields: &[(&str, &str)]) -> CreateElicitationRequestParam {
    let properties: BTreeMap<String, PrimitiveSchema> = fields
        .iter()
        .map(|(name, description)| {
            let schema = StringSchema::new().description(description.to_string());
            (name.to_string(), PrimitiveSchema::String(schema))
        })
        .collect();
    CreateElicitationRequestParam {
        message: message.to_string(),
        requested_schema: ElicitationSchema::new(properties),
    }
}

fn read_elicitation_reply(reply: CreateElicitationResult) -> Elicitation {
    match reply.action {
        ElicitationAction::Accept => match reply.content {
            Some(Value::Object(answers)) => Elicitation::Accepted(answers),
            _ => Elicitation::Accepted(Map::new()),
        },
        ElicitationAction::Decline => Elicitation::Declined,
        ElicitationAction::Cancel => Elicitation::Cancelled,
    }
}

/// Questions still open for a planning request.
pub fn plan_questions(params: &PlanProjectParams) -> Vec<(&'static str, &'static str)> {
    let mut fields = Vec::new();
    if params.requirements.is_empty() {
        fields.push(("requirements", "Key requirements, comma-separated"));
    }
    if params.constraints.is_empty() {
        fields.push(("constraints", "Constraints (budget, timeline, team), comma-separated"));
    }
    if params.tech_stack.is_empty() {
        fields.push(("tech_stack", "Preferred technologies, comma-separated"));
    }
    fields
}

/// Questions still open for a review request.
pub fn review_questions(params: &ReviewCodeParams) -> Vec<(&'static str, &'static str)> {
    let mut fields = Vec::new();
    if params.context.as_deref().is_none_or(|c| c.trim().is_empty()) {
        fields.push(("context", "What the code does and where it runs"));
    }
    if params.focus_areas.is_empty() {
        fields.push(("focus_areas", "Aspects to focus on, comma-separated"));
    }
    fields
}

/// Fill empty planning fields from accepted answers. Provided values win.
pub fn merge_plan_answers(
    mut params: PlanProjectParams,
    answers: &Map<String, Value>,
) -> PlanProjectParams {
    if params.requirements.is_empty() {
        params.requirements = answer_list(answers, "requirements");
    }
    if params.constraints.is_empty() {
        params.constraints = answer_list(answers, "constraints");
    }
    if params.tech_stack.is_empty() {
        params.tech_stack = answer_list(answers, "tech_stack");
    }
    params
}

/// Fill empty review fields from accepted answers. Provided values win.
pub fn merge_review_answers(
    mut params: ReviewCodeParams,
    answers: &Map<String, Value>,
) -> ReviewCodeParams {
    if params.context.as_deref().is_none_or(|c| c.trim().is_empty()) {
        params.context = answers
            .get("context")
            .and_then(Value::as_str)
            .map(str::to_string);
    }
    if params.focus_areas.is_empty() {
        params.focus_areas = answer_list(answers, "focus_areas");
    }
    params
}

/// Answers arrive as a comma-separated string or a JSON array of strings.
fn answer_list(answers: &Map<String, Value>, key: &str) -> Vec<String> {
    match answers.get(key) {
        Some(Value::String(s)) => s
            .split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Text and model name from a client-side sampling call.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledText {
    pub text: String,
    pub model: String,
}

/// Ask the client's own model to complete `prompt`.
///
/// `Ok(None)` means the client cannot sample and the caller should fall back
/// to the Gemini client.
pub async fn sample(
    peer: &Peer<RoleServer>,
    prompt: &str,
) -> Result<Option<SampledText>, ToolError> {
    if !supports_sampling(peer) {
        return Ok(None);
    }

    match peer.create_message(sampling_request(prompt)).await {
        Ok(result) => Ok(Some(read_sampling_reply(result))),
        Err(e) => {
            tracing::warn!("Sampling failed, falling back to Gemini: {}", e);
            Ok(None)
        }
    }
}

fn sampling_request(prompt: &str) -> CreateMessageRequestParam {
    CreateMessageRequestParam {
        messages: vec![SamplingMessage {
            role: Role::User,
            content: Content::text(prompt),
        }],
        model_preferences: None,
        system_prompt: None,
        include_context: None,
        temperature: None,
        max_tokens: SAMPLING_MAX_TOKENS,
        stop_sequences: None,
        metadata: None,
    }
}

fn read_sampling_reply(reply: CreateMessageResult) -> SampledText {
    let text = reply
        .message
        .content
        .as_text()
        .map(|t| t.text.clone())
        .unwrap_or_default();
    let model = match reply.model.trim() {
        "" => "client".to_string(),
        model => model.to_string(),
    };
    SampledText { text, model }
}

/// Workspace roots advertised by the client, or `None` when it has none to give.
pub async fn list_roots(peer: &Peer<RoleServer>) -> Option<Vec<RootInfo>> {
    if !supports_roots(peer) {
        return None;
    }
    match peer.list_roots().await {
        Ok(result) => Some(
            result
                .roots
                .into_iter()
                .map(|root| RootInfo {
                    path: root_uri_to_path(&root.uri).map(|p| p.display().to_string()),
                    uri: root.uri,
                    name: root.name,
                })
                .collect(),
        ),
        Err(e) => {
            tracing::warn!("Listing client roots failed: {}", e);
            None
        }
    }
}

/// Pick the root matching `wanted` by URI, path or name, or the first one.
pub fn select_root<'a>(roots: &'a [RootInfo], wanted: Option<&str>) -> Option<&'a RootInfo> {
    match wanted.map(str::trim).filter(|w| !w.is_empty()) {
        Some(wanted) => roots.iter().find(|root| {
            root.uri == wanted
                || root.path.as_deref() == Some(wanted)
                || root.name.as_deref() == Some(wanted)
        }),
        None => roots.first(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn reply(action: ElicitationAction, content: Option<Value>) -> CreateElicitationResult {
        CreateElicitationResult { action, content }
    }

    #[test]
    fn reads_elicitation_actions() {
        let accepted = read_elicitation_reply(reply(
            ElicitationAction::Accept,
            Some(json!({ "requirements": "auth, search" })),
        ));
        let Elicitation::Accepted(answers) = accepted else {
            panic!("expected accepted");
        };
        assert_eq!(answers["requirements"], "auth, search");

        assert_eq!(
            read_elicitation_reply(reply(ElicitationAction::Accept, None)),
            Elicitation::Accepted(Map::new())
        );
        assert_eq!(
            read_elicitation_reply(reply(ElicitationAction::Decline, None)),
            Elicitation::Declined
        );
        assert_eq!(
            read_elicitation_reply(reply(ElicitationAction::Cancel, None)),
            Elicitation::Cancelled
        );
    }

    #[test]
    fn plan_questions_become_an_object_schema() {
        let questions = plan_questions(&PlanProjectParams {
            description: "a blog".into(),
            ..Default::default()
        });
        let request = elicitation_request("More details please.", &questions);

        assert_eq!(request.message, "More details please.");
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["requestedSchema"]["type"], "object");
        let properties = wire["requestedSchema"]["properties"].as_object().unwrap();
        assert_eq!(properties.len(), 3);
        assert_eq!(properties["tech_stack"]["type"], "string");
        assert_eq!(
            properties["constraints"]["description"],
            "Constraints (budget, timeline, team), comma-separated"
        );
        assert!(wire["requestedSchema"].get("required").is_none());
    }

    #[test]
    fn review_questions_become_an_object_schema() {
        let questions = review_questions(&ReviewCodeParams {
            code: "x = 1".into(),
            ..Default::default()
        });
        let request = elicitation_request("Tell me more.", &questions);

        let keys: Vec<&String> = request.requested_schema.properties.keys().collect();
        assert_eq!(keys, vec!["context", "focus_areas"]);
    }

    #[test]
    fn sampling_request_carries_the_prompt() {
        let request = sampling_request("Write tests for add()");

        assert_eq!(request.max_tokens, SAMPLING_MAX_TOKENS);
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, Role::User);
        assert_eq!(
            request.messages[0].content.as_text().map(|t| t.text.as_str()),
            Some("Write tests for add()")
        );
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire["maxTokens"], SAMPLING_MAX_TOKENS);
        assert_eq!(wire["messages"][0]["content"]["type"], "text");
    }

    #[test]
    fn merge_keeps_provided_values() {
        let params = PlanProjectParams {
            description: "a blog".into(),
            requirements: vec!["comments".into()],
            ..Default::default()
        };
        let answers = json!({
            "requirements": "ignored",
            "constraints": "two weeks, one developer",
            "tech_stack": ["Rust", "Postgres"]
        });
        let merged = merge_plan_answers(params, answers.as_object().unwrap());

        assert_eq!(merged.requirements, vec!["comments"]);
        assert_eq!(merged.constraints, vec!["two weeks", "one developer"]);
        assert_eq!(merged.tech_stack, vec!["Rust", "Postgres"]);
    }

    #[test]
    fn review_questions_skip_answered_fields() {
        let params = ReviewCodeParams {
            code: "x = 1".into(),
            context: Some("CLI script".into()),
            ..Default::default()
        };
        let questions = review_questions(&params);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].0, "focus_areas");

        let merged = merge_review_answers(
            params,
            json!({"focus_areas": "security"}).as_object().unwrap(),
        );
        assert_eq!(merged.context.as_deref(), Some("CLI script"));
        assert_eq!(merged.focus_areas, vec!["security"]);
    }

    #[test]
    fn reads_sampled_text_and_model() {
        let sampled = read_sampling_reply(CreateMessageResult {
            model: "claude".into(),
            stop_reason: Some(CreateMessageResult::STOP_REASON_END_TURN.into()),
            message: SamplingMessage {
                role: Role::Assistant,
                content: Content::text("```\ntests\n```"),
            },
        });
        assert_eq!(sampled.text, "```\ntests\n```");
        assert_eq!(sampled.model, "claude");

        let unnamed = read_sampling_reply(CreateMessageResult {
            model: String::new(),
            stop_reason: None,
            message: SamplingMessage {
                role: Role::Assistant,
                content: Content::text("ok"),
            },
        });
        assert_eq!(unnamed.model, "client");
    }

    #[test]
    fn selects_roots_by_uri_name_or_default() {
        let roots = vec![
            RootInfo {
                uri: "file:///work/api".into(),
                name: Some("api".into()),
                path: Some("/work/api".into()),
            },
            RootInfo {
                uri: "file:///work/web".into(),
                name: Some("web".into()),
                path: Some("/work/web".into()),
            },
        ];

        assert_eq!(select_root(&roots, None).unwrap().uri, "file:///work/api");
        assert_eq!(select_root(&roots, Some("web")).unwrap().uri, "file:///work/web");
        assert_eq!(select_root(&roots, Some("/work/web")).unwrap().name.as_deref(), Some("web"));
        assert!(select_root(&roots, Some("missing")).is_none());
    }
}
