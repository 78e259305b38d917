use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::Display;

use super::{SearchField, SearchQuery};

/// Natural-language summary of every member's preferences
///
/// Recomputed on each request and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedSummary(String);

impl AggregatedSummary {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lines of the summary, one per member
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.0.lines()
    }
}

impl Display for AggregatedSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declaration of the one tool the model must call
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolSpec {
    pub const EVENT_SEARCH: &'static str = "event_search";

    /// The shared-interest search tool
    pub fn event_search() -> Self {
        let fields: Vec<&str> = SearchField::ALL.iter().map(SearchField::as_str).collect();

        Self {
            name: Self::EVENT_SEARCH.to_string(),
            description: "Get an event or destination based on user interest".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "field": {
                        "type": "string",
                        "enum": fields,
                        "description": "The field to search for events or destinations"
                    },
                    "term": {
                        "type": "string",
                        "description": "The common denominator between the users, used as the search term"
                    }
                },
                "required": ["term"]
            }),
        }
    }
}

/// A single forced tool-call request sent to the model
#[derive(Debug, Clone)]
pub struct ToolInvocationRequest {
    pub instructions: String,
    pub summary: AggregatedSummary,
    /// Always forced: the model must answer with a call to this tool, never free text
    pub tool: ToolSpec,
}

impl ToolInvocationRequest {
    /// The user turn carrying the group summary
    pub fn user_message(&self) -> String {
        format!(
            "Here are the names of the users and their respective likes and dislikes.\n{}\n\
             Determine the shared likes and dislikes of the users and query the tool to \
             determine the most likely enjoyable event.",
            self.summary
        )
    }
}

/// One tool call found in a model reply
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub input: Value,
}

/// What the model sent back, before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub tool_calls: Vec<ToolInvocation>,
    pub text: Vec<String>,
}

/// Arguments of the event_search tool
///
/// `query` and `lobby_type` are older names for `term`; `term` wins when several are sent.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ToolArguments {
    #[serde(default)]
    pub field: Option<SearchField>,
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lobby_type: Option<String>,
}

impl ToolArguments {
    /// The search term under whichever name the model used
    pub fn search_term(&self) -> Option<&str> {
        self.term
            .as_deref()
            .or(self.query.as_deref())
            .or(self.lobby_type.as_deref())
    }
}

/// A model reply checked against the tool contract
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    ToolCall(SearchQuery),
    NoCall,
    MalformedCall(String),
}
