pub mod group;
pub mod intent;
pub mod search;

pub use group::{Group, GroupId, PreferenceRecord};
pub use intent::{
    AggregatedSummary, ModelReply, ToolArguments, ToolInvocation, ToolInvocationRequest,
    ToolOutcome, ToolSpec,
};
pub use search::{DestinationHit, IndexHit, SearchField, SearchMode, SearchQuery};
