//! The slice of the CloudWatch Logs API the hook talks to
//!
//! Implementations translate these calls to a concrete transport. Service
//! conditions the uploader reacts to are reported as dedicated
//! [`LoggerError`](crate::core::LoggerError) variants:
//! `ResourceAlreadyExists`, `ResourceNotFound`, `InvalidSequenceToken` and
//! `InvalidParameter`. Anything else is `Service`.

use super::event::LogEvent;
use crate::core::Result;
use std::collections::HashMap;

/// One page of a paginated describe call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogGroupSummary {
    pub name: String,
    pub retention_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogStreamSummary {
    pub name: String,
    pub upload_sequence_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateLogGroupRequest {
    pub name: String,
    pub kms_key_id: Option<String>,
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutLogEventsRequest {
    pub group: String,
    pub stream: String,
    pub events: Vec<LogEvent>,
    pub sequence_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutLogEventsResponse {
    pub next_sequence_token: Option<String>,
}

/// Transport for the log-ingestion API
pub trait LogsClient: Send + Sync {
    /// List groups whose name starts with `prefix`
    fn describe_log_groups(
        &self,
        prefix: &str,
        next_token: Option<&str>,
    ) -> Result<Page<LogGroupSummary>>;

    fn create_log_group(&self, request: &CreateLogGroupRequest) -> Result<()>;

    fn put_retention_policy(&self, group: &str, retention_days: u32) -> Result<()>;

    /// List streams in `group` whose name starts with `prefix`
    fn describe_log_streams(
        &self,
        group: &str,
        prefix: &str,
        next_token: Option<&str>,
    ) -> Result<Page<LogStreamSummary>>;

    fn create_log_stream(&self, group: &str, stream: &str) -> Result<()>;

    fn put_log_events(&self, request: PutLogEventsRequest) -> Result<PutLogEventsResponse>;
}
