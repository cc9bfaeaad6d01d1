//! In-process stand-in for the CloudWatch Logs service
//!
//! Behaves like the real API where the hook depends on it: describes are
//! paginated, creates fail on duplicates, puts must present the stream's
//! current sequence token and respect the request limits. Everything it
//! receives is kept for inspection.

use super::batch::{MAX_BATCH_BYTES, MAX_BATCH_EVENTS};
use super::client::{
    CreateLogGroupRequest, LogGroupSummary, LogStreamSummary, LogsClient, Page,
    PutLogEventsRequest, PutLogEventsResponse,
};
use super::event::LogEvent;
use crate::core::{LoggerError, Result};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};

const DEFAULT_PAGE_SIZE: usize = 50;

/// Stored state of one log group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogGroupRecord {
    pub retention_days: Option<u32>,
    pub kms_key_id: Option<String>,
    pub tags: HashMap<String, String>,
}

/// One `PutLogEvents` call as the service saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutCall {
    pub group: String,
    pub stream: String,
    pub event_count: usize,
    pub size_bytes: usize,
    pub sequence_token: Option<String>,
    pub accepted: bool,
}

#[derive(Debug, Default)]
struct StreamState {
    events: Vec<LogEvent>,
    token: Option<String>,
}

#[derive(Debug, Default)]
struct GroupState {
    record: LogGroupRecord,
    streams: BTreeMap<String, StreamState>,
}

#[derive(Debug, Default)]
struct ServiceState {
    groups: BTreeMap<String, GroupState>,
    puts: Vec<PutCall>,
    injected_failures: VecDeque<LoggerError>,
    tokens_issued: u64,
    create_group_calls: usize,
    create_stream_calls: usize,
}

/// An in-memory [`LogsClient`]
///
/// # Example
///
/// ```
/// use cloudwatch_log_hook::prelude::*;
/// use std::sync::Arc;
///
/// let client = Arc::new(MemoryLogsClient::new());
/// let hook = CloudWatchHook::new(client.clone(), "app", "web-1", HookOptions::new()).unwrap();
///
/// hook.write_message(b"hello").unwrap();
/// assert_eq!(client.events("app", "web-1")[0].message, "hello");
/// ```
#[derive(Debug)]
pub struct MemoryLogsClient {
    state: Mutex<ServiceState>,
    page_size: usize,
    require_sequence_tokens: bool,
}

impl MemoryLogsClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ServiceState::default()),
            page_size: DEFAULT_PAGE_SIZE,
            require_sequence_tokens: true,
        }
    }

    /// Number of results per describe page
    #[must_use = "builder methods return a new value"]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Whether puts must present the current token (default: true)
    #[must_use = "builder methods return a new value"]
    pub fn with_sequence_tokens(mut self, required: bool) -> Self {
        self.require_sequence_tokens = required;
        self
    }

    /// Seed a group as if it had been created earlier
    pub fn insert_log_group(&self, group: &str) {
        self.state
            .lock()
            .groups
            .entry(group.to_string())
            .or_default();
    }

    /// Seed a stream (and its group) as if it had been created earlier
    pub fn insert_log_stream(&self, group: &str, stream: &str) {
        self.state
            .lock()
            .groups
            .entry(group.to_string())
            .or_default()
            .streams
            .entry(stream.to_string())
            .or_default();
    }

    /// Make the next put fail with `error`; calls queue up
    pub fn fail_next_put(&self, error: LoggerError) {
        self.state.lock().injected_failures.push_back(error);
    }

    pub fn log_group(&self, group: &str) -> Option<LogGroupRecord> {
        self.state
            .lock()
            .groups
            .get(group)
            .map(|g| g.record.clone())
    }

    pub fn has_log_stream(&self, group: &str, stream: &str) -> bool {
        self.state
            .lock()
            .groups
            .get(group)
            .is_some_and(|g| g.streams.contains_key(stream))
    }

    /// Events stored in a stream, in arrival order
    pub fn events(&self, group: &str, stream: &str) -> Vec<LogEvent> {
        self.state
            .lock()
            .groups
            .get(group)
            .and_then(|g| g.streams.get(stream))
            .map(|s| s.events.clone())
            .unwrap_or_default()
    }

    /// Current upload sequence token of a stream
    pub fn stream_token(&self, group: &str, stream: &str) -> Option<String> {
        self.state
            .lock()
            .groups
            .get(group)
            .and_then(|g| g.streams.get(stream))
            .and_then(|s| s.token.clone())
    }

    /// Every put received so far, failed ones included
    pub fn put_calls(&self) -> Vec<PutCall> {
        self.state.lock().puts.clone()
    }

    pub fn create_group_calls(&self) -> usize {
        self.state.lock().create_group_calls
    }

    pub fn create_stream_calls(&self) -> usize {
        self.state.lock().create_stream_calls
    }

    fn paginate<T>(&self, items: Vec<T>, next_token: Option<&str>) -> Result<Page<T>> {
        let start = match next_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| LoggerError::invalid_parameter("Describe", "malformed next token"))?,
            None => 0,
        };
        let end = (start + self.page_size).min(items.len());
        let next_token = (end < items.len()).then(|| end.to_string());
        let items = items
            .into_iter()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect();
        Ok(Page { items, next_token })
    }

    fn validate_put(request: &PutLogEventsRequest) -> Result<usize> {
        if request.events.is_empty() {
            return Err(LoggerError::invalid_parameter(
                "PutLogEvents",
                "at least one event is required",
            ));
        }
        if request.events.len() > MAX_BATCH_EVENTS {
            return Err(LoggerError::invalid_parameter(
                "PutLogEvents",
                format!("{} events exceeds {}", request.events.len(), MAX_BATCH_EVENTS),
            ));
        }
        let size: usize = request.events.iter().map(LogEvent::encoded_size).sum();
        if size > MAX_BATCH_BYTES {
            return Err(LoggerError::invalid_parameter(
                "PutLogEvents",
                format!("{} bytes exceeds {}", size, MAX_BATCH_BYTES),
            ));
        }
        if request
            .events
            .windows(2)
            .any(|w| w[0].timestamp > w[1].timestamp)
        {
            return Err(LoggerError::invalid_parameter(
                "PutLogEvents",
                "events are not in chronological order",
            ));
        }
        Ok(size)
    }
}

impl Default for MemoryLogsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LogsClient for MemoryLogsClient {
    fn describe_log_groups(
        &self,
        prefix: &str,
        next_token: Option<&str>,
    ) -> Result<Page<LogGroupSummary>> {
        let groups: Vec<_> = self
            .state
            .lock()
            .groups
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, group)| LogGroupSummary {
                name: name.clone(),
                retention_days: group.record.retention_days,
            })
            .collect();
        self.paginate(groups, next_token)
    }

    fn create_log_group(&self, request: &CreateLogGroupRequest) -> Result<()> {
        let mut state = self.state.lock();
        state.create_group_calls += 1;
        if state.groups.contains_key(&request.name) {
            return Err(LoggerError::already_exists(format!(
                "log group '{}'",
                request.name
            )));
        }
        state.groups.insert(
            request.name.clone(),
            GroupState {
                record: LogGroupRecord {
                    retention_days: None,
                    kms_key_id: request.kms_key_id.clone(),
                    tags: request.tags.clone(),
                },
                streams: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn put_retention_policy(&self, group: &str, retention_days: u32) -> Result<()> {
        let mut state = self.state.lock();
        let group = state
            .groups
            .get_mut(group)
            .ok_or_else(|| LoggerError::not_found(format!("log group '{}'", group)))?;
        group.record.retention_days = Some(retention_days);
        Ok(())
    }

    fn describe_log_streams(
        &self,
        group: &str,
        prefix: &str,
        next_token: Option<&str>,
    ) -> Result<Page<LogStreamSummary>> {
        let streams: Vec<_> = {
            let state = self.state.lock();
            let group_state = state
                .groups
                .get(group)
                .ok_or_else(|| LoggerError::not_found(format!("log group '{}'", group)))?;
            group_state
                .streams
                .iter()
                .filter(|(name, _)| name.starts_with(prefix))
                .map(|(name, stream)| LogStreamSummary {
                    name: name.clone(),
                    upload_sequence_token: stream.token.clone(),
                })
                .collect()
        };
        self.paginate(streams, next_token)
    }

    fn create_log_stream(&self, group: &str, stream: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.create_stream_calls += 1;
        let group_state = state
            .groups
            .get_mut(group)
            .ok_or_else(|| LoggerError::not_found(format!("log group '{}'", group)))?;
        if group_state.streams.contains_key(stream) {
            return Err(LoggerError::already_exists(format!(
                "log stream '{}'",
                stream
            )));
        }
        group_state
            .streams
            .insert(stream.to_string(), StreamState::default());
        Ok(())
    }

    fn put_log_events(&self, request: PutLogEventsRequest) -> Result<PutLogEventsResponse> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let mut call = PutCall {
            group: request.group.clone(),
            stream: request.stream.clone(),
            event_count: request.events.len(),
            size_bytes: request.events.iter().map(LogEvent::encoded_size).sum(),
            sequence_token: request.sequence_token.clone(),
            accepted: false,
        };

        let outcome = (|| {
            if let Some(error) = state.injected_failures.pop_front() {
                return Err(error);
            }
            Self::validate_put(&request)?;

            let stream = state
                .groups
                .get_mut(&request.group)
                .ok_or_else(|| LoggerError::not_found(format!("log group '{}'", request.group)))?
                .streams
                .get_mut(&request.stream)
                .ok_or_else(|| {
                    LoggerError::not_found(format!("log stream '{}'", request.stream))
                })?;

            if self.require_sequence_tokens && request.sequence_token != stream.token {
                return Err(LoggerError::InvalidSequenceToken {
                    expected: stream.token.clone(),
                });
            }

            state.tokens_issued += 1;
            let next = format!("{:056}", state.tokens_issued);
            stream.token = Some(next.clone());
            stream.events.extend(request.events);
            Ok(PutLogEventsResponse {
                next_sequence_token: Some(next),
            })
        })();

        call.accepted = outcome.is_ok();
        state.puts.push(call);
        outcome
    }
}
