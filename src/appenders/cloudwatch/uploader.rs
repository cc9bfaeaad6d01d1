//! Group/stream provisioning and ordered uploads to one stream

use super::client::{CreateLogGroupRequest, LogStreamSummary, LogsClient, PutLogEventsRequest};
use super::event::LogEvent;
use crate::core::{LoggerError, Result, UploadMetrics};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Settings applied only when the group has to be created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSettings {
    pub retention_days: Option<u32>,
    pub kms_key_id: Option<String>,
    pub tags: HashMap<String, String>,
}

/// Uploads events to a single group/stream pair
///
/// Every put holds the token mutex for the full request, so uploads from
/// the write path and the batch worker are strictly ordered and each one
/// presents the token returned by the previous one.
pub struct Uploader {
    client: Arc<dyn LogsClient>,
    group: String,
    stream: String,
    sequence_token: Mutex<Option<String>>,
    metrics: Arc<UploadMetrics>,
}

impl Uploader {
    pub fn new(
        client: Arc<dyn LogsClient>,
        group: impl Into<String>,
        stream: impl Into<String>,
        metrics: Arc<UploadMetrics>,
    ) -> Self {
        Self {
            client,
            group: group.into(),
            stream: stream.into(),
            sequence_token: Mutex::new(None),
            metrics,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    /// Token the next upload will present
    pub fn sequence_token(&self) -> Option<String> {
        self.sequence_token.lock().clone()
    }

    /// Create the log group unless it already exists
    pub fn ensure_log_group(&self, settings: &GroupSettings) -> Result<()> {
        if self.log_group_exists()? {
            return Ok(());
        }

        let request = CreateLogGroupRequest {
            name: self.group.clone(),
            kms_key_id: settings.kms_key_id.clone(),
            tags: settings.tags.clone(),
        };
        match self.client.create_log_group(&request) {
            Ok(()) => {}
            // Another writer created it between describe and create
            Err(e) if e.is_already_exists() => return Ok(()),
            Err(e) => return Err(e),
        }

        if let Some(days) = settings.retention_days {
            self.client.put_retention_policy(&self.group, days)?;
        }
        Ok(())
    }

    /// Create the log stream unless it already exists, then load its token
    pub fn ensure_log_stream(&self) -> Result<()> {
        if self.find_log_stream()?.is_some() {
            return Ok(());
        }

        match self.client.create_log_stream(&self.group, &self.stream) {
            Ok(()) => {}
            Err(e) if e.is_already_exists() => {}
            Err(e) => return Err(e),
        }

        // Refresh the upload sequence token for the new stream
        self.find_log_stream()?;
        Ok(())
    }

    fn log_group_exists(&self) -> Result<bool> {
        let mut next_token: Option<String> = None;
        loop {
            let page = self
                .client
                .describe_log_groups(&self.group, next_token.as_deref())?;

            if page.items.iter().any(|g| g.name == self.group) {
                return Ok(true);
            }

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => return Ok(false),
            }
        }
    }

    /// Find the stream and adopt its upload sequence token
    fn find_log_stream(&self) -> Result<Option<LogStreamSummary>> {
        let mut next_token: Option<String> = None;
        loop {
            let page = self.client.describe_log_streams(
                &self.group,
                &self.stream,
                next_token.as_deref(),
            )?;

            if let Some(stream) = page.items.into_iter().find(|s| s.name == self.stream) {
                *self.sequence_token.lock() = stream.upload_sequence_token.clone();
                return Ok(Some(stream));
            }

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => return Ok(None),
            }
        }
    }

    /// Upload events in one request, threading the sequence token
    ///
    /// Failed uploads are not retried. When the service rejects the token
    /// and names the one it expected, that token is kept for the next call.
    pub fn put_log_events(&self, mut events: Vec<LogEvent>) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        // The service requires chronological order; concurrent writers can
        // enqueue a few milliseconds out of order.
        events.sort_by_key(|e| e.timestamp);

        let mut token = self.sequence_token.lock();
        let count = events.len();
        let request = PutLogEventsRequest {
            group: self.group.clone(),
            stream: self.stream.clone(),
            events,
            sequence_token: token.clone(),
        };

        match self.client.put_log_events(request) {
            Ok(response) => {
                *token = response.next_sequence_token;
                self.metrics.record_upload(count);
                Ok(())
            }
            Err(e) => {
                if let LoggerError::InvalidSequenceToken {
                    expected: Some(ref expected),
                } = e
                {
                    *token = Some(expected.clone());
                }
                self.metrics.record_failure(count);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::cloudwatch::memory::MemoryLogsClient;

    fn uploader(client: &Arc<MemoryLogsClient>) -> Uploader {
        Uploader::new(
            Arc::clone(client) as Arc<dyn LogsClient>,
            "app",
            "web-1",
            Arc::new(UploadMetrics::new()),
        )
    }

    #[test]
    fn test_creates_group_with_settings() {
        let client = Arc::new(MemoryLogsClient::new());
        let uploader = uploader(&client);

        let settings = GroupSettings {
            retention_days: Some(14),
            kms_key_id: Some("key-1".to_string()),
            tags: HashMap::from([("team".to_string(), "core".to_string())]),
        };
        uploader.ensure_log_group(&settings).unwrap();

        let group = client.log_group("app").expect("group created");
        assert_eq!(group.retention_days, Some(14));
        assert_eq!(group.kms_key_id.as_deref(), Some("key-1"));
        assert_eq!(group.tags.get("team").map(String::as_str), Some("core"));
    }

    #[test]
    fn test_existing_group_is_left_alone() {
        let client = Arc::new(MemoryLogsClient::new());
        client.insert_log_group("app");
        let uploader = uploader(&client);

        let settings = GroupSettings {
            retention_days: Some(30),
            ..GroupSettings::default()
        };
        uploader.ensure_log_group(&settings).unwrap();

        assert_eq!(client.log_group("app").unwrap().retention_days, None);
    }

    #[test]
    fn test_group_found_on_later_page() {
        let client = Arc::new(MemoryLogsClient::new().with_page_size(2));
        for name in ["app-a", "app-b", "app-c", "app"] {
            client.insert_log_group(name);
        }
        let uploader = uploader(&client);

        uploader.ensure_log_group(&GroupSettings::default()).unwrap();
        assert_eq!(client.create_group_calls(), 0);
    }

    #[test]
    fn test_existing_stream_token_is_adopted() {
        let client = Arc::new(MemoryLogsClient::new());
        client.insert_log_group("app");
        client.insert_log_stream("app", "web-1");
        client
            .put_log_events(PutLogEventsRequest {
                group: "app".to_string(),
                stream: "web-1".to_string(),
                events: vec![LogEvent::new(1, "earlier")],
                sequence_token: None,
            })
            .unwrap();

        let uploader = uploader(&client);
        uploader.ensure_log_stream().unwrap();

        assert_eq!(uploader.sequence_token(), client.stream_token("app", "web-1"));
        assert!(uploader.sequence_token().is_some());
    }

    #[test]
    fn test_put_threads_token() {
        let client = Arc::new(MemoryLogsClient::new());
        let uploader = uploader(&client);
        uploader.ensure_log_group(&GroupSettings::default()).unwrap();
        uploader.ensure_log_stream().unwrap();

        uploader.put_log_events(vec![LogEvent::new(1, "one")]).unwrap();
        let first = uploader.sequence_token();
        uploader.put_log_events(vec![LogEvent::new(2, "two")]).unwrap();

        let puts = client.put_calls();
        assert_eq!(puts.len(), 2);
        assert_eq!(puts[0].sequence_token, None);
        assert_eq!(puts[1].sequence_token, first);
        assert_ne!(uploader.sequence_token(), first);
    }

    #[test]
    fn test_rejected_token_is_replaced_for_next_call() {
        let client = Arc::new(MemoryLogsClient::new());
        let uploader = uploader(&client);
        uploader.ensure_log_group(&GroupSettings::default()).unwrap();
        uploader.ensure_log_stream().unwrap();
        uploader.put_log_events(vec![LogEvent::new(1, "one")]).unwrap();

        // Someone else writes to the stream behind our back
        client
            .put_log_events(PutLogEventsRequest {
                group: "app".to_string(),
                stream: "web-1".to_string(),
                events: vec![LogEvent::new(2, "foreign")],
                sequence_token: uploader.sequence_token(),
            })
            .unwrap();

        let err = uploader
            .put_log_events(vec![LogEvent::new(3, "lost")])
            .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidSequenceToken { .. }));

        uploader.put_log_events(vec![LogEvent::new(4, "kept")]).unwrap();
        let messages: Vec<_> = client
            .events("app", "web-1")
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(messages, vec!["one", "foreign", "kept"]);
    }

    #[test]
    fn test_empty_put_is_skipped() {
        let client = Arc::new(MemoryLogsClient::new());
        let uploader = uploader(&client);
        uploader.put_log_events(Vec::new()).unwrap();
        assert!(client.put_calls().is_empty());
    }
}
