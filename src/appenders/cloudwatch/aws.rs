//! [`LogsClient`] backed by the AWS SDK
//!
//! The SDK is async; each call is driven to completion on a private
//! current-thread tokio runtime, so the client must not be used from
//! inside another tokio runtime.

use super::client::{
    CreateLogGroupRequest, LogGroupSummary, LogStreamSummary, LogsClient, Page,
    PutLogEventsRequest, PutLogEventsResponse,
};
use crate::core::{LoggerError, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_cloudwatchlogs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cloudwatchlogs::operation::create_log_group::CreateLogGroupError;
use aws_sdk_cloudwatchlogs::operation::create_log_stream::CreateLogStreamError;
use aws_sdk_cloudwatchlogs::operation::put_log_events::PutLogEventsError;
use aws_sdk_cloudwatchlogs::types::InputLogEvent;
use aws_sdk_cloudwatchlogs::Client;
use std::fmt;
use std::future::Future;
use tokio::runtime::{Builder, Runtime};

pub struct AwsLogsClient {
    client: Client,
    runtime: Runtime,
}

impl AwsLogsClient {
    /// Load credentials and region from the default provider chain
    ///
    /// `region` overrides the region found in the environment.
    pub fn new(region: Option<String>) -> Result<Self> {
        let runtime = build_runtime()?;
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let config = runtime.block_on(loader.load());
        Ok(Self {
            client: Client::new(&config),
            runtime,
        })
    }

    pub fn from_sdk_config(config: &SdkConfig) -> Result<Self> {
        Ok(Self {
            client: Client::new(config),
            runtime: build_runtime()?,
        })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

impl fmt::Debug for AwsLogsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsLogsClient")
            .field("region", &self.client.config().region())
            .finish()
    }
}

fn build_runtime() -> Result<Runtime> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}

/// Map an SDK failure that has no condition the uploader reacts to
fn service_error<E, R>(operation: &str, err: SdkError<E, R>) -> LoggerError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug,
{
    match err.as_service_error().and_then(|e| e.code()) {
        Some("ResourceNotFoundException") => {
            LoggerError::not_found(format!("{}: {}", operation, DisplayErrorContext(&err)))
        }
        Some("InvalidParameterException") => {
            LoggerError::invalid_parameter(operation, DisplayErrorContext(&err).to_string())
        }
        _ => LoggerError::service(operation, DisplayErrorContext(&err).to_string()),
    }
}

fn to_retention(days: u32) -> Result<i32> {
    i32::try_from(days).map_err(|_| {
        LoggerError::invalid_parameter("PutRetentionPolicy", format!("{} days is out of range", days))
    })
}

impl LogsClient for AwsLogsClient {
    fn describe_log_groups(
        &self,
        prefix: &str,
        next_token: Option<&str>,
    ) -> Result<Page<LogGroupSummary>> {
        let output = self
            .block_on(
                self.client
                    .describe_log_groups()
                    .log_group_name_prefix(prefix)
                    .set_next_token(next_token.map(str::to_string))
                    .send(),
            )
            .map_err(|e| service_error("DescribeLogGroups", e))?;

        let items = output
            .log_groups()
            .iter()
            .filter_map(|group| {
                Some(LogGroupSummary {
                    name: group.log_group_name()?.to_string(),
                    retention_days: group
                        .retention_in_days()
                        .and_then(|days| u32::try_from(days).ok()),
                })
            })
            .collect();

        Ok(Page {
            items,
            next_token: output.next_token().map(str::to_string),
        })
    }

    fn create_log_group(&self, request: &CreateLogGroupRequest) -> Result<()> {
        let tags = (!request.tags.is_empty()).then(|| request.tags.clone());
        let result = self.block_on(
            self.client
                .create_log_group()
                .log_group_name(&request.name)
                .set_kms_key_id(request.kms_key_id.clone())
                .set_tags(tags)
                .send(),
        );

        match result {
            Ok(_) => Ok(()),
            Err(err) => match err.as_service_error() {
                Some(CreateLogGroupError::ResourceAlreadyExistsException(_)) => Err(
                    LoggerError::already_exists(format!("log group '{}'", request.name)),
                ),
                _ => Err(service_error("CreateLogGroup", err)),
            },
        }
    }

    fn put_retention_policy(&self, group: &str, retention_days: u32) -> Result<()> {
        let days = to_retention(retention_days)?;
        self.block_on(
            self.client
                .put_retention_policy()
                .log_group_name(group)
                .retention_in_days(days)
                .send(),
        )
        .map_err(|e| service_error("PutRetentionPolicy", e))?;
        Ok(())
    }

    #[allow(deprecated)]
    fn describe_log_streams(
        &self,
        group: &str,
        prefix: &str,
        next_token: Option<&str>,
    ) -> Result<Page<LogStreamSummary>> {
        let output = self
            .block_on(
                self.client
                    .describe_log_streams()
                    .log_group_name(group)
                    .log_stream_name_prefix(prefix)
                    .set_next_token(next_token.map(str::to_string))
                    .send(),
            )
            .map_err(|e| service_error("DescribeLogStreams", e))?;

        let items = output
            .log_streams()
            .iter()
            .filter_map(|stream| {
                Some(LogStreamSummary {
                    name: stream.log_stream_name()?.to_string(),
                    upload_sequence_token: stream.upload_sequence_token().map(str::to_string),
                })
            })
            .collect();

        Ok(Page {
            items,
            next_token: output.next_token().map(str::to_string),
        })
    }

    fn create_log_stream(&self, group: &str, stream: &str) -> Result<()> {
        let result = self.block_on(
            self.client
                .create_log_stream()
                .log_group_name(group)
                .log_stream_name(stream)
                .send(),
        );

        match result {
            Ok(_) => Ok(()),
            Err(err) => match err.as_service_error() {
                Some(CreateLogStreamError::ResourceAlreadyExistsException(_)) => Err(
                    LoggerError::already_exists(format!("log stream '{}'", stream)),
                ),
                _ => Err(service_error("CreateLogStream", err)),
            },
        }
    }

    #[allow(deprecated)]
    fn put_log_events(&self, request: PutLogEventsRequest) -> Result<PutLogEventsResponse> {
        let events = request
            .events
            .into_iter()
            .map(|event| {
                InputLogEvent::builder()
                    .timestamp(event.timestamp)
                    .message(event.message)
                    .build()
                    .map_err(|e| LoggerError::invalid_parameter("PutLogEvents", e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let result = self.block_on(
            self.client
                .put_log_events()
                .log_group_name(&request.group)
                .log_stream_name(&request.stream)
                .set_log_events(Some(events))
                .set_sequence_token(request.sequence_token)
                .send(),
        );

        match result {
            Ok(output) => {
                if let Some(rejected) = output.rejected_log_events_info() {
                    eprintln!(
                        "[LOGGER WARNING] CloudWatch rejected part of a batch for {}/{}: {:?}",
                        request.group, request.stream, rejected
                    );
                }
                Ok(PutLogEventsResponse {
                    next_sequence_token: output.next_sequence_token().map(str::to_string),
                })
            }
            Err(err) => match err.as_service_error() {
                Some(PutLogEventsError::InvalidSequenceTokenException(e)) => {
                    Err(LoggerError::InvalidSequenceToken {
                        expected: e.expected_sequence_token().map(str::to_string),
                    })
                }
                Some(PutLogEventsError::DataAlreadyAcceptedException(e)) => {
                    Err(LoggerError::InvalidSequenceToken {
                        expected: e.expected_sequence_token().map(str::to_string),
                    })
                }
                _ => Err(service_error("PutLogEvents", err)),
            },
        }
    }
}
