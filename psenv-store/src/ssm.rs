//! AWS Systems Manager Parameter Store backend.
//!
//! The sync engine runs on plain OS threads, so every call here spins up a
//! current-thread tokio runtime, builds a fresh SDK client inside it and drives
//! one request (or one request loop) under [`SsmConfig::timeout`]. Nothing is
//! shared between calls; connection pools never outlive the runtime that
//! opened them.

use std::future::Future;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_sdk_ssm::config::Region;
use aws_sdk_ssm::error::{DisplayErrorContext, SdkError};
use aws_sdk_ssm::types::ParameterType;
use aws_sdk_ssm::Client;

use crate::client::{
    Page, PageRequest, ParameterStore, QualifiedParams, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT,
};
use crate::error::StoreError;

/// `DeleteParameters` accepts at most this many names per request.
const DELETE_BATCH_LIMIT: usize = 10;

/// Connection settings for [`SsmStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsmConfig {
    /// Bound on each call (a whole `put` batch counts as one call).
    pub timeout: Duration,
    pub page_size: usize,
    /// Overrides the region resolved from the environment / profile.
    pub region: Option<String>,
}

impl Default for SsmConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
            region: None,
        }
    }
}

/// [`ParameterStore`] over AWS SSM. Values are written as `SecureString`.
#[derive(Debug, Clone)]
pub struct SsmStore {
    config: SsmConfig,
}

impl SsmStore {
    /// Resolve AWS configuration once to fail fast when no session can exist.
    ///
    /// Returns `RemoteUnavailable` when no region is configured. Missing
    /// credentials surface on the first request, which maps to the same error.
    pub fn connect(config: SsmConfig) -> Result<Self, StoreError> {
        let store = Self { config };
        let sdk_config = store.run("connect", "aws", async {
            Ok(store.load_sdk_config().await)
        })?;
        if sdk_config.region().is_none() {
            return Err(StoreError::unavailable(
                "no AWS region configured; set AWS_REGION or a profile region",
            ));
        }
        Ok(store)
    }

    async fn load_sdk_config(&self) -> aws_config::SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &self.config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        loader.load().await
    }

    async fn client(&self) -> Client {
        Client::new(&self.load_sdk_config().await)
    }

    /// Drive `future` to completion on a fresh runtime, bounded by the timeout.
    fn run<T, F>(&self, operation: &'static str, target: &str, future: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::unavailable(format!("failed to start I/O runtime: {e}")))?;
        let timeout = self.config.timeout;
        runtime.block_on(async move {
            match tokio::time::timeout(timeout, future).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::request(
                    operation,
                    target,
                    format!("timed out after {timeout:?}"),
                )),
            }
        })
    }
}

impl ParameterStore for SsmStore {
    fn fetch_page(&self, request: PageRequest<'_>) -> Result<Page, StoreError> {
        self.run("fetch", request.path, async {
            let output = self
                .client()
                .await
                .get_parameters_by_path()
                .path(request.path)
                .recursive(request.recursive)
                .with_decryption(request.decrypt)
                .max_results(self.config.page_size.clamp(1, 10) as i32)
                .set_next_token(request.next_token.map(str::to_owned))
                .send()
                .await
                .map_err(|e| sdk_err("fetch", request.path, e))?;

            let parameters = output
                .parameters()
                .iter()
                .filter_map(|p| Some((p.name()?.to_string(), p.value()?.to_string())))
                .collect();
            tracing::debug!(path = request.path, "fetched parameter page");
            Ok(Page {
                parameters,
                next_token: output.next_token().map(str::to_owned),
            })
        })
    }

    fn put(
        &self,
        params: &QualifiedParams,
        key_ref: Option<&str>,
        overwrite: bool,
    ) -> Result<(), StoreError> {
        let target = params.keys().next().map(String::as_str).unwrap_or("(empty batch)");
        self.run("put", target, async {
            let client = self.client().await;
            for (name, value) in params {
                let output = client
                    .put_parameter()
                    .name(name)
                    .value(value)
                    .r#type(ParameterType::SecureString)
                    .overwrite(overwrite)
                    .set_key_id(key_ref.map(str::to_owned))
                    .send()
                    .await
                    .map_err(|e| sdk_err("put", name, e))?;
                tracing::info!(parameter = %name, version = output.version(), "parameter written");
            }
            Ok(())
        })
    }

    fn delete(&self, names: &[String]) -> Result<(), StoreError> {
        let target = names.first().map(String::as_str).unwrap_or("(empty batch)");
        self.run("delete", target, async {
            let client = self.client().await;
            for chunk in names.chunks(DELETE_BATCH_LIMIT) {
                let output = client
                    .delete_parameters()
                    .set_names(Some(chunk.to_vec()))
                    .send()
                    .await
                    .map_err(|e| sdk_err("delete", target, e))?;
                for deleted in output.deleted_parameters() {
                    tracing::info!(parameter = %deleted, "parameter deleted");
                }
                for invalid in output.invalid_parameters() {
                    tracing::warn!(parameter = %invalid, "delete skipped: not found");
                }
            }
            Ok(())
        })
    }
}

/// Transport-level failures mean no session; service errors are per-request.
fn sdk_err<E, R>(operation: &'static str, target: &str, err: SdkError<E, R>) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    let reason = DisplayErrorContext(&err).to_string();
    match err {
        SdkError::ConstructionFailure(_)
        | SdkError::DispatchFailure(_)
        | SdkError::TimeoutError(_) => StoreError::unavailable(reason),
        _ => StoreError::request(operation, target, reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_client_constants() {
        let config = SsmConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.page_size, 10);
        assert!(config.region.is_none());
    }

    #[test]
    fn unresolvable_request_is_unavailable() {
        let err: SdkError<std::io::Error, ()> =
            SdkError::construction_failure("no credentials in the provider chain");
        assert!(sdk_err("get-parameters-by-path", "/p/proj/dev", err).is_unavailable());
    }
}
