//! Gateway state: provider table construction and request execution

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use prism_config::Config;
use prism_core::{CallOverrides, RequestContext};
use prism_oauth::TokenStore;
use serde_json::Value;
use strum::IntoEnumIterator;

use crate::dispatch;
use crate::emulation;
use crate::error::LlmError;
use crate::provider::{ProviderConfig, ProviderKind, build_provider};
use crate::types::{ResponseStreamEvent, ResponsesRequest, ResponsesResult};

/// Ordered stream of canonical events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<ResponseStreamEvent, LlmError>> + Send>>;

/// Shared state for request execution
///
/// One provider config per family, built once at startup; each inbound
/// request borrows a config, so configs themselves stay stateless.
#[derive(Clone)]
pub struct GatewayState {
    inner: Arc<GatewayStateInner>,
}

struct GatewayStateInner {
    providers: HashMap<ProviderKind, Arc<dyn ProviderConfig>>,
    drop_params: HashMap<ProviderKind, bool>,
    deployments: Vec<String>,
    http: reqwest::Client,
}

impl GatewayState {
    /// Build the provider table from configuration
    ///
    /// Every provider family gets a config object; deployments declared
    /// in the config contribute keys, endpoints, and per-provider flags,
    /// and families without a deployment run on environment variables.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let store = TokenStore::new(config.oauth.token_dir.clone());

        let mut providers = HashMap::new();
        let mut drop_params = HashMap::new();
        let mut deployments = Vec::new();

        for kind in ProviderKind::iter() {
            let entry = config
                .providers
                .values()
                .find(|entry| entry.provider_type.parse::<ProviderKind>() == Ok(kind));

            providers.insert(kind, build_provider(kind, entry, &store));
            drop_params.insert(kind, entry.and_then(|e| e.drop_params).unwrap_or(config.drop_params));
        }

        for (name, entry) in &config.providers {
            if entry.provider_type.parse::<ProviderKind>().is_err() {
                tracing::warn!(deployment = %name, provider_type = %entry.provider_type, "ignoring deployment with unknown provider type");
                continue;
            }
            deployments.push(name.clone());
        }

        Self {
            inner: Arc::new(GatewayStateInner {
                providers,
                drop_params,
                deployments,
                http: reqwest::Client::new(),
            }),
        }
    }

    /// Names of configured deployments, for model listings
    #[must_use]
    pub fn deployments(&self) -> &[String] {
        &self.inner.deployments
    }

    /// Resolve the provider config and effective drop flag for a model
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ProviderNotFound`] for an unknown prefix.
    fn resolve<'a>(&self, model: &'a str) -> Result<(&'a str, Arc<dyn ProviderConfig>, bool), LlmError> {
        let (kind, model) = ProviderKind::split_model(model)?;

        let config = self
            .inner
            .providers
            .get(&kind)
            .cloned()
            .ok_or_else(|| LlmError::ProviderNotFound {
                provider: kind.slug().to_owned(),
            })?;

        let drop = self.inner.drop_params.get(&kind).copied().unwrap_or(false);
        Ok((model, config, drop))
    }

    /// Execute a blocking request
    ///
    /// # Errors
    ///
    /// Propagates transformation, authentication, and upstream errors.
    pub async fn complete(
        &self,
        request: ResponsesRequest,
        context: &RequestContext,
        overrides: &CallOverrides,
    ) -> Result<ResponsesResult, LlmError> {
        let (model, config, drop_params) = self.resolve(&request.model)?;

        let call = dispatch::prepare(
            config.as_ref(),
            model,
            &request.input,
            request.params,
            context,
            overrides,
            drop_params,
        )
        .await?;

        let (status, body) = dispatch::send_blocking(&self.inner.http, &call, overrides).await?;
        config.transform_response(status, &body)
    }

    /// Execute a streaming request
    ///
    /// Falls back to emulation when the provider/model pair cannot
    /// stream natively. Events are forwarded in upstream order; dropping
    /// the returned stream abandons the outbound call.
    ///
    /// # Errors
    ///
    /// Propagates transformation, authentication, and upstream errors
    /// raised before the stream is established.
    pub async fn complete_stream(
        &self,
        request: ResponsesRequest,
        context: &RequestContext,
        overrides: &CallOverrides,
    ) -> Result<EventStream, LlmError> {
        let (model, config, drop_params) = self.resolve(&request.model)?;

        if config.should_fake_stream(model, true) {
            tracing::debug!(provider = config.kind().slug(), model, "emulating stream from blocking call");

            let blocking = ResponsesRequest {
                stream: false,
                ..request
            };
            let result = self.complete(blocking, context, overrides).await?;
            let events: Vec<Result<ResponseStreamEvent, LlmError>> =
                emulation::fake_stream_events(&result).into_iter().map(Ok).collect();
            return Ok(Box::pin(futures_util::stream::iter(events)));
        }

        let mut call = dispatch::prepare(
            config.as_ref(),
            model,
            &request.input,
            request.params,
            context,
            overrides,
            drop_params,
        )
        .await?;

        if let Some(map) = call.body.as_object_mut() {
            map.insert("stream".to_owned(), Value::Bool(true));
        }

        let response = dispatch::send_streaming(&self.inner.http, &call, overrides).await?;

        let events = response
            .bytes_stream()
            .eventsource()
            .filter_map(move |frame| {
                let config = Arc::clone(&config);
                async move {
                    match frame {
                        Ok(event) => {
                            let data = event.data.trim().to_owned();
                            if data.is_empty() || data == "[DONE]" {
                                return None;
                            }

                            match serde_json::from_str::<Value>(&data) {
                                Ok(chunk) => Some(config.transform_stream_chunk(chunk)),
                                Err(e) => {
                                    tracing::debug!(error = %e, data = %data, "skipping unparseable SSE chunk");
                                    None
                                }
                            }
                        }
                        Err(e) => Some(Err(LlmError::Streaming(e.to_string()))),
                    }
                }
            });

        Ok(Box::pin(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_from_toml(raw: &str) -> GatewayState {
        let config: Config = toml::from_str(raw).unwrap();
        GatewayState::from_config(&config)
    }

    #[test]
    fn every_provider_family_is_constructed() {
        let state = state_from_toml("");
        for kind in ProviderKind::iter() {
            assert!(state.inner.providers.contains_key(&kind), "missing {kind}");
        }
    }

    #[test]
    fn per_provider_drop_params_overrides_global() {
        let state = state_from_toml(
            r#"
            drop_params = true

            [providers.grok]
            type = "xai"
            drop_params = false
            "#,
        );

        assert!(!state.inner.drop_params[&ProviderKind::Xai]);
        assert!(state.inner.drop_params[&ProviderKind::Openai]);
    }

    #[test]
    fn unknown_deployment_types_are_skipped() {
        let state = state_from_toml(
            r#"
            [providers.mystery]
            type = "acme"
            "#,
        );

        assert!(state.deployments().is_empty());
    }

    #[tokio::test]
    async fn unknown_model_prefix_fails_fast() {
        let state = state_from_toml("");
        let request: ResponsesRequest = serde_json::from_value(serde_json::json!({
            "model": "acme/foo",
            "input": "hi"
        }))
        .unwrap();

        let err = state
            .complete(request, &RequestContext::empty(), &CallOverrides::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ProviderNotFound { .. }));
    }
}
