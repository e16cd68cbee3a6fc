//! Gateway client.
//!
//! Builds requests from the active [`PluginConfig`] and sends them through a
//! [`Transport`]. `try_*` methods surface every failure; the soft read
//! methods log and resolve to empty values so a broken endpoint never takes
//! a picker down.

use std::sync::Arc;
use std::time::Duration;

use gridext_config::{DropdownSourceConfig, PluginConfig, TemplateApiConfig};
use gridext_core::{TemplateData, TemplateDraft};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::{envelope_items, unwrap_object};
use crate::templates::{map_template, template_body};
use crate::transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
use crate::GatewayError;

pub const SOURCES_PATH: &str = "/dropdown/sources";
pub const HEALTH_PATH: &str = "/health";

/// Source advertised by the server's discovery endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub count: Option<u64>,
}

/// Server-side template list filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateFilter {
    pub category: Option<String>,
    pub query: Option<String>,
}

impl TemplateFilter {
    fn is_empty(&self) -> bool {
        self.category.is_none() && self.query.is_none()
    }
}

/// Remote data gateway (blocking).
#[derive(Clone)]
pub struct RemoteGateway {
    config: Arc<PluginConfig>,
    transport: Arc<dyn Transport>,
}

impl RemoteGateway {
    /// Gateway over the default reqwest transport.
    pub fn new(config: Arc<PluginConfig>) -> Result<Self, GatewayError> {
        let timeout = Duration::from_secs(config.request_timeout_secs.max(1));
        let transport = ReqwestTransport::new(timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Gateway over a caller-supplied transport.
    pub fn with_transport(config: Arc<PluginConfig>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// `{api_base_url}{endpoint}`; absolute endpoints are used as-is.
    pub fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}{}", self.config.api_base_url, endpoint)
        }
    }

    // ── Dropdown sources ────────────────────────────────────────────

    fn source(&self, source_id: &str) -> Result<&DropdownSourceConfig, GatewayError> {
        if self.config.dropdown_sources.is_empty() {
            return Err(GatewayError::NotConfigured("no dropdown sources configured".into()));
        }
        self.config
            .dropdown_source(source_id)
            .ok_or_else(|| GatewayError::UnknownSource(source_id.to_string()))
    }

    /// Fetch the items of one configured source.
    pub fn try_fetch_dropdown(&self, source_id: &str) -> Result<Vec<Value>, GatewayError> {
        let source = self.source(source_id)?;
        let mut request = HttpRequest::new(source.method.into(), self.url_for(&source.endpoint));
        for (name, value) in &source.headers {
            request = request.header(name, value);
        }
        if request.method == Method::Post {
            request = request.json(Value::Object(Default::default()));
        }

        let body = self.send(&request)?.json()?;
        log::debug!("dropdown '{}' answered {}", source_id, request.url);
        items_or_shape_error(&body, &request.url)
    }

    /// Soft variant of [`try_fetch_dropdown`](Self::try_fetch_dropdown).
    pub fn fetch_dropdown(&self, source_id: &str) -> Vec<Value> {
        soft(self.try_fetch_dropdown(source_id), "fetch dropdown", source_id)
    }

    /// Server-side search within a source (`{endpoint}/search`).
    pub fn try_search_dropdown(
        &self,
        source_id: &str,
        query: &str,
        field: Option<&str>,
    ) -> Result<Vec<Value>, GatewayError> {
        let source = self.source(source_id)?;
        let url = format!("{}/search", self.url_for(&source.endpoint).trim_end_matches('/'));
        let mut request = HttpRequest::new(Method::Get, url).query("q", query);
        if let Some(field) = field {
            request = request.query("field", field);
        }
        for (name, value) in &source.headers {
            request = request.header(name, value);
        }

        let body = self.send(&request)?.json()?;
        items_or_shape_error(&body, &request.url)
    }

    pub fn search_dropdown(&self, source_id: &str, query: &str, field: Option<&str>) -> Vec<Value> {
        soft(self.try_search_dropdown(source_id, query, field), "search dropdown", source_id)
    }

    /// Sources advertised by the server, independent of local config.
    pub fn try_discover_sources(&self) -> Result<Vec<SourceSummary>, GatewayError> {
        let request = HttpRequest::new(Method::Get, self.url_for(SOURCES_PATH));
        let body = self.send(&request)?.json()?;

        let list = match body.get("sources") {
            Some(Value::Array(items)) => items.clone(),
            _ => items_or_shape_error(&body, &request.url)?,
        };
        Ok(list
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect())
    }

    pub fn try_health(&self) -> Result<Value, GatewayError> {
        let request = HttpRequest::new(Method::Get, self.url_for(HEALTH_PATH));
        self.send(&request)?.json()
    }

    // ── Templates ───────────────────────────────────────────────────

    fn template_api(&self) -> Result<&TemplateApiConfig, GatewayError> {
        self.config
            .template_api
            .as_ref()
            .ok_or_else(|| GatewayError::NotConfigured("template API endpoints not configured".into()))
    }

    pub fn try_list_templates(&self, filter: &TemplateFilter) -> Result<Vec<TemplateData>, GatewayError> {
        let api = self.template_api()?;
        let mut request = HttpRequest::new(Method::Get, self.url_for(&api.list_endpoint));
        if !filter.is_empty() {
            if let Some(category) = &filter.category {
                request = request.query("category", category);
            }
            if let Some(q) = &filter.query {
                request = request.query("q", q);
            }
        }

        let body = self.send(&request)?.json()?;
        let items = items_or_shape_error(&body, &request.url)?;
        Ok(items
            .iter()
            .filter_map(|item| map_template(item, &api.field_mapping))
            .collect())
    }

    pub fn list_templates(&self, filter: &TemplateFilter) -> Vec<TemplateData> {
        soft(self.try_list_templates(filter), "list templates", "")
    }

    pub fn try_get_template(&self, id: &str) -> Result<TemplateData, GatewayError> {
        let api = self.template_api()?;
        let url = self.url_for(&TemplateApiConfig::with_id(&api.get_endpoint, id));
        let request = HttpRequest::new(Method::Get, url);

        let body = self.send(&request)?.json()?;
        single_template(&body, api, &request.url)
    }

    /// Soft variant; `None` on any failure.
    pub fn get_template(&self, id: &str) -> Option<TemplateData> {
        match self.try_get_template(id) {
            Ok(t) => Some(t),
            Err(e) => {
                log::warn!("get template '{}' failed: {}", id, e);
                None
            }
        }
    }

    pub fn try_save_template(&self, draft: &TemplateDraft) -> Result<TemplateData, GatewayError> {
        let api = self.template_api()?;
        let endpoint = api
            .save_endpoint
            .as_deref()
            .ok_or_else(|| GatewayError::NotConfigured("templateApi.saveEndpoint not configured".into()))?;
        let request = HttpRequest::new(Method::Post, self.url_for(endpoint))
            .json(template_body(draft, &api.field_mapping));

        let body = self.send(&request)?.json()?;
        single_template(&body, api, &request.url)
    }

    pub fn try_update_template(&self, id: &str, draft: &TemplateDraft) -> Result<TemplateData, GatewayError> {
        let api = self.template_api()?;
        let endpoint = api
            .update_endpoint
            .as_deref()
            .ok_or_else(|| GatewayError::NotConfigured("templateApi.updateEndpoint not configured".into()))?;
        let url = self.url_for(&TemplateApiConfig::with_id(endpoint, id));
        let request = HttpRequest::new(Method::Put, url).json(template_body(draft, &api.field_mapping));

        let body = self.send(&request)?.json()?;
        single_template(&body, api, &request.url)
    }

    pub fn try_delete_template(&self, id: &str) -> Result<(), GatewayError> {
        let api = self.template_api()?;
        let endpoint = api
            .delete_endpoint
            .as_deref()
            .ok_or_else(|| GatewayError::NotConfigured("templateApi.deleteEndpoint not configured".into()))?;
        let url = self.url_for(&TemplateApiConfig::with_id(endpoint, id));
        self.send(&HttpRequest::new(Method::Delete, url))?;
        Ok(())
    }

    // ── Private helpers ─────────────────────────────────────────────

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, GatewayError> {
        let response = self.transport.send(request)?;
        if !response.is_success() {
            return Err(GatewayError::Http(response.status, response.body));
        }
        Ok(response)
    }
}

fn items_or_shape_error(body: &Value, url: &str) -> Result<Vec<Value>, GatewayError> {
    envelope_items(body)
        .cloned()
        .ok_or_else(|| GatewayError::UnexpectedShape(url.to_string()))
}

fn single_template(body: &Value, api: &TemplateApiConfig, url: &str) -> Result<TemplateData, GatewayError> {
    unwrap_object(body, &api.field_mapping.id)
        .and_then(|item| map_template(item, &api.field_mapping))
        .ok_or_else(|| GatewayError::UnexpectedShape(url.to_string()))
}

// Unexpected shapes are an empty list, not a failure worth a warning.
fn soft<T: Default>(result: Result<T, GatewayError>, what: &str, subject: &str) -> T {
    match result {
        Ok(value) => value,
        Err(GatewayError::UnexpectedShape(url)) => {
            log::debug!("{} '{}': unrecognized response shape from {}", what, subject, url);
            T::default()
        }
        Err(e) => {
            log::warn!("{} '{}' failed: {}", what, subject, e);
            T::default()
        }
    }
}
