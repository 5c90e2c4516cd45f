// crates/gateflag-adapters-net/src/http.rs
// ============================================================================
// Module: HTTP Adapter
// Description: Adapter backed by a remote Gateflag-compatible HTTP engine.
// Purpose: Let application processes share one engine's gate values over the
//          wire instead of each holding their own storage.
// Dependencies: gateflag_core::{Adapter, AdapterError, GateKind, GateValues},
//               reqwest::blocking, url::Url
// ============================================================================

//! ## Overview
//! A blocking client adapter. Every call is a synchronous HTTP round trip
//! against `{base_url}/features/...`; there is no local caching, so every
//! `Feature::enabled` call this adapter backs costs one request.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::time::Duration;

use gateflag_core::Adapter;
use gateflag_core::AdapterError;
use gateflag_core::GateKind;
use gateflag_core::GateValue;
use gateflag_core::GateValues;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use url::Url;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised constructing an [`HttpAdapter`].
#[derive(Debug, thiserror::Error)]
pub enum HttpAdapterError {
    /// The configured base URL could not be parsed.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(url::ParseError),
    /// The underlying HTTP client failed to build.
    #[error("failed to build http client: {0}")]
    ClientBuild(reqwest::Error),
}

/// An [`Adapter`] backed by a remote Gateflag-compatible HTTP engine.
#[derive(Debug)]
pub struct HttpAdapter {
    base_url: Url,
    client: Client,
}

impl HttpAdapter {
    /// Builds an adapter targeting `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpAdapterError`] if `base_url` doesn't parse or the
    /// underlying HTTP client fails to build.
    pub fn new(base_url: &str) -> Result<Self, HttpAdapterError> {
        let base_url = Url::parse(base_url).map_err(HttpAdapterError::InvalidBaseUrl)?;
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(HttpAdapterError::ClientBuild)?;
        Ok(Self { base_url, client })
    }

    fn feature_url(&self, name: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("features").push(name);
        }
        url
    }

    fn features_url(&self) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("features");
        }
        url
    }

    fn backend_error(context: &str, err: impl std::fmt::Display) -> AdapterError {
        AdapterError::Backend(format!("{context}: {err}"))
    }
}

impl Adapter for HttpAdapter {
    fn features(&self) -> Result<BTreeSet<String>, AdapterError> {
        let response = self
            .client
            .get(self.features_url())
            .send()
            .map_err(|err| Self::backend_error("GET /features", err))?;
        response
            .json::<BTreeSet<String>>()
            .map_err(|err| Self::backend_error("decoding /features response", err))
    }

    fn add(&self, name: &str) -> Result<(), AdapterError> {
        self.client
            .put(self.feature_url(name))
            .send()
            .map_err(|err| Self::backend_error("PUT /features/{name}", err))?;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), AdapterError> {
        self.client
            .delete(self.feature_url(name))
            .send()
            .map_err(|err| Self::backend_error("DELETE /features/{name}", err))?;
        Ok(())
    }

    fn clear(&self, name: &str) -> Result<(), AdapterError> {
        let mut url = self.feature_url(name);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("clear");
        }
        self.client
            .post(url)
            .send()
            .map_err(|err| Self::backend_error("POST /features/{name}/clear", err))?;
        Ok(())
    }

    fn get(&self, name: &str) -> Result<GateValues, AdapterError> {
        let response = self
            .client
            .get(self.feature_url(name))
            .send()
            .map_err(|err| Self::backend_error("GET /features/{name}", err))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(GateValues::empty());
        }
        response
            .json::<GateValues>()
            .map_err(|err| Self::backend_error("decoding /features/{name} response", err))
    }

    fn enable(&self, name: &str, value: GateValue) -> Result<(), AdapterError> {
        let mut url = self.feature_url(name);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("enable");
        }
        self.client
            .post(url)
            .json(&value)
            .send()
            .map_err(|err| Self::backend_error("POST /features/{name}/enable", err))?;
        Ok(())
    }

    fn disable(&self, name: &str, kind: GateKind, member: Option<&str>) -> Result<(), AdapterError> {
        let mut url = self.feature_url(name);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("disable");
        }
        url.query_pairs_mut().append_pair("kind", &kind.to_string());
        if let Some(member) = member {
            url.query_pairs_mut().append_pair("member", member);
        }
        self.client
            .post(url)
            .send()
            .map_err(|err| Self::backend_error("POST /features/{name}/disable", err))?;
        Ok(())
    }

    fn get_multi(&self, names: &[&str]) -> Result<BTreeMap<String, GateValues>, AdapterError> {
        names.iter().map(|name| Ok(((*name).to_owned(), self.get(name)?))).collect()
    }
}
