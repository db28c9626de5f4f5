//! JSON HTTP adapter.
//!
//! Uses browser `fetch()` via gloo-net for WASM compatibility. The
//! response body is returned as text regardless of status; mapping
//! status codes to errors is the API client's job.

use async_trait::async_trait;
use gloo_net::http::{Request, RequestBuilder};

use vietsu_core::ports::{HttpPort, HttpRequest, HttpResponse, Method};
use vietsu_types::{ClientError, Result};

pub struct FetchHttpClient {
    api_base: String,
}

impl FetchHttpClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
        }
    }

    fn builder(&self, req: &HttpRequest) -> RequestBuilder {
        let url = format!("{}{}", self.api_base, req.path);
        let mut builder = match req.method {
            Method::Get => Request::get(&url),
            Method::Post => Request::post(&url),
            Method::Delete => Request::delete(&url),
        };
        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }
        builder
    }
}

#[async_trait(?Send)]
impl HttpPort for FetchHttpClient {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse> {
        let builder = self.builder(&req);

        let response = match &req.body {
            Some(body) => builder
                .json(body)
                .map_err(|e| ClientError::Network(e.to_string()))?
                .send()
                .await,
            None => builder.send().await,
        }
        .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Ok(HttpResponse { status, body })
    }
}
