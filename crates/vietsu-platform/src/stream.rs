//! Streaming chat adapter.
//!
//! gloo-net buffers whole responses, so this adapter drops down to raw
//! `fetch()` and pulls chunks off the response `ReadableStream` reader.

use async_trait::async_trait;
use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, ReadableStreamDefaultReader, Request, RequestInit, Response};

use vietsu_core::ports::{ByteStream, ChatStreamPort};
use vietsu_types::config::ClientConfig;
use vietsu_types::stream::AgentChatRequest;
use vietsu_types::{ClientError, Result};

pub struct FetchChatStream {
    config: ClientConfig,
}

impl FetchChatStream {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    fn build_request(&self, req: &AgentChatRequest, bearer: Option<String>) -> Result<Request> {
        let headers = Headers::new().map_err(js_err)?;
        headers
            .set("Content-Type", "application/json")
            .map_err(js_err)?;
        headers
            .set("X-Client-Version", &self.config.client_version)
            .map_err(js_err)?;
        headers
            .set("Content-Language", &self.config.language)
            .map_err(js_err)?;
        if let Some(token) = bearer {
            headers
                .set("Authorization", &format!("Bearer {}", token))
                .map_err(js_err)?;
        }

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_headers(&headers);
        let body = serde_json::to_string(req)?;
        init.set_body(&JsValue::from_str(&body));

        let url = format!("{}/agents/chat", self.config.api_base);
        Request::new_with_str_and_init(&url, &init).map_err(js_err)
    }
}

#[async_trait(?Send)]
impl ChatStreamPort for FetchChatStream {
    async fn open(&self, req: AgentChatRequest, bearer: Option<String>) -> Result<ByteStream> {
        let request = self.build_request(&req, bearer)?;

        let window = web_sys::window()
            .ok_or_else(|| ClientError::JsInterop("No window object".to_string()))?;
        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| ClientError::Network(js_detail(&e)))?;
        let response: Response = response.dyn_into().map_err(js_err)?;

        if !response.ok() {
            let status = response.status();
            let detail = match response.text() {
                Ok(promise) => JsFuture::from(promise)
                    .await
                    .ok()
                    .and_then(|v| v.as_string())
                    .unwrap_or_default(),
                Err(_) => String::new(),
            };
            return Err(ClientError::Api { status, detail });
        }

        let body = response
            .body()
            .ok_or_else(|| ClientError::Stream("Response has no body".to_string()))?;
        let reader: ReadableStreamDefaultReader = body
            .get_reader()
            .dyn_into()
            .map_err(|e| js_err(e.into()))?;

        Ok(Box::pin(futures::stream::unfold(reader, |reader| async {
            match JsFuture::from(reader.read()).await {
                Ok(result) => {
                    let done = Reflect::get(&result, &JsValue::from_str("done"))
                        .ok()
                        .and_then(|d| d.as_bool())
                        .unwrap_or(true);
                    if done {
                        return None;
                    }
                    let value = match Reflect::get(&result, &JsValue::from_str("value")) {
                        Ok(v) => v,
                        Err(e) => return Some((Err(js_err(e)), reader)),
                    };
                    let bytes = Uint8Array::new(&value).to_vec();
                    Some((Ok(bytes), reader))
                }
                Err(e) => Some((
                    Err(ClientError::Stream(js_detail(&e))),
                    reader,
                )),
            }
        })))
    }
}

fn js_err(e: JsValue) -> ClientError {
    ClientError::JsInterop(js_detail(&e))
}

fn js_detail(e: &JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{:?}", e))
}
