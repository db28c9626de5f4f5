#[cfg(test)]
mod tests {
    use crate::api::ApiClient;
    use crate::chat::{ChatRuntime, ChatState, APOLOGY};
    use crate::directory::ConversationDirectory;
    use crate::event_bus::EventBus;
    use crate::ports::*;
    use crate::session::SessionStore;
    use crate::sse::{parse_line, LineSplitter, SseLine};
    use vietsu_types::config::ClientConfig;
    use vietsu_types::event::ChatEvent;
    use vietsu_types::message::Role;
    use vietsu_types::stream::AgentChatRequest;
    use vietsu_types::ClientError;

    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};
    use std::rc::Rc;
    use async_trait::async_trait;
    use futures::StreamExt;

    // ─── EventBus Tests ──────────────────────────────────────

    #[test]
    fn test_event_bus_new_is_empty() {
        let bus: EventBus = EventBus::new();
        assert!(bus.is_empty());
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_event_bus_emit_and_drain() {
        let bus = EventBus::new();
        bus.emit(ChatEvent::StreamStart);
        bus.emit(ChatEvent::Delta { token: "xin".to_string() });

        assert_eq!(bus.len(), 2);

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_event_bus_clone_shares_state() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        bus1.emit(ChatEvent::StreamStart);
        assert!(!bus2.is_empty());

        let events = bus2.drain();
        assert_eq!(events.len(), 1);
        assert!(bus1.is_empty());
    }

    // ─── LineSplitter Tests ──────────────────────────────────

    #[test]
    fn test_splitter_whole_line() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push(b"data: hello\n");
        assert_eq!(lines, vec!["data: hello"]);
        assert_eq!(splitter.pending(), 0);
    }

    #[test]
    fn test_splitter_line_across_chunks() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.push(b"data: hel").is_empty());
        assert_eq!(splitter.pending(), 9);
        let lines = splitter.push(b"lo\n");
        assert_eq!(lines, vec!["data: hello"]);
    }

    #[test]
    fn test_splitter_multiple_lines_one_chunk() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push(b"a\nb\nc");
        assert_eq!(lines, vec!["a", "b"]);
        assert_eq!(splitter.pending(), 1);
    }

    #[test]
    fn test_splitter_strips_carriage_return() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push(b"data: x\r\n");
        assert_eq!(lines, vec!["data: x"]);
    }

    #[test]
    fn test_splitter_utf8_split_mid_character() {
        // "chào" split inside the two-byte à sequence
        let bytes = "data: chào\n".as_bytes();
        let mut splitter = LineSplitter::new();
        assert!(splitter.push(&bytes[..8]).is_empty());
        let lines = splitter.push(&bytes[8..]);
        assert_eq!(lines, vec!["data: chào"]);
    }

    #[test]
    fn test_splitter_empty_line() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push(b"\n\n");
        assert_eq!(lines, vec!["", ""]);
    }

    // ─── parse_line Tests ────────────────────────────────────

    #[test]
    fn test_parse_line_content_event() {
        match parse_line(r#"data: {"type":"content","content":"xin"}"#) {
            SseLine::Event(vietsu_types::stream::StreamEvent::Content { content }) => {
                assert_eq!(content, "xin")
            }
            _ => panic!("Expected content event"),
        }
    }

    #[test]
    fn test_parse_line_done_sentinel() {
        assert!(matches!(parse_line("data: [DONE]"), SseLine::Done));
    }

    #[test]
    fn test_parse_line_done_must_be_whole_payload() {
        // A suffix makes it an (undecodable) payload, not the sentinel
        assert!(matches!(parse_line("data: [DONE] extra"), SseLine::Ignored));
    }

    #[test]
    fn test_parse_line_bad_json_is_skipped() {
        assert!(matches!(parse_line("data: {not json"), SseLine::Ignored));
    }

    #[test]
    fn test_parse_line_non_data_lines_are_skipped() {
        assert!(matches!(parse_line(""), SseLine::Ignored));
        assert!(matches!(parse_line(": keepalive"), SseLine::Ignored));
        assert!(matches!(parse_line("event: message"), SseLine::Ignored));
    }

    // ─── Mock Ports ──────────────────────────────────────────

    struct MockStorage {
        data: RefCell<HashMap<String, Vec<u8>>>,
    }

    impl MockStorage {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                data: RefCell::new(HashMap::new()),
            })
        }
    }

    #[async_trait(?Send)]
    impl StoragePort for MockStorage {
        async fn get(&self, key: &str) -> vietsu_types::Result<Option<Vec<u8>>> {
            Ok(self.data.borrow().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &[u8]) -> vietsu_types::Result<()> {
            self.data.borrow_mut().insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn delete(&self, key: &str) -> vietsu_types::Result<()> {
            self.data.borrow_mut().remove(key);
            Ok(())
        }

        async fn list_keys(&self, prefix: &str) -> vietsu_types::Result<Vec<String>> {
            Ok(self
                .data
                .borrow()
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        }

        fn backend_name(&self) -> &str {
            "mock"
        }
    }

    /// Scripted HTTP port. Sequential tests script a FIFO queue;
    /// interleaved tests script per-path queues, since completion order
    /// under `join` is not submission order.
    struct MockHttp {
        responses: RefCell<VecDeque<HttpResponse>>,
        routes: RefCell<HashMap<String, VecDeque<HttpResponse>>>,
        requests: RefCell<Vec<HttpRequest>>,
        /// When set, each send yields once before answering, so
        /// interleaved callers can observe each other's refresh.
        yield_once: bool,
    }

    fn canned(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: body.to_string(),
        }
    }

    impl MockHttp {
        fn new(responses: Vec<(u16, &str)>) -> Rc<Self> {
            Rc::new(Self {
                responses: RefCell::new(
                    responses
                        .into_iter()
                        .map(|(status, body)| canned(status, body))
                        .collect(),
                ),
                routes: RefCell::new(HashMap::new()),
                requests: RefCell::new(Vec::new()),
                yield_once: false,
            })
        }

        fn routed(routes: Vec<(&str, u16, &str)>) -> Rc<Self> {
            let mut map: HashMap<String, VecDeque<HttpResponse>> = HashMap::new();
            for (path, status, body) in routes {
                map.entry(path.to_string())
                    .or_default()
                    .push_back(canned(status, body));
            }
            Rc::new(Self {
                responses: RefCell::new(VecDeque::new()),
                routes: RefCell::new(map),
                requests: RefCell::new(Vec::new()),
                yield_once: true,
            })
        }

        fn paths(&self) -> Vec<String> {
            self.requests.borrow().iter().map(|r| r.path.clone()).collect()
        }

        fn count_path(&self, path: &str) -> usize {
            self.requests.borrow().iter().filter(|r| r.path == path).count()
        }
    }

    #[async_trait(?Send)]
    impl HttpPort for MockHttp {
        async fn send(&self, req: HttpRequest) -> vietsu_types::Result<HttpResponse> {
            if self.yield_once {
                YieldNow::default().await;
            }
            let path = req.path.clone();
            self.requests.borrow_mut().push(req);
            let routed = self
                .routes
                .borrow_mut()
                .get_mut(&path)
                .and_then(|queue| queue.pop_front());
            match routed {
                Some(resp) => Ok(resp),
                None => self
                    .responses
                    .borrow_mut()
                    .pop_front()
                    .ok_or_else(|| ClientError::Network("script exhausted".to_string())),
            }
        }
    }

    /// Pends once, then completes. Forces a task switch under a
    /// re-polling executor.
    #[derive(Default)]
    struct YieldNow {
        yielded: bool,
    }

    impl std::future::Future for YieldNow {
        type Output = ();

        fn poll(
            mut self: std::pin::Pin<&mut Self>,
            cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<()> {
            if self.yielded {
                std::task::Poll::Ready(())
            } else {
                self.yielded = true;
                cx.waker().wake_by_ref();
                std::task::Poll::Pending
            }
        }
    }

    /// Timer that resolves immediately. Idle timeouts only fire when
    /// the stream itself pends, which scripted streams never do.
    struct InstantTimer;

    #[async_trait(?Send)]
    impl TimerPort for InstantTimer {
        async fn sleep_ms(&self, _ms: u32) {}
    }

    struct MockStream {
        chunks: RefCell<VecDeque<vietsu_types::Result<Vec<u8>>>>,
        /// Pend forever after the scripted chunks instead of ending.
        hang_after: bool,
        requests: RefCell<Vec<AgentChatRequest>>,
    }

    impl MockStream {
        fn new(chunks: Vec<vietsu_types::Result<Vec<u8>>>) -> Rc<Self> {
            Rc::new(Self {
                chunks: RefCell::new(chunks.into_iter().collect()),
                hang_after: false,
                requests: RefCell::new(Vec::new()),
            })
        }

        fn hanging() -> Rc<Self> {
            Rc::new(Self {
                chunks: RefCell::new(VecDeque::new()),
                hang_after: true,
                requests: RefCell::new(Vec::new()),
            })
        }
    }

    #[async_trait(?Send)]
    impl ChatStreamPort for MockStream {
        async fn open(
            &self,
            req: AgentChatRequest,
            _bearer: Option<String>,
        ) -> vietsu_types::Result<ByteStream> {
            self.requests.borrow_mut().push(req);
            let chunks: Vec<_> = self.chunks.borrow_mut().drain(..).collect();
            if self.hang_after {
                Ok(Box::pin(
                    futures::stream::iter(chunks).chain(futures::stream::pending()),
                ))
            } else {
                Ok(Box::pin(futures::stream::iter(chunks)))
            }
        }
    }

    /// Stream port whose open() itself fails.
    struct FailingStream;

    #[async_trait(?Send)]
    impl ChatStreamPort for FailingStream {
        async fn open(
            &self,
            _req: AgentChatRequest,
            _bearer: Option<String>,
        ) -> vietsu_types::Result<ByteStream> {
            Err(ClientError::Network("connection refused".to_string()))
        }
    }

    // Single-threaded block_on for native tests
    fn block_on<F: std::future::Future<Output = T>, T>(f: F) -> T {
        use std::sync::Arc;
        use std::task::{Context, Poll, Wake, Waker};

        struct NoopWaker;
        impl Wake for NoopWaker {
            fn wake(self: Arc<Self>) {}
        }

        let waker = Waker::from(Arc::new(NoopWaker));
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            match f.as_mut().poll(&mut cx) {
                Poll::Ready(val) => return val,
                Poll::Pending => std::thread::yield_now(),
            }
        }
    }

    const TOKENS_JSON: &str = r#"{
        "access_token": "acc2",
        "refresh_token": "ref2",
        "token_type": "bearer",
        "expires_in": 900,
        "user": {
            "id": 1,
            "email": "a@b.vn",
            "display_name": "A",
            "avatar_url": null,
            "locale": "vi-VN",
            "is_email_verified": true
        }
    }"#;

    fn session_with_tokens(storage: Rc<MockStorage>) -> SessionStore {
        let session = SessionStore::new(storage);
        block_on(session.set_tokens(vietsu_types::auth::Credentials {
            access_token: "acc1".to_string(),
            refresh_token: "ref1".to_string(),
        }))
        .unwrap();
        session
    }

    fn client(http: Rc<MockHttp>, session: SessionStore) -> ApiClient {
        ApiClient::new(http, session, ClientConfig::default())
    }

    // ─── SessionStore Tests ──────────────────────────────────

    #[test]
    fn test_session_roundtrip_through_storage() {
        let storage = MockStorage::new();
        let session = session_with_tokens(storage.clone());
        assert!(session.is_authenticated());
        assert_eq!(session.access_token().as_deref(), Some("acc1"));

        // A second store over the same backend restores the pair
        let restored = SessionStore::new(storage);
        assert!(block_on(restored.load()).unwrap());
        assert_eq!(restored.refresh_token().as_deref(), Some("ref1"));
    }

    #[test]
    fn test_session_load_empty_storage() {
        let session = SessionStore::new(MockStorage::new());
        assert!(!block_on(session.load()).unwrap());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_session_clear_removes_persisted_tokens() {
        let storage = MockStorage::new();
        let session = session_with_tokens(storage.clone());
        block_on(session.clear());
        assert!(!session.is_authenticated());

        let restored = SessionStore::new(storage);
        assert!(!block_on(restored.load()).unwrap());
    }

    // ─── ApiClient Tests ─────────────────────────────────────

    #[test]
    fn test_request_adds_standard_headers() {
        let http = MockHttp::new(vec![(200, "[]")]);
        let api = client(http.clone(), session_with_tokens(MockStorage::new()));

        block_on(api.list_conversations()).unwrap();

        let requests = http.requests.borrow();
        let names: Vec<&str> = requests[0].headers.iter().map(|(n, _)| n.as_str()).collect();
        assert!(names.contains(&"X-Client-Version"));
        assert!(names.contains(&"Content-Language"));
        assert!(requests[0]
            .headers
            .iter()
            .any(|(n, v)| n == "Authorization" && v == "Bearer acc1"));
    }

    #[test]
    fn test_no_bearer_when_signed_out() {
        let http = MockHttp::new(vec![(200, "{\"nodes\":[]}")]);
        let api = client(http.clone(), SessionStore::new(MockStorage::new()));

        block_on(api.timeline()).unwrap();

        let requests = http.requests.borrow();
        assert!(!requests[0].headers.iter().any(|(n, _)| n == "Authorization"));
    }

    #[test]
    fn test_expired_token_refreshes_and_retries_once() {
        let http = MockHttp::new(vec![
            (401, r#"{"detail":"token_expired"}"#),
            (200, TOKENS_JSON),
            (200, "[]"),
        ]);
        let session = session_with_tokens(MockStorage::new());
        let api = client(http.clone(), session.clone());

        block_on(api.list_conversations()).unwrap();

        assert_eq!(
            http.paths(),
            vec!["/conversations", "/auth/token/refresh", "/conversations"]
        );
        assert_eq!(session.access_token().as_deref(), Some("acc2"));
        // Retry carries the fresh token
        let requests = http.requests.borrow();
        assert!(requests[2]
            .headers
            .iter()
            .any(|(n, v)| n == "Authorization" && v == "Bearer acc2"));
    }

    #[test]
    fn test_plain_401_does_not_refresh() {
        let http = MockHttp::new(vec![(401, r#"{"detail":"bad_credentials"}"#)]);
        let api = client(http.clone(), session_with_tokens(MockStorage::new()));

        let err = block_on(api.list_conversations()).unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 401, .. }));
        assert_eq!(http.count_path("/auth/token/refresh"), 0);
    }

    #[test]
    fn test_expired_without_refresh_token_fails_directly() {
        let http = MockHttp::new(vec![(401, r#"{"detail":"token_expired"}"#)]);
        let api = client(http.clone(), SessionStore::new(MockStorage::new()));

        let err = block_on(api.list_conversations()).unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 401, .. }));
        assert_eq!(http.count_path("/auth/token/refresh"), 0);
    }

    #[test]
    fn test_failed_refresh_clears_session_and_keeps_original_error() {
        let http = MockHttp::new(vec![
            (401, r#"{"detail":"token_expired"}"#),
            (401, r#"{"detail":"refresh_expired"}"#),
        ]);
        let session = session_with_tokens(MockStorage::new());
        let api = client(http.clone(), session.clone());

        let err = block_on(api.list_conversations()).unwrap_err();
        match err {
            ClientError::Api { status, detail } => {
                assert_eq!(status, 401);
                assert_eq!(detail, "token_expired");
            }
            other => panic!("Unexpected error: {}", other),
        }
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_concurrent_expiry_refreshes_once() {
        // Both requests 401 first; one refresh serves both retries.
        let http = MockHttp::routed(vec![
            ("/conversations", 401, r#"{"detail":"token_expired"}"#),
            ("/conversations", 200, "[]"),
            ("/timeline", 401, r#"{"detail":"token_expired"}"#),
            ("/timeline", 200, "{\"nodes\":[]}"),
            ("/auth/token/refresh", 200, TOKENS_JSON),
        ]);
        let session = session_with_tokens(MockStorage::new());
        let api = client(http.clone(), session);

        let (a, b) = block_on(futures::future::join(
            api.list_conversations(),
            api.timeline(),
        ));
        a.unwrap();
        b.unwrap();

        assert_eq!(http.count_path("/auth/token/refresh"), 1);
    }

    #[test]
    fn test_login_stores_session() {
        let http = MockHttp::new(vec![(200, TOKENS_JSON)]);
        let session = SessionStore::new(MockStorage::new());
        let api = client(http.clone(), session.clone());

        let resp = block_on(api.login("a@b.vn", "secret")).unwrap();
        assert_eq!(resp.user.email, "a@b.vn");
        assert!(session.is_authenticated());
        assert_eq!(session.access_token().as_deref(), Some("acc2"));
    }

    #[test]
    fn test_logout_clears_session_even_if_request_fails() {
        let http = MockHttp::new(vec![(500, "oops")]);
        let session = session_with_tokens(MockStorage::new());
        let api = client(http, session.clone());

        block_on(api.logout());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_greeting_falls_back_on_failure() {
        let http = MockHttp::new(vec![(500, "oops")]);
        let api = client(http, session_with_tokens(MockStorage::new()));

        let resp = block_on(api.greeting("agent_tran", "Trần Hưng Đạo"));
        assert!(resp.greeting.contains("Trần Hưng Đạo"));
        assert!(resp.suggestions.is_empty());
    }

    #[test]
    fn test_greeting_uses_server_response() {
        let http = MockHttp::new(vec![(
            200,
            r#"{"greeting":"Ta đây","suggestions":["Hỏi về trận đánh"]}"#,
        )]);
        let api = client(http, session_with_tokens(MockStorage::new()));

        let resp = block_on(api.greeting("agent_tran", "Trần Hưng Đạo"));
        assert_eq!(resp.greeting, "Ta đây");
        assert_eq!(resp.suggestions.len(), 1);
    }

    // ─── ConversationDirectory Tests ─────────────────────────

    const CONV_JSON: &str = r#"{
        "id": 7,
        "agent_id": "agent_tran",
        "hero_name": "Trần Hưng Đạo",
        "topic": null,
        "created_at": "2026-02-01T08:00:00+00:00",
        "last_message_at": "2026-02-01T08:00:00+00:00",
        "message_count": 0
    }"#;

    #[test]
    fn test_directory_create_selects_new_conversation() {
        let http = MockHttp::new(vec![(200, CONV_JSON)]);
        let api = client(http, session_with_tokens(MockStorage::new()));
        let mut dir = ConversationDirectory::new(api);

        let created = block_on(dir.create("agent_tran", "Trần Hưng Đạo", None)).unwrap();
        assert_eq!(created.id, 7);
        assert_eq!(dir.selected_id(), Some(7));
        assert_eq!(dir.conversations().len(), 1);
    }

    #[test]
    fn test_directory_create_rejects_empty_agent() {
        let http = MockHttp::new(vec![]);
        let api = client(http.clone(), session_with_tokens(MockStorage::new()));
        let mut dir = ConversationDirectory::new(api);

        let err = block_on(dir.create("  ", "X", None)).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(http.requests.borrow().is_empty());
    }

    #[test]
    fn test_directory_delete_selected_clears_selection() {
        let http = MockHttp::new(vec![(200, CONV_JSON), (200, "{}")]);
        let api = client(http, session_with_tokens(MockStorage::new()));
        let mut dir = ConversationDirectory::new(api);

        block_on(dir.create("agent_tran", "Trần Hưng Đạo", None)).unwrap();
        block_on(dir.delete(7)).unwrap();

        assert_eq!(dir.selected_id(), None);
        assert!(dir.conversations().is_empty());
    }

    #[test]
    fn test_directory_delete_other_keeps_selection() {
        let conv8 = CONV_JSON.replace("\"id\": 7", "\"id\": 8");
        let list = format!("[{},{}]", CONV_JSON, conv8);
        let history = format!(r#"{{"conversation":{},"messages":[]}}"#, CONV_JSON);
        let http = MockHttp::new(vec![
            (200, &list),
            (200, &history),
            (200, "{}"),
        ]);
        let api = client(http, session_with_tokens(MockStorage::new()));
        let mut dir = ConversationDirectory::new(api);

        block_on(dir.refresh()).unwrap();
        block_on(dir.select(7)).unwrap();
        block_on(dir.delete(8)).unwrap();

        assert_eq!(dir.selected_id(), Some(7));
        assert_eq!(dir.conversations().len(), 1);
    }

    #[test]
    fn test_directory_select_unknown_id_fails() {
        let http = MockHttp::new(vec![]);
        let api = client(http.clone(), session_with_tokens(MockStorage::new()));
        let mut dir = ConversationDirectory::new(api);

        let err = block_on(dir.select(99)).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(http.requests.borrow().is_empty());
    }

    #[test]
    fn test_directory_refresh_drops_stale_selection() {
        let http = MockHttp::new(vec![(200, CONV_JSON), (200, "[]")]);
        let api = client(http, session_with_tokens(MockStorage::new()));
        let mut dir = ConversationDirectory::new(api);

        block_on(dir.create("agent_tran", "Trần Hưng Đạo", None)).unwrap();
        block_on(dir.refresh()).unwrap();

        assert_eq!(dir.selected_id(), None);
        assert!(dir.conversations().is_empty());
    }

    // ─── ChatRuntime Tests ───────────────────────────────────

    fn sse(lines: &[&str]) -> Vec<vietsu_types::Result<Vec<u8>>> {
        lines
            .iter()
            .map(|l| Ok(format!("{}\n", l).into_bytes()))
            .collect()
    }

    fn runtime_with(
        http: Rc<MockHttp>,
        stream: Rc<dyn ChatStreamPort>,
    ) -> (ChatRuntime, EventBus) {
        let session = session_with_tokens(MockStorage::new());
        let api = client(http, session);
        let bus = EventBus::new();
        let runtime = ChatRuntime::new(api, stream, Rc::new(InstantTimer), bus.clone());
        (runtime, bus)
    }

    /// Create a conversation so the runtime has a target.
    fn prime(runtime: &mut ChatRuntime) {
        block_on(runtime.new_conversation("agent_tran", "Trần Hưng Đạo")).unwrap();
    }

    // create + greeting, then post-send list refresh
    fn chat_http() -> Rc<MockHttp> {
        MockHttp::new(vec![
            (200, CONV_JSON),
            (200, r#"{"greeting":"Ta đây","suggestions":[]}"#),
            (200, "[]"),
        ])
    }

    #[test]
    fn test_send_streams_content_and_citations() {
        let stream = MockStream::new(sse(&[
            r#"data: {"type":"content","content":"Trận "}"#,
            r#"data: {"type":"content","content":"Bạch Đằng"}"#,
            r#"data: {"type":"metadata","sources":[{"chunk_id":1,"text":"t","source":"s"}],"graph_links":[]}"#,
            "data: [DONE]",
        ]));
        let (mut runtime, bus) = runtime_with(chat_http(), stream.clone());
        prime(&mut runtime);
        bus.drain();

        block_on(runtime.send("Kể về trận Bạch Đằng")).unwrap();

        assert_eq!(runtime.state, ChatState::Idle);
        assert_eq!(runtime.messages.len(), 3); // greeting + user + answer
        let answer = runtime.messages.last().unwrap();
        assert_eq!(answer.role, Role::Assistant);
        assert_eq!(answer.content, "Trận Bạch Đằng");
        assert!(!answer.streaming);
        assert_eq!(runtime.sources.len(), 1);

        let events = bus.drain();
        assert!(matches!(events[0], ChatEvent::StreamStart));
        let deltas = events
            .iter()
            .filter(|e| matches!(e, ChatEvent::Delta { .. }))
            .count();
        assert_eq!(deltas, 2);
        assert!(events
            .iter()
            .any(|e| matches!(e, ChatEvent::AnswerComplete { text } if text == "Trận Bạch Đằng")));
        let loading_pos = events
            .iter()
            .position(|e| matches!(e, ChatEvent::CitationsLoading))
            .expect("Missing CitationsLoading");
        let ready_pos = events
            .iter()
            .position(|e| matches!(e, ChatEvent::CitationsReady { .. }))
            .expect("Missing CitationsReady");
        assert!(loading_pos < ready_pos);
        assert!(events.iter().any(|e| matches!(e, ChatEvent::StreamEnd)));

        // Stream request targeted the selected conversation
        let requests = stream.requests.borrow();
        assert_eq!(requests[0].session_id, Some(7));
        assert_eq!(requests[0].agent_id, "agent_tran");
    }

    #[test]
    fn test_metadata_freezes_answer_against_late_content() {
        let stream = MockStream::new(sse(&[
            r#"data: {"type":"content","content":"Ngô Quyền"}"#,
            r#"data: {"type":"metadata","sources":[{"chunk_id":1,"text":"t","source":"s"}],"graph_links":[]}"#,
            r#"data: {"type":"content","content":" thừa"}"#,
            "data: [DONE]",
        ]));
        let (mut runtime, bus) = runtime_with(chat_http(), stream);
        prime(&mut runtime);
        bus.drain();

        block_on(runtime.send("Ai thắng trận Bạch Đằng?")).unwrap();

        // Content after metadata is dropped, not appended
        let answer = runtime.messages.last().unwrap();
        assert_eq!(answer.content, "Ngô Quyền");
        assert!(!answer.streaming);

        let events = bus.drain();
        let deltas = events
            .iter()
            .filter(|e| matches!(e, ChatEvent::Delta { .. }))
            .count();
        assert_eq!(deltas, 1);
        let complete_pos = events
            .iter()
            .position(|e| matches!(e, ChatEvent::AnswerComplete { text } if text == "Ngô Quyền"))
            .expect("Missing AnswerComplete");
        let loading_pos = events
            .iter()
            .position(|e| matches!(e, ChatEvent::CitationsLoading))
            .expect("Missing CitationsLoading");
        assert!(complete_pos < loading_pos);
    }

    #[test]
    fn test_send_line_split_across_chunks() {
        let stream = MockStream::new(vec![
            Ok(b"data: {\"type\":\"content\",".to_vec()),
            Ok(b"\"content\":\"xin chao\"}\ndata: [DONE]\n".to_vec()),
        ]);
        let (mut runtime, bus) = runtime_with(chat_http(), stream);
        prime(&mut runtime);
        bus.drain();

        block_on(runtime.send("hi")).unwrap();
        assert_eq!(runtime.messages.last().unwrap().content, "xin chao");
    }

    #[test]
    fn test_send_skips_undecodable_lines() {
        let stream = MockStream::new(sse(&[
            "data: {broken",
            ": keepalive",
            r#"data: {"type":"content","content":"ok"}"#,
            "data: [DONE]",
        ]));
        let (mut runtime, bus) = runtime_with(chat_http(), stream);
        prime(&mut runtime);
        bus.drain();

        block_on(runtime.send("hi")).unwrap();
        assert_eq!(runtime.messages.last().unwrap().content, "ok");
    }

    #[test]
    fn test_send_failure_before_content_shows_apology() {
        let http = MockHttp::new(vec![
            (200, CONV_JSON),
            (200, r#"{"greeting":"Ta đây","suggestions":[]}"#),
        ]);
        let (mut runtime, bus) = runtime_with(http, Rc::new(FailingStream));
        prime(&mut runtime);
        bus.drain();

        let err = block_on(runtime.send("hi")).unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
        assert_eq!(runtime.state, ChatState::Error);

        let answer = runtime.messages.last().unwrap();
        assert_eq!(answer.content, APOLOGY);
        assert!(!answer.streaming);

        let events = bus.drain();
        assert!(events
            .iter()
            .any(|e| matches!(e, ChatEvent::AnswerComplete { text } if text == APOLOGY)));
        assert!(events.iter().any(|e| matches!(e, ChatEvent::Error { .. })));
        assert!(events.iter().any(|e| matches!(e, ChatEvent::StreamEnd)));
    }

    #[test]
    fn test_send_error_event_after_content_keeps_partial() {
        let stream = MockStream::new(sse(&[
            r#"data: {"type":"content","content":"một phần"}"#,
            r#"data: {"type":"error","message":"llm quota"}"#,
        ]));
        let (mut runtime, bus) = runtime_with(chat_http(), stream);
        prime(&mut runtime);
        bus.drain();

        let err = block_on(runtime.send("hi")).unwrap_err();
        assert!(matches!(err, ClientError::Agent(_)));

        let answer = runtime.messages.last().unwrap();
        assert_eq!(answer.content, "một phần");
        assert!(!answer.streaming);
    }

    #[test]
    fn test_send_idle_timeout_fails_stream() {
        let (mut runtime, bus) = runtime_with(chat_http(), MockStream::hanging());
        prime(&mut runtime);
        bus.drain();

        let err = block_on(runtime.send("hi")).unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)));
        assert_eq!(runtime.messages.last().unwrap().content, APOLOGY);
    }

    #[test]
    fn test_send_rejects_while_streaming() {
        let (mut runtime, bus) = runtime_with(chat_http(), MockStream::new(vec![]));
        prime(&mut runtime);
        bus.drain();
        runtime.state = ChatState::Streaming;

        let err = block_on(runtime.send("hi")).unwrap_err();
        assert!(matches!(err, ClientError::Busy));
    }

    #[test]
    fn test_send_without_conversation_is_rejected() {
        let http = MockHttp::new(vec![]);
        let (mut runtime, _bus) = runtime_with(http, MockStream::new(vec![]));

        let err = block_on(runtime.send("hi")).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[test]
    fn test_send_empty_query_is_noop() {
        let http = MockHttp::new(vec![]);
        let (mut runtime, bus) = runtime_with(http, MockStream::new(vec![]));

        block_on(runtime.send("   ")).unwrap();
        assert!(runtime.messages.is_empty());
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_stream_end_without_done_keeps_answer() {
        let stream = MockStream::new(sse(&[r#"data: {"type":"content","content":"xong"}"#]));
        let (mut runtime, bus) = runtime_with(chat_http(), stream);
        prime(&mut runtime);
        bus.drain();

        block_on(runtime.send("hi")).unwrap();
        assert_eq!(runtime.messages.last().unwrap().content, "xong");
        assert_eq!(runtime.state, ChatState::Idle);
    }

    #[test]
    fn test_new_conversation_emits_greeting() {
        let (mut runtime, bus) = runtime_with(chat_http(), MockStream::new(vec![]));
        prime(&mut runtime);

        assert_eq!(runtime.messages.len(), 1);
        assert_eq!(runtime.messages[0].content, "Ta đây");

        let events = bus.drain();
        assert!(events
            .iter()
            .any(|e| matches!(e, ChatEvent::ConversationsLoaded { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, ChatEvent::ConversationSelected { id: 7, .. })));
    }
}
