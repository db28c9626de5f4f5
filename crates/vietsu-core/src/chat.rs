//! Chat runtime — owns the transcript and drives the answer stream.
//!
//! One send at a time. The UI never reads this struct during a frame;
//! it follows along through [`ChatEvent`]s drained from the bus.

use std::rc::Rc;

use futures::future::{select, Either};
use futures::StreamExt;

use vietsu_types::citation::{ContextChunk, GraphLink};
use vietsu_types::event::ChatEvent;
use vietsu_types::message::Message;
use vietsu_types::stream::{AgentChatRequest, StreamEvent};
use vietsu_types::{ClientError, Result};

use crate::api::ApiClient;
use crate::directory::ConversationDirectory;
use crate::event_bus::EventBus;
use crate::ports::{ChatStreamPort, TimerPort};
use crate::sse::{parse_line, LineSplitter, SseLine};

/// Shown instead of an answer when the stream dies before producing
/// any content.
pub const APOLOGY: &str = "Xin lỗi, hệ thống truy vấn đang gặp sự cố. Hãy thử lại sau ít phút.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    Streaming,
    Error,
}

pub struct ChatRuntime {
    api: ApiClient,
    stream_port: Rc<dyn ChatStreamPort>,
    timer: Rc<dyn TimerPort>,
    bus: EventBus,
    pub directory: ConversationDirectory,
    pub messages: Vec<Message>,
    pub sources: Vec<ContextChunk>,
    pub graph_links: Vec<GraphLink>,
    pub state: ChatState,
}

impl ChatRuntime {
    pub fn new(
        api: ApiClient,
        stream_port: Rc<dyn ChatStreamPort>,
        timer: Rc<dyn TimerPort>,
        bus: EventBus,
    ) -> Self {
        Self {
            directory: ConversationDirectory::new(api.clone()),
            api,
            stream_port,
            timer,
            bus,
            messages: Vec::new(),
            sources: Vec::new(),
            graph_links: Vec::new(),
            state: ChatState::Idle,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Load the sidebar after sign-in or session restore.
    pub async fn load_conversations(&mut self) -> Result<()> {
        self.directory.refresh().await?;
        self.emit_conversations();
        Ok(())
    }

    /// Create a conversation and open it with the persona's greeting.
    pub async fn new_conversation(&mut self, agent_id: &str, hero_name: &str) -> Result<()> {
        let created = self.directory.create(agent_id, hero_name, None).await?;
        let greeting = self.directory.greeting(agent_id, hero_name).await;

        self.messages = vec![Message::assistant(&greeting.greeting)];
        self.sources.clear();
        self.graph_links.clear();
        self.state = ChatState::Idle;

        self.emit_conversations();
        self.bus.emit(ChatEvent::ConversationSelected {
            id: created.id,
            messages: self.messages.clone(),
        });
        Ok(())
    }

    /// Switch to an existing conversation, replacing the transcript.
    pub async fn select_conversation(&mut self, id: i64) -> Result<()> {
        let history = self.directory.select(id).await?;
        self.messages = history.messages.into_iter().map(Message::from).collect();
        self.sources.clear();
        self.graph_links.clear();
        self.state = ChatState::Idle;

        self.bus.emit(ChatEvent::ConversationSelected {
            id,
            messages: self.messages.clone(),
        });
        Ok(())
    }

    pub async fn delete_conversation(&mut self, id: i64) -> Result<()> {
        let was_selected = self.directory.selected_id() == Some(id);
        self.directory.delete(id).await?;
        if was_selected {
            self.messages.clear();
            self.sources.clear();
            self.graph_links.clear();
        }
        self.emit_conversations();
        Ok(())
    }

    /// Ask a question and stream the answer. Exactly one stream may be
    /// live; concurrent calls are rejected, not queued.
    pub async fn send(&mut self, query: &str) -> Result<()> {
        if self.state == ChatState::Streaming {
            return Err(ClientError::Busy);
        }
        let query = query.trim();
        if query.is_empty() {
            return Ok(());
        }
        let Some(conversation) = self.directory.selected() else {
            return Err(ClientError::Validation(
                "Vui lòng tạo cuộc trò chuyện mới trước".to_string(),
            ));
        };

        let request = AgentChatRequest {
            agent_id: conversation.agent_id.clone(),
            query: query.to_string(),
            session_id: Some(conversation.id),
        };

        self.messages.push(Message::user(query));
        self.messages.push(Message::streaming());
        self.sources.clear();
        self.graph_links.clear();
        self.state = ChatState::Streaming;
        self.bus.emit(ChatEvent::StreamStart);

        let result = self.run_stream(request).await;
        self.finish(result).await
    }

    /// Drive the byte stream to completion. Returns the citation batch
    /// announced by the metadata event, if any.
    async fn run_stream(
        &mut self,
        request: AgentChatRequest,
    ) -> Result<Option<(Vec<ContextChunk>, Vec<GraphLink>)>> {
        let bearer = self.api.session().access_token();
        let mut stream = self.stream_port.open(request, bearer).await?;

        let idle_ms = self.api.config().stream_idle_timeout_ms;
        let mut splitter = LineSplitter::new();
        let mut citations = None;

        loop {
            let chunk = {
                let next = stream.next();
                let idle = self.timer.sleep_ms(idle_ms);
                futures::pin_mut!(next, idle);
                match select(next, idle).await {
                    Either::Left((item, _)) => item,
                    Either::Right(((), _)) => return Err(ClientError::Timeout(idle_ms as u64)),
                }
            };

            let chunk = match chunk {
                Some(Ok(bytes)) => bytes,
                Some(Err(e)) => return Err(e),
                // Stream closed without [DONE]; whatever arrived stands.
                None => return Ok(citations),
            };

            for line in splitter.push(&chunk) {
                match parse_line(&line) {
                    SseLine::Event(StreamEvent::Content { content }) => {
                        self.append_delta(&content);
                    }
                    SseLine::Event(StreamEvent::Metadata {
                        sources,
                        graph_links,
                    }) => {
                        // Metadata marks the end of the answer text.
                        self.freeze_answer();
                        citations = Some((sources, graph_links));
                    }
                    SseLine::Event(StreamEvent::Error { message }) => {
                        return Err(ClientError::Agent(message));
                    }
                    SseLine::Done => return Ok(citations),
                    SseLine::Ignored => {}
                }
            }
        }
    }

    fn append_delta(&mut self, token: &str) {
        let Some(last) = self.messages.last_mut() else {
            return;
        };
        // A frozen answer ignores stragglers.
        if !last.streaming {
            return;
        }
        last.content.push_str(token);
        self.bus.emit(ChatEvent::Delta {
            token: token.to_string(),
        });
    }

    /// Freeze the live bubble and announce its final text. Idempotent;
    /// the first caller wins.
    fn freeze_answer(&mut self) {
        if let Some(last) = self.messages.last_mut() {
            if last.streaming {
                last.freeze();
                self.bus.emit(ChatEvent::AnswerComplete {
                    text: last.content.clone(),
                });
            }
        }
    }

    /// Freeze the answer and publish the tail of the event sequence.
    ///
    /// A failure before any content replaces the empty bubble with the
    /// apology line; after content, the partial answer is kept.
    async fn finish(
        &mut self,
        result: Result<Option<(Vec<ContextChunk>, Vec<GraphLink>)>>,
    ) -> Result<()> {
        let citations = match &result {
            Ok(c) => c.clone(),
            Err(_) => None,
        };

        if result.is_err() {
            if let Some(last) = self.messages.last_mut() {
                if last.streaming && last.content.is_empty() {
                    last.content = APOLOGY.to_string();
                }
            }
        }
        self.freeze_answer();

        if let Some((sources, graph_links)) = citations {
            if !sources.is_empty() || !graph_links.is_empty() {
                self.bus.emit(ChatEvent::CitationsLoading);
                // Let the frozen answer settle before the panel fills in.
                self.timer
                    .sleep_ms(self.api.config().citation_reveal_delay_ms)
                    .await;
                self.sources = sources.clone();
                self.graph_links = graph_links.clone();
                self.bus.emit(ChatEvent::CitationsReady {
                    sources,
                    graph_links,
                });
            }
        }

        match result {
            Ok(_) => {
                self.state = ChatState::Idle;
                self.bus.emit(ChatEvent::StreamEnd);
                // last_message_at moved; refresh is best-effort.
                if self.directory.refresh().await.is_ok() {
                    self.emit_conversations();
                }
                Ok(())
            }
            Err(e) => {
                self.state = ChatState::Error;
                log::error!("Chat stream failed: {}", e);
                self.bus.emit(ChatEvent::Error {
                    message: e.to_string(),
                });
                self.bus.emit(ChatEvent::StreamEnd);
                Err(e)
            }
        }
    }

    fn emit_conversations(&self) {
        self.bus.emit(ChatEvent::ConversationsLoaded {
            conversations: self.directory.conversations().to_vec(),
        });
    }
}
