//! Main egui application — composes all panels and manages the chat runtime.

use std::cell::RefCell;
use std::rc::Rc;

use egui::{self, CentralPanel, SidePanel};

use vietsu_core::event_bus::EventBus;
use vietsu_core::{ApiClient, ChatRuntime, SessionStore};
use vietsu_platform::storage::auto_detect_storage;
use vietsu_platform::timer::BrowserTimer;
use vietsu_platform::{FetchChatStream, FetchHttpClient};
use vietsu_types::auth::RegisterRequest;
use vietsu_types::config::ClientConfig;
use vietsu_types::event::ChatEvent;
use vietsu_types::ClientError;
use vietsu_ui::panels::auth::{auth_panel, AuthAction, AuthForm};
use vietsu_ui::panels::chat::chat_panel;
use vietsu_ui::panels::citations::citations_panel;
use vietsu_ui::panels::sidebar::{sidebar_panel, SidebarAction};
use vietsu_ui::state::{Screen, UiState};
use vietsu_ui::theme;

/// Outcome of an async auth attempt, polled by the UI each frame.
type AuthSlot = Rc<RefCell<Option<Result<(), String>>>>;

/// The main application state
pub struct VietSuApp {
    ui_state: UiState,
    auth_form: AuthForm,
    event_bus: EventBus,
    runtime: Rc<RefCell<ChatRuntime>>,
    api: ApiClient,
    auth_slot: AuthSlot,
    logged_out: Rc<RefCell<bool>>,
    first_frame: bool,
    font_loaded: Rc<RefCell<bool>>,
}

impl VietSuApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let config = ClientConfig::default();
        let event_bus = EventBus::new();

        let storage = auto_detect_storage();
        let session = SessionStore::new(storage);
        let http = Rc::new(FetchHttpClient::new(&config.api_base));
        let api = ApiClient::new(http, session, config.clone());

        let stream = Rc::new(FetchChatStream::new(config.clone()));
        let runtime = Rc::new(RefCell::new(ChatRuntime::new(
            api.clone(),
            stream,
            Rc::new(BrowserTimer),
            event_bus.clone(),
        )));

        let app = Self {
            ui_state: UiState::new(),
            auth_form: AuthForm::default(),
            event_bus,
            runtime: runtime.clone(),
            api: api.clone(),
            auth_slot: Rc::new(RefCell::new(None)),
            logged_out: Rc::new(RefCell::new(false)),
            first_frame: true,
            font_loaded: Rc::new(RefCell::new(false)),
        };

        Self::restore_session(api, runtime, app.auth_slot.clone());

        app
    }

    /// Resume a persisted session: restore tokens, re-fetch the user,
    /// and load the sidebar. Any failure lands on the login screen.
    fn restore_session(api: ApiClient, runtime: Rc<RefCell<ChatRuntime>>, slot: AuthSlot) {
        wasm_bindgen_futures::spawn_local(async move {
            let restored = match api.session().load().await {
                Ok(found) => found,
                Err(e) => {
                    log::warn!("Session restore failed: {}", e);
                    false
                }
            };
            if !restored {
                return;
            }
            match api.me().await {
                Ok(profile) => {
                    api.session().set_user(profile.user);
                    if let Err(e) = runtime.borrow_mut().load_conversations().await {
                        log::warn!("Failed to load conversations: {}", e);
                    }
                    *slot.borrow_mut() = Some(Ok(()));
                    log::info!("Session restored from storage");
                }
                Err(e) => {
                    // Tokens are stale beyond refresh; start clean.
                    log::info!("Stored session rejected: {}", e);
                    api.session().clear().await;
                }
            }
        });
    }

    /// Fetch the Vietnamese-capable font and install it into egui
    fn load_font(ctx: egui::Context, loaded_flag: Rc<RefCell<bool>>) {
        wasm_bindgen_futures::spawn_local(async move {
            let window = match web_sys::window() {
                Some(w) => w,
                None => return,
            };
            let resp = match wasm_bindgen_futures::JsFuture::from(
                window.fetch_with_str("NotoSans-Regular.otf"),
            )
            .await
            {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("Failed to fetch font: {:?}", e);
                    return;
                }
            };
            let resp: web_sys::Response = resp.into();
            let buf = match resp.array_buffer() {
                Ok(p) => match wasm_bindgen_futures::JsFuture::from(p).await {
                    Ok(b) => b,
                    Err(_) => return,
                },
                Err(_) => return,
            };
            let uint8 = js_sys::Uint8Array::new(&buf);
            let bytes = uint8.to_vec();

            let mut fonts = egui::FontDefinitions::default();
            fonts.font_data.insert(
                "noto_sans".to_owned(),
                egui::FontData::from_owned(bytes).into(),
            );
            fonts
                .families
                .entry(egui::FontFamily::Proportional)
                .or_default()
                .insert(0, "noto_sans".to_owned());

            ctx.set_fonts(fonts);
            *loaded_flag.borrow_mut() = true;
            ctx.request_repaint();
            log::info!("Font loaded");
        });
    }

    fn poll_auth(&mut self) {
        if let Some(result) = self.auth_slot.borrow_mut().take() {
            self.auth_form.pending = false;
            match result {
                Ok(()) => {
                    self.ui_state.screen = Screen::Chat;
                    self.auth_form.password.clear();
                }
                Err(message) => self.auth_form.error = Some(message),
            }
        }
        if *self.logged_out.borrow() {
            *self.logged_out.borrow_mut() = false;
            self.ui_state = UiState::new();
            self.auth_form = AuthForm::default();
        }
    }
}

impl eframe::App for VietSuApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            theme::apply_theme(ctx);
            Self::load_font(ctx.clone(), self.font_loaded.clone());
            self.first_frame = false;
        }

        self.poll_auth();

        // Drain events from the chat runtime
        let events = self.event_bus.drain();
        if !events.is_empty() {
            self.ui_state.process_events(events);
            ctx.request_repaint();
        }

        if self.ui_state.is_busy() {
            ctx.request_repaint();
        }

        if self.ui_state.screen == Screen::Login {
            CentralPanel::default().show(ctx, |ui| {
                if let Some(action) = auth_panel(ui, &mut self.auth_form) {
                    self.dispatch_auth(action, ctx);
                }
            });
            return;
        }

        // ── Sidebar ──────────────────────────────────────────
        SidePanel::left("sidebar")
            .min_width(200.0)
            .max_width(280.0)
            .show(ctx, |ui| {
                if let Some(action) = sidebar_panel(ui, &self.ui_state) {
                    self.dispatch_sidebar(action, ctx);
                }
            });

        // ── Citations ────────────────────────────────────────
        SidePanel::right("citations")
            .min_width(220.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                citations_panel(ui, &self.ui_state);
            });

        // ── Transcript ───────────────────────────────────────
        CentralPanel::default().show(ctx, |ui| {
            if let Some(question) = chat_panel(ui, &mut self.ui_state) {
                self.dispatch_send(question, ctx);
            }
        });
    }
}

impl VietSuApp {
    fn dispatch_auth(&mut self, action: AuthAction, ctx: &egui::Context) {
        self.auth_form.pending = true;
        let api = self.api.clone();
        let runtime = self.runtime.clone();
        let slot = self.auth_slot.clone();
        let ctx = ctx.clone();

        wasm_bindgen_futures::spawn_local(async move {
            let result = match action {
                AuthAction::Login { email, password } => {
                    api.login(&email, &password).await.map(|_| ())
                }
                AuthAction::Register {
                    email,
                    password,
                    display_name,
                } => {
                    let req = RegisterRequest {
                        email: email.clone(),
                        password: password.clone(),
                        display_name,
                        locale: "vi-VN".to_string(),
                    };
                    match api.register(&req).await {
                        Ok(_) => api.login(&email, &password).await.map(|_| ()),
                        Err(e) => Err(e),
                    }
                }
            };

            match result {
                Ok(()) => {
                    if let Err(e) = runtime.borrow_mut().load_conversations().await {
                        log::warn!("Failed to load conversations: {}", e);
                    }
                    *slot.borrow_mut() = Some(Ok(()));
                }
                Err(e) => {
                    *slot.borrow_mut() = Some(Err(e.to_string()));
                }
            }
            ctx.request_repaint();
        });
    }

    fn dispatch_sidebar(&self, action: SidebarAction, ctx: &egui::Context) {
        let runtime = self.runtime.clone();
        let bus = self.event_bus.clone();
        let ctx = ctx.clone();

        match action {
            SidebarAction::Logout => {
                let api = self.api.clone();
                let logged_out = self.logged_out.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    api.logout().await;
                    *logged_out.borrow_mut() = true;
                    ctx.request_repaint();
                });
            }
            other => {
                wasm_bindgen_futures::spawn_local(async move {
                    let result = match runtime.try_borrow_mut() {
                        Ok(mut rt) => match other {
                            SidebarAction::New {
                                agent_id,
                                hero_name,
                            } => rt.new_conversation(&agent_id, &hero_name).await,
                            SidebarAction::Select(id) => rt.select_conversation(id).await,
                            SidebarAction::Delete(id) => rt.delete_conversation(id).await,
                            SidebarAction::Logout => unreachable!(),
                        },
                        Err(_) => Err(ClientError::Busy),
                    };
                    if let Err(e) = result {
                        log::error!("Sidebar action failed: {}", e);
                        bus.emit(ChatEvent::Error {
                            message: e.to_string(),
                        });
                    }
                    ctx.request_repaint();
                });
            }
        }
    }

    /// Dispatch a question to the chat runtime (async)
    fn dispatch_send(&self, question: String, ctx: &egui::Context) {
        let runtime = self.runtime.clone();
        let bus = self.event_bus.clone();
        let ctx = ctx.clone();

        wasm_bindgen_futures::spawn_local(async move {
            let result = match runtime.try_borrow_mut() {
                Ok(mut rt) => rt.send(&question).await,
                Err(_) => Err(ClientError::Busy),
            };
            if let Err(e) = result {
                log::error!("Send failed: {}", e);
                // Stream failures already produced events; rejections
                // (busy, no conversation) have not.
                if matches!(e, ClientError::Busy | ClientError::Validation(_)) {
                    bus.emit(ChatEvent::Error {
                        message: e.to_string(),
                    });
                }
            }
            ctx.request_repaint();
        });
    }
}
