//! Login / register screen.

use egui::{self, RichText, Vec2};

use crate::theme::*;

/// What the caller should do after rendering the auth panel
pub enum AuthAction {
    Login { email: String, password: String },
    Register {
        email: String,
        password: String,
        display_name: String,
    },
}

/// Form fields, owned by the app so they survive frames.
#[derive(Default)]
pub struct AuthForm {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub registering: bool,
    /// Error from the last attempt, shown under the form
    pub error: Option<String>,
    /// A request is in flight; buttons disabled
    pub pending: bool,
}

/// Render the auth panel. Returns an action when the user submits.
pub fn auth_panel(ui: &mut egui::Ui, form: &mut AuthForm) -> Option<AuthAction> {
    let mut action = None;

    ui.vertical_centered(|ui| {
        ui.add_space(ui.available_height() * 0.2);
        ui.heading(RichText::new("Việt Sử").color(ACCENT).strong().size(28.0));
        ui.label(
            RichText::new("Trò chuyện cùng các anh hùng lịch sử")
                .color(TEXT_SECONDARY),
        );
        ui.add_space(16.0);

        egui::Frame::default()
            .fill(BG_SECONDARY)
            .corner_radius(PANEL_ROUNDING)
            .inner_margin(16.0)
            .show(ui, |ui| {
                ui.set_max_width(320.0);

                ui.label(RichText::new("Email").color(TEXT_SECONDARY).small());
                ui.add(
                    egui::TextEdit::singleline(&mut form.email)
                        .hint_text("email@example.com")
                        .desired_width(f32::INFINITY),
                );

                ui.add_space(4.0);
                ui.label(RichText::new("Mật khẩu").color(TEXT_SECONDARY).small());
                ui.add(
                    egui::TextEdit::singleline(&mut form.password)
                        .password(true)
                        .desired_width(f32::INFINITY),
                );

                if form.registering {
                    ui.add_space(4.0);
                    ui.label(RichText::new("Tên hiển thị").color(TEXT_SECONDARY).small());
                    ui.add(
                        egui::TextEdit::singleline(&mut form.display_name)
                            .desired_width(f32::INFINITY),
                    );
                }

                ui.add_space(12.0);

                let label = if form.registering { "Đăng ký" } else { "Đăng nhập" };
                let ready = !form.pending
                    && !form.email.trim().is_empty()
                    && !form.password.is_empty()
                    && (!form.registering || !form.display_name.trim().is_empty());

                let submit = ui.add_enabled(
                    ready,
                    egui::Button::new(RichText::new(label).color(TEXT_PRIMARY).strong())
                        .fill(if ready { ACCENT } else { BG_SURFACE })
                        .corner_radius(PANEL_ROUNDING)
                        .min_size(Vec2::new(288.0, 32.0)),
                );

                if submit.clicked() {
                    form.error = None;
                    action = Some(if form.registering {
                        AuthAction::Register {
                            email: form.email.trim().to_string(),
                            password: form.password.clone(),
                            display_name: form.display_name.trim().to_string(),
                        }
                    } else {
                        AuthAction::Login {
                            email: form.email.trim().to_string(),
                            password: form.password.clone(),
                        }
                    });
                }

                if let Some(ref err) = form.error {
                    ui.add_space(6.0);
                    ui.label(RichText::new(err).color(ERROR).small());
                }

                ui.add_space(8.0);
                let toggle = if form.registering {
                    "Đã có tài khoản? Đăng nhập"
                } else {
                    "Chưa có tài khoản? Đăng ký"
                };
                if ui.link(RichText::new(toggle).color(TEXT_SECONDARY).small()).clicked() {
                    form.registering = !form.registering;
                    form.error = None;
                }
            });
    });

    action
}
