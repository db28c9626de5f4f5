//! Chat panel — displays the transcript and input field.

use egui::{self, Align, Layout, RichText, ScrollArea, Vec2};

use vietsu_types::message::{Message, Role};

use crate::state::UiState;
use crate::theme::*;

/// Render the chat panel. Returns Some(question) when the user submits.
pub fn chat_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<String> {
    let mut submitted = None;

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                // Header
                ui.horizontal(|ui| {
                    let hero = state
                        .conversations
                        .iter()
                        .find(|c| Some(c.id) == state.selected_conversation)
                        .map(|c| c.hero_name.clone())
                        .unwrap_or_else(|| "Việt Sử".to_string());
                    ui.heading(RichText::new(hero).color(TEXT_PRIMARY).strong());
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let status_color = if state.is_busy() { WARNING } else { SUCCESS };
                        ui.label(
                            RichText::new(&state.status_text)
                                .color(status_color)
                                .small(),
                        );
                    });
                });

                if let Some(ref banner) = state.error_banner {
                    ui.label(RichText::new(banner).color(ERROR).small());
                }

                ui.separator();

                // Messages area
                let available_height = ui.available_height() - 60.0;
                ScrollArea::vertical()
                    .max_height(available_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        if state.selected_conversation.is_none() {
                            ui.add_space(24.0);
                            ui.vertical_centered(|ui| {
                                ui.label(
                                    RichText::new(
                                        "Chọn hoặc tạo một cuộc trò chuyện để bắt đầu",
                                    )
                                    .color(TEXT_SECONDARY)
                                    .italics(),
                                );
                            });
                        }
                        for msg in &state.messages {
                            render_message(ui, msg);
                            ui.add_space(4.0);
                        }
                    });

                ui.add_space(8.0);

                // Input area
                ui.horizontal(|ui| {
                    let input = egui::TextEdit::singleline(&mut state.input_text)
                        .hint_text("Hỏi về lịch sử Việt Nam...")
                        .desired_width(ui.available_width() - 70.0)
                        .font(egui::FontId::proportional(14.0));

                    let response = ui.add(input);

                    let can_send = !state.input_text.trim().is_empty()
                        && !state.is_busy()
                        && state.selected_conversation.is_some();
                    let send_btn = ui.add_enabled(
                        can_send,
                        egui::Button::new(RichText::new("Gửi").color(TEXT_PRIMARY))
                            .fill(if can_send { ACCENT } else { BG_SURFACE })
                            .corner_radius(PANEL_ROUNDING)
                            .min_size(Vec2::new(60.0, 0.0)),
                    );

                    // Submit on Enter or button click
                    if (response.lost_focus()
                        && ui.input(|i| i.key_pressed(egui::Key::Enter))
                        && can_send)
                        || send_btn.clicked()
                    {
                        let text = state.input_text.trim().to_string();
                        state.push_user_message(&text);
                        submitted = Some(text);
                        state.input_text.clear();
                        response.request_focus();
                    }
                });
            });
        });

    submitted
}

fn render_message(ui: &mut egui::Ui, msg: &Message) {
    let (label, label_color) = match msg.role {
        Role::User => ("Bạn", ACCENT),
        Role::Assistant => ("Anh hùng", SUCCESS),
    };

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.label(RichText::new(label).color(label_color).strong().small());
            ui.horizontal_wrapped(|ui| {
                ui.label(RichText::new(&msg.content).color(TEXT_PRIMARY));
                if msg.streaming {
                    ui.label(RichText::new("▌").color(ACCENT).strong());
                }
            });
        });
}
