//! Conversation sidebar — list, create, delete, sign out.

use egui::{self, RichText, ScrollArea};

use vietsu_types::config::{ADVISOR_AGENT_ID, ADVISOR_HERO_NAME};

use crate::state::UiState;
use crate::theme::*;

pub enum SidebarAction {
    /// Start a conversation with the given persona
    New { agent_id: String, hero_name: String },
    Select(i64),
    Delete(i64),
    Logout,
}

/// Render the sidebar. Returns an action for the caller to dispatch.
pub fn sidebar_panel(ui: &mut egui::Ui, state: &UiState) -> Option<SidebarAction> {
    let mut action = None;

    ui.vertical(|ui| {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.heading(RichText::new("Việt Sử").color(ACCENT).strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .button(RichText::new("Thoát").color(TEXT_SECONDARY).small())
                    .clicked()
                {
                    action = Some(SidebarAction::Logout);
                }
            });
        });

        ui.add_space(8.0);

        let new_enabled = !state.is_busy();
        if ui
            .add_enabled(
                new_enabled,
                egui::Button::new(RichText::new("+ Hỏi cố vấn lịch sử").color(TEXT_PRIMARY))
                    .fill(ACCENT)
                    .corner_radius(PANEL_ROUNDING),
            )
            .clicked()
        {
            action = Some(SidebarAction::New {
                agent_id: ADVISOR_AGENT_ID.to_string(),
                hero_name: ADVISOR_HERO_NAME.to_string(),
            });
        }

        ui.add_space(8.0);
        ui.separator();

        ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            for conv in &state.conversations {
                let selected = state.selected_conversation == Some(conv.id);
                let bg = if selected { BG_SURFACE } else { BG_PRIMARY };

                egui::Frame::default()
                    .fill(bg)
                    .corner_radius(PANEL_ROUNDING)
                    .inner_margin(6.0)
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            let label = ui.add(
                                egui::Label::new(
                                    RichText::new(&conv.hero_name)
                                        .color(if selected { ACCENT } else { TEXT_PRIMARY }),
                                )
                                .sense(egui::Sense::click())
                                .truncate(),
                            );
                            if label.clicked() && !state.is_busy() {
                                action = Some(SidebarAction::Select(conv.id));
                            }

                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    if ui
                                        .button(RichText::new("×").color(TEXT_SECONDARY))
                                        .clicked()
                                        && !state.is_busy()
                                    {
                                        action = Some(SidebarAction::Delete(conv.id));
                                    }
                                },
                            );
                        });
                        if let Some(date) = conv.last_message_date() {
                            ui.label(
                                RichText::new(date.format("%d/%m/%Y %H:%M").to_string())
                                    .color(TEXT_SECONDARY)
                                    .small(),
                            );
                        }
                    });
                ui.add_space(2.0);
            }

            if state.conversations.is_empty() {
                ui.add_space(12.0);
                ui.label(
                    RichText::new("Chưa có cuộc trò chuyện nào")
                        .color(TEXT_SECONDARY)
                        .small()
                        .italics(),
                );
            }
        });
    });

    action
}
