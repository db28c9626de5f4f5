//! Citation panel — sources and graph links for the latest answer.
//!
//! Stays empty while an answer streams; the runtime only publishes the
//! batch shortly after the answer freezes.

use egui::{self, RichText, ScrollArea};

use crate::state::UiState;
use crate::theme::*;

pub fn citations_panel(ui: &mut egui::Ui, state: &UiState) {
    ui.vertical(|ui| {
        ui.add_space(4.0);
        ui.heading(RichText::new("Nguồn tham khảo").color(ACCENT).strong());
        ui.separator();

        if state.citations_loading {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(
                    RichText::new("Đang trích xuất nguồn...")
                        .color(TEXT_SECONDARY)
                        .small(),
                );
            });
            return;
        }

        if !state.has_citations() {
            ui.label(
                RichText::new("Nguồn sẽ hiện sau mỗi câu trả lời")
                    .color(TEXT_SECONDARY)
                    .small()
                    .italics(),
            );
            return;
        }

        ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            for chunk in &state.sources {
                egui::Frame::default()
                    .fill(CITATION_BG)
                    .corner_radius(PANEL_ROUNDING)
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        ui.label(
                            RichText::new(&chunk.source)
                                .color(CITATION_SOURCE)
                                .strong()
                                .small(),
                        );
                        if let Some(ref dynasty) = chunk.dynasty {
                            ui.label(RichText::new(dynasty).color(TEXT_SECONDARY).small());
                        }
                        let text = chunk.excerpt.as_deref().unwrap_or(&chunk.text);
                        ui.label(RichText::new(text).color(TEXT_PRIMARY).small());
                        if let Some(score) = chunk.score {
                            ui.label(
                                RichText::new(format!("Độ liên quan: {:.0}%", score * 100.0))
                                    .color(TEXT_SECONDARY)
                                    .small(),
                            );
                        }
                    });
                ui.add_space(4.0);
            }

            if !state.graph_links.is_empty() {
                ui.add_space(4.0);
                ui.label(RichText::new("Liên kết tri thức").color(ACCENT).strong().small());
                for link in &state.graph_links {
                    ui.label(
                        RichText::new(format!("• {}: {}", link.relation, link.description))
                            .color(TEXT_SECONDARY)
                            .small(),
                    );
                }
            }
        });
    });
}
