//! UI theme constants

use egui::{Color32, CornerRadius, Stroke, Vec2};

pub const BG_PRIMARY: Color32 = Color32::from_rgb(26, 22, 18);
pub const BG_SECONDARY: Color32 = Color32::from_rgb(41, 35, 28);
pub const BG_SURFACE: Color32 = Color32::from_rgb(55, 47, 38);
pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(235, 228, 216);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(168, 158, 143);
pub const ACCENT: Color32 = Color32::from_rgb(209, 122, 34);
pub const SUCCESS: Color32 = Color32::from_rgb(121, 173, 84);
pub const ERROR: Color32 = Color32::from_rgb(217, 83, 66);
pub const WARNING: Color32 = Color32::from_rgb(222, 170, 52);
pub const CITATION_BG: Color32 = Color32::from_rgb(33, 29, 24);
pub const CITATION_SOURCE: Color32 = Color32::from_rgb(186, 156, 98);

pub const PANEL_ROUNDING: CornerRadius = CornerRadius::same(6);
pub const PANEL_PADDING: Vec2 = Vec2::new(12.0, 8.0);

/// Apply the dark theme to an egui context
pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    style.visuals.dark_mode = true;
    style.visuals.panel_fill = BG_PRIMARY;
    style.visuals.window_fill = BG_SECONDARY;
    style.visuals.extreme_bg_color = CITATION_BG;

    style.visuals.widgets.inactive.bg_fill = BG_SURFACE;
    style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, TEXT_SECONDARY);
    style.visuals.widgets.hovered.bg_fill = BG_SURFACE;
    style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    style.visuals.widgets.active.bg_fill = ACCENT;
    style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);

    style.visuals.selection.bg_fill = ACCENT.linear_multiply(0.4);
    style.visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    style.spacing.item_spacing = Vec2::new(8.0, 6.0);

    ctx.set_style(style);
}
