//! Lilac palette and the visuals built from it.

use eframe::egui;

pub const ACCENT: egui::Color32 = egui::Color32::from_rgb(107, 33, 168);
pub const ACCENT_SOFT: egui::Color32 = egui::Color32::from_rgb(126, 34, 206);
pub const HEADING: egui::Color32 = egui::Color32::from_rgb(88, 28, 135);
pub const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(216, 180, 254);
pub const CARD: egui::Color32 = egui::Color32::WHITE;
pub const CARD_TINT: egui::Color32 = egui::Color32::from_rgb(243, 232, 255);
pub const DANGER: egui::Color32 = egui::Color32::from_rgb(239, 68, 68);
pub const EXPORT: egui::Color32 = egui::Color32::from_rgb(22, 163, 74);

pub fn lighten_color(c: egui::Color32, t: f32) -> egui::Color32 {
    let t = t.clamp(0.0, 1.0);
    let mix = |channel: u8| -> u8 {
        let channel = channel as f32;
        (channel + (255.0 - channel) * t).round().clamp(0.0, 255.0) as u8
    };
    egui::Color32::from_rgba_unmultiplied(mix(c.r()), mix(c.g()), mix(c.b()), c.a())
}

pub fn lilac_visuals() -> egui::Visuals {
    let mut visuals = egui::Visuals::light();
    visuals.override_text_color = Some(egui::Color32::from_rgb(59, 7, 100));
    visuals.panel_fill = BACKGROUND;
    visuals.window_fill = CARD;
    visuals.extreme_bg_color = CARD_TINT;
    visuals.faint_bg_color = lighten_color(BACKGROUND, 0.6);
    visuals.hyperlink_color = ACCENT;
    visuals.selection.bg_fill = ACCENT_SOFT;
    visuals.widgets.active.bg_fill = ACCENT;
    visuals.widgets.hovered.bg_fill = ACCENT_SOFT.gamma_multiply(0.85);

    let radius = egui::CornerRadius::same(8);
    visuals.widgets.noninteractive.corner_radius = radius;
    visuals.widgets.inactive.corner_radius = radius;
    visuals.widgets.hovered.corner_radius = radius;
    visuals.widgets.active.corner_radius = radius;
    visuals.widgets.open.corner_radius = radius;

    visuals
}
