//! Small shared UI pieces: transient flash messages and confirm dialogs.

use eframe::egui::{self, Align2, Color32};

use crate::widgets::Button;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlashKind {
    Info,
    Warning,
    Error,
}

pub struct Flash {
    pub text: String,
    pub kind: FlashKind,
    expires: f64,
}

/// Queue of transient messages shown at the bottom of the window.
#[derive(Default)]
pub struct Flashes {
    entries: Vec<Flash>,
}

impl Flashes {
    const INFO_SECONDS: f64 = 3.0;
    const ERROR_SECONDS: f64 = 5.0;

    pub fn info(&mut self, text: impl Into<String>, now: f64) {
        self.push(text, FlashKind::Info, now + Self::INFO_SECONDS);
    }

    pub fn warn(&mut self, text: impl Into<String>, now: f64) {
        self.push(text, FlashKind::Warning, now + Self::INFO_SECONDS);
    }

    pub fn error(&mut self, text: impl Into<String>, now: f64) {
        self.push(text, FlashKind::Error, now + Self::ERROR_SECONDS);
    }

    fn push(&mut self, text: impl Into<String>, kind: FlashKind, expires: f64) {
        self.entries.push(Flash {
            text: text.into(),
            kind,
            expires,
        });
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        let now = ctx.input(|i| i.time);
        self.entries.retain(|f| f.expires > now);
        if self.entries.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("flash-overlay"))
            .anchor(Align2::CENTER_BOTTOM, egui::vec2(0.0, -24.0))
            .interactable(false)
            .show(ctx, |ui| {
                for flash in &self.entries {
                    let (fill, stroke) = match flash.kind {
                        FlashKind::Info => (ui.visuals().faint_bg_color, ui.visuals().window_stroke.color),
                        FlashKind::Warning => (ui.visuals().warn_fg_color.gamma_multiply(0.2), ui.visuals().warn_fg_color),
                        FlashKind::Error => (ui.visuals().error_fg_color.gamma_multiply(0.2), ui.visuals().error_fg_color),
                    };
                    egui::Frame::window(ui.style())
                        .fill(fill)
                        .stroke(egui::Stroke::new(1.0, stroke))
                        .show(ui, |ui| {
                            ui.label(&flash.text);
                        });
                }
            });
        // Keep repainting so messages disappear without user input.
        ctx.request_repaint_after(std::time::Duration::from_millis(250));
    }

    #[cfg(test)]
    pub fn texts(&self) -> Vec<&str> {
        self.entries.iter().map(|f| f.text.as_str()).collect()
    }
}

/// Outcome of a confirm dialog for the current frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Open,
    Confirmed,
    Cancelled,
}

/// Modal yes/no question; the caller keeps it open until an outcome arrives.
pub fn confirm_modal(
    ctx: &egui::Context,
    id: &str,
    title: &str,
    body: &str,
    confirm_label: &str,
) -> ConfirmOutcome {
    let mut outcome = ConfirmOutcome::Open;
    let response = egui::Modal::new(egui::Id::new(id)).show(ctx, |ui| {
        ui.set_max_width(360.0);
        ui.heading(title);
        ui.label(body);
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui
                .add(Button::new(confirm_label).fill(Color32::from_rgb(176, 58, 46)))
                .clicked()
            {
                outcome = ConfirmOutcome::Confirmed;
            }
            if ui.add(Button::new("Annuleren")).clicked() {
                outcome = ConfirmOutcome::Cancelled;
            }
        });
    });
    if outcome == ConfirmOutcome::Open && response.should_close() {
        outcome = ConfirmOutcome::Cancelled;
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flashes_expire_by_time() {
        let mut flashes = Flashes::default();
        flashes.info("opgeslagen", 0.0);
        flashes.error("mislukt", 0.0);
        flashes.entries.retain(|f| f.expires > 4.0);
        assert_eq!(flashes.texts(), vec!["mislukt"]);
    }
}
