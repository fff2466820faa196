//! The Scores tab: read-only high score table across all games.

use eframe::egui;
use egui_extras::{Column, TableBuilder};

use crate::model::HighScore;
use crate::net::{Msg, Remote};
use crate::widgets::Button;

use super::PanelCtx;

#[derive(Default)]
pub struct ScoresPanel {
    pub scores: Remote<Vec<HighScore>>,
}

impl ScoresPanel {
    pub fn ui(&mut self, ui: &mut egui::Ui, ctx: &mut PanelCtx) {
        if self.scores.is_idle() {
            self.load(ctx);
        }

        ui.horizontal(|ui| {
            ui.heading("Topscores");
            if ui.add(Button::new("Vernieuw").small()).clicked() {
                self.load(ctx);
            }
        });
        ui.separator();

        match &self.scores {
            Remote::Idle | Remote::Loading => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.weak("Scores laden...");
                });
            }
            Remote::Failed(error) => {
                ui.colored_label(ui.visuals().error_fg_color, error);
            }
            Remote::Ready(scores) if scores.is_empty() => {
                ui.weak("Nog geen scores behaald.");
            }
            Remote::Ready(scores) => {
                let row_height = ui.text_style_height(&egui::TextStyle::Body) + 8.0;
                TableBuilder::new(ui)
                    .striped(true)
                    .column(Column::auto().at_least(40.0))
                    .column(Column::remainder().at_least(160.0))
                    .column(Column::remainder().at_least(120.0))
                    .column(Column::auto().at_least(80.0))
                    .column(Column::auto().at_least(140.0))
                    .header(row_height, |mut header| {
                        header.col(|ui| {
                            ui.strong("#");
                        });
                        header.col(|ui| {
                            ui.strong("Spel");
                        });
                        header.col(|ui| {
                            ui.strong("Speler");
                        });
                        header.col(|ui| {
                            ui.strong("Score");
                        });
                        header.col(|ui| {
                            ui.strong("Behaald op");
                        });
                    })
                    .body(|mut body| {
                        for (i, score) in scores.iter().enumerate() {
                            body.row(row_height, |mut row| {
                                row.col(|ui| {
                                    ui.label(format!("{}", i + 1));
                                });
                                row.col(|ui| {
                                    ui.label(&score.game_name);
                                });
                                row.col(|ui| {
                                    ui.label(&score.player_name);
                                });
                                row.col(|ui| {
                                    ui.label(format!("{}", score.score));
                                });
                                row.col(|ui| {
                                    ui.label(score.achieved_at.as_deref().unwrap_or("-"));
                                });
                            });
                        }
                    });
            }
        }
    }

    fn load(&mut self, ctx: &mut PanelCtx) {
        self.scores = Remote::Loading;
        ctx.jobs.spawn("scores laden", |api| {
            api.highscores().map(Msg::HighScoresLoaded)
        });
    }
}
