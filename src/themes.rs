use egui::style::{Selection, WidgetVisuals, Widgets};
use egui::{Color32, FontId, Stroke, Style, TextStyle, Visuals};

/// Theme choice persisted in the user's preferences; `System` follows the OS.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemePreference {
    pub fn from_str(raw: &str) -> Self {
        match raw {
            "light" => ThemePreference::Light,
            "dark" => ThemePreference::Dark,
            _ => ThemePreference::System,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::System => "system",
        }
    }

    /// Resolve to a concrete egui theme, asking the OS for `System`.
    pub fn resolve(self) -> egui::ThemePreference {
        match self {
            ThemePreference::Light => egui::ThemePreference::Light,
            ThemePreference::Dark => egui::ThemePreference::Dark,
            ThemePreference::System => match dark_light::detect() {
                Ok(dark_light::Mode::Light) => egui::ThemePreference::Light,
                Ok(dark_light::Mode::Dark) => egui::ThemePreference::Dark,
                Ok(dark_light::Mode::Unspecified) | Err(_) => egui::ThemePreference::Dark,
            },
        }
    }
}

/// Semantic style for the accent `Button` widget.
#[derive(Clone, Debug)]
pub struct StudioButtonStyle {
    pub fill: Color32,
    pub outline: Color32,
    pub accent: Color32,
    pub text: Color32,
    pub shadow: Color32,
    pub shadow_offset: egui::Vec2,
    pub rounding: f32,
}

impl From<&Style> for StudioButtonStyle {
    fn from(style: &Style) -> Self {
        let dark_mode = style.visuals.dark_mode;
        Self {
            fill: if dark_mode { hex("#3a3f44") } else { hex("#f4f1ea") },
            outline: if dark_mode { hex("#73797e") } else { hex("#2b2b2b") },
            accent: style.visuals.selection.stroke.color,
            text: if dark_mode { hex("#e8e6e3") } else { hex("#1d1d1b") },
            shadow: if dark_mode { hex("#1b1d1f") } else { hex("#c9c4b8") },
            shadow_offset: egui::vec2(2.0, 2.0),
            rounding: 2.0,
        }
    }
}

/// Colors for both graph canvases, derived from the active theme.
#[derive(Clone, Debug)]
pub struct GraphPalette {
    pub node_fill: Color32,
    pub node_stroke: Color32,
    pub node_text: Color32,
    pub start_stroke: Color32,
    pub edge: Color32,
    pub edge_label: Color32,
    pub rubber_band: Color32,
    pub options_fill: Color32,
    pub question_fill: Color32,
    pub other_fill: Color32,
    pub highlight: Color32,
}

impl From<&Style> for GraphPalette {
    fn from(style: &Style) -> Self {
        let dark_mode = style.visuals.dark_mode;
        let accent = style.visuals.selection.stroke.color;
        if dark_mode {
            Self {
                node_fill: hex("#30363c"),
                node_stroke: hex("#8a9095"),
                node_text: hex("#e8e6e3"),
                start_stroke: hex("#d98e04"),
                edge: hex("#6c7277"),
                edge_label: hex("#b8bec3"),
                rubber_band: accent,
                options_fill: hex("#2d4a3e"),
                question_fill: hex("#4a3e2d"),
                other_fill: hex("#3c3c4a"),
                highlight: accent,
            }
        } else {
            Self {
                node_fill: hex("#ffffff"),
                node_stroke: hex("#44494d"),
                node_text: hex("#1d1d1b"),
                start_stroke: hex("#c77400"),
                edge: hex("#8a8f93"),
                edge_label: hex("#4a4f53"),
                rubber_band: accent,
                options_fill: hex("#dcefe4"),
                question_fill: hex("#f2e8d5"),
                other_fill: hex("#e4e4f0"),
                highlight: accent,
            }
        }
    }
}

// Simple sRGB linear interpolation for quick palette derivation
pub fn blend(a: Color32, b: Color32, t: f32) -> Color32 {
    let r = (a.r() as f32 * (1.0 - t) + b.r() as f32 * t).round() as u8;
    let g = (a.g() as f32 * (1.0 - t) + b.g() as f32 * t).round() as u8;
    let bch = (a.b() as f32 * (1.0 - t) + b.b() as f32 * t).round() as u8;
    Color32::from_rgb(r, g, bch)
}

fn hex(code: &str) -> Color32 {
    Color32::from_hex(code).unwrap_or(Color32::from_rgb(0, 0, 0))
}

/// Build visuals from a small token set for a clean, workshop-like feel.
fn studio_visuals(
    foreground: Color32,
    background: Color32,
    surface: Color32,
    accent: Color32,
    mut base_visuals: Visuals,
) -> Visuals {
    let surface_muted = blend(surface, background, 0.2);
    let border = blend(foreground, background, 0.4);
    let weak_text = blend(foreground, background, 0.55);
    let control_radius = 2.0;
    let container_radius = 0.0;

    let control_fill = background;
    let control_fill_hover = blend(background, foreground, 0.05);
    let control_fill_active = blend(control_fill_hover, foreground, 0.12);
    let selection_fill = blend(background, foreground, 0.12);

    base_visuals.window_fill = background;
    base_visuals.panel_fill = background;
    base_visuals.override_text_color = None;
    base_visuals.weak_text_alpha = 1.0;
    base_visuals.weak_text_color = Some(weak_text);
    base_visuals.faint_bg_color = surface_muted;
    base_visuals.extreme_bg_color = control_fill_hover;
    base_visuals.selection = Selection {
        bg_fill: selection_fill,
        stroke: Stroke::new(1.5, accent),
    };
    base_visuals.hyperlink_color = accent;
    base_visuals.window_stroke = Stroke::new(1.0, border);
    base_visuals.menu_corner_radius = 0.0.into();

    let border_stroke = Stroke::new(1.0, border);
    let hover_stroke = Stroke::new(1.4, border);
    let active_stroke = Stroke::new(1.4, accent);

    base_visuals.widgets = Widgets {
        noninteractive: WidgetVisuals {
            bg_fill: surface,
            weak_bg_fill: surface,
            bg_stroke: border_stroke,
            fg_stroke: Stroke::new(1.0, foreground),
            corner_radius: container_radius.into(),
            expansion: 0.0,
        },
        inactive: WidgetVisuals {
            bg_fill: control_fill,
            weak_bg_fill: control_fill,
            bg_stroke: border_stroke,
            fg_stroke: Stroke::new(1.0, foreground),
            corner_radius: control_radius.into(),
            expansion: 0.0,
        },
        hovered: WidgetVisuals {
            bg_fill: control_fill_hover,
            weak_bg_fill: control_fill_hover,
            bg_stroke: hover_stroke,
            fg_stroke: Stroke::new(1.0, foreground),
            corner_radius: control_radius.into(),
            expansion: 0.0,
        },
        active: WidgetVisuals {
            bg_fill: control_fill_active,
            weak_bg_fill: control_fill_active,
            bg_stroke: active_stroke,
            fg_stroke: Stroke::new(1.0, foreground),
            corner_radius: control_radius.into(),
            expansion: 0.0,
        },
        open: WidgetVisuals {
            bg_fill: control_fill_hover,
            weak_bg_fill: control_fill_hover,
            bg_stroke: active_stroke,
            fg_stroke: Stroke::new(1.0, foreground),
            corner_radius: control_radius.into(),
            expansion: 0.0,
        },
    };

    base_visuals.window_shadow = egui::epaint::Shadow::NONE;
    base_visuals.popup_shadow = egui::epaint::Shadow {
        offset: [4, 4],
        blur: 0,
        spread: 0,
        color: blend(foreground, background, 0.8),
    };

    base_visuals
}

pub fn studio_light() -> Style {
    let mut style = Style {
        text_styles: studio_text_styles().into_iter().collect(),
        ..Default::default()
    };

    let foreground = hex("#1d1d1b");
    let background = hex("#eceae4");
    let surface = hex("#eceae4");
    let accent = hex("#c24f00");

    style.visuals = studio_visuals(foreground, background, surface, accent, Visuals::light());
    apply_spacing(&mut style);
    style
}

pub fn studio_dark() -> Style {
    let mut style = Style {
        text_styles: studio_text_styles().into_iter().collect(),
        ..Default::default()
    };

    let foreground = hex("#e8e6e3");
    let background = hex("#24272a");
    let surface = hex("#2b2f33");
    let accent = hex("#e86f1a");

    style.visuals = studio_visuals(foreground, background, surface, accent, Visuals::dark());
    apply_spacing(&mut style);
    style
}

fn apply_spacing(style: &mut Style) {
    style.spacing.item_spacing = egui::vec2(10.0, 8.0);
    style.spacing.button_padding = egui::vec2(10.0, 6.0);
    style.spacing.indent = 18.0;
    style.spacing.interact_size = egui::vec2(34.0, 26.0);
    style.animation_time = 0.12;
}

fn studio_text_styles() -> Vec<(TextStyle, FontId)> {
    use egui::FontFamily::{Monospace, Proportional};
    vec![
        (TextStyle::Heading, FontId::new(24.0, Proportional)),
        (TextStyle::Body, FontId::new(15.0, Proportional)),
        (TextStyle::Monospace, FontId::new(13.0, Monospace)),
        (TextStyle::Button, FontId::new(15.0, Proportional)),
        (TextStyle::Small, FontId::new(11.0, Proportional)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("light", ThemePreference::Light)]
    #[case("dark", ThemePreference::Dark)]
    #[case("system", ThemePreference::System)]
    #[case("onzin", ThemePreference::System)]
    fn preferences_parse_with_system_fallback(#[case] raw: &str, #[case] expected: ThemePreference) {
        assert_eq!(ThemePreference::from_str(raw), expected);
        if raw != "onzin" {
            assert_eq!(expected.as_str(), raw);
        }
    }

    #[test]
    fn blend_interpolates_channels() {
        let mid = blend(Color32::from_rgb(0, 0, 0), Color32::from_rgb(255, 255, 255), 0.5);
        assert_eq!(mid, Color32::from_rgb(128, 128, 128));
    }

    #[test]
    fn light_and_dark_styles_disagree_on_dark_mode() {
        assert!(!studio_light().visuals.dark_mode);
        assert!(studio_dark().visuals.dark_mode);
    }
}
