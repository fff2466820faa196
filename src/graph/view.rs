//! Canvas camera shared by both graph views: scroll-wheel zoom around the
//! cursor, drag panning, and animated transitions for "reset view" and
//! zoom-to-fit after a sort.

use eframe::egui::{pos2, vec2, Pos2, Rect, Vec2};

pub const FIT_PADDING: f32 = 80.0;
pub const FIT_MAX_ZOOM: f32 = 1.5;
pub const TRANSITION_SECONDS: f32 = 0.75;

const ZOOM_RANGE: (f32, f32) = (0.1, 4.0);

struct Transition {
    from: (f32, Vec2),
    to: (f32, Vec2),
    start: f64,
}

pub struct Camera {
    pub zoom: f32,
    /// Screen-space translation, relative to the viewport centre.
    pub pan: Vec2,
    transition: Option<Transition>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            transition: None,
        }
    }
}

impl Camera {
    pub fn to_screen(&self, world: Pos2, viewport: Rect) -> Pos2 {
        viewport.center() + world.to_vec2() * self.zoom + self.pan
    }

    pub fn to_world(&self, screen: Pos2, viewport: Rect) -> Pos2 {
        ((screen - viewport.center() - self.pan) / self.zoom).to_pos2()
    }

    /// Zoom by `factor`, keeping the world point under `anchor` fixed.
    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32, viewport: Rect) {
        self.transition = None;
        let world = self.to_world(anchor, viewport);
        self.zoom = (self.zoom * factor).clamp(ZOOM_RANGE.0, ZOOM_RANGE.1);
        self.pan = anchor - viewport.center() - world.to_vec2() * self.zoom;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.transition = None;
        self.pan += delta;
    }

    pub fn animate_to(&mut self, zoom: f32, pan: Vec2, now: f64) {
        self.transition = Some(Transition {
            from: (self.zoom, self.pan),
            to: (zoom, pan),
            start: now,
        });
    }

    pub fn animate_reset(&mut self, now: f64) {
        self.animate_to(1.0, Vec2::ZERO, now);
    }

    pub fn animate_fit(&mut self, bounds: (f32, f32, f32, f32), viewport: Rect, now: f64) {
        let (zoom, pan) = fit_transform(
            bounds,
            (viewport.width(), viewport.height()),
            FIT_PADDING,
            FIT_MAX_ZOOM,
        );
        self.animate_to(zoom, vec2(pan.0, pan.1), now);
    }

    /// Advance any running transition; returns true while still animating.
    pub fn step(&mut self, now: f64) -> bool {
        let Some(transition) = &self.transition else {
            return false;
        };
        let t = ((now - transition.start) as f32 / TRANSITION_SECONDS).clamp(0.0, 1.0);
        let eased = ease_in_out(t);
        self.zoom = lerp(transition.from.0, transition.to.0, eased);
        self.pan = transition.from.1 + (transition.to.1 - transition.from.1) * eased;
        if t >= 1.0 {
            self.transition = None;
            false
        } else {
            true
        }
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }
}

/// Transform that frames `bounds` inside a viewport with `padding` on every
/// side, zoom capped at `max_zoom`. The pan recentres the bounds' middle on
/// the viewport centre.
pub fn fit_transform(
    bounds: (f32, f32, f32, f32),
    viewport: (f32, f32),
    padding: f32,
    max_zoom: f32,
) -> (f32, (f32, f32)) {
    let (min_x, min_y, max_x, max_y) = bounds;
    let (width, height) = (max_x - min_x, max_y - min_y);
    let avail = (
        (viewport.0 - 2.0 * padding).max(1.0),
        (viewport.1 - 2.0 * padding).max(1.0),
    );
    let mut zoom = max_zoom;
    if width > 0.0 {
        zoom = zoom.min(avail.0 / width);
    }
    if height > 0.0 {
        zoom = zoom.min(avail.1 / height);
    }
    if !zoom.is_finite() || zoom <= 0.0 {
        zoom = 1.0;
    }
    let center = pos2((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
    (zoom, (-center.x * zoom, -center.y * zoom))
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::Rect;
    use rstest::rstest;

    fn viewport() -> Rect {
        Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0))
    }

    #[test]
    fn screen_and_world_transforms_round_trip() {
        let mut camera = Camera::default();
        camera.zoom = 1.7;
        camera.pan = vec2(33.0, -12.0);
        let world = pos2(140.0, -260.0);
        let screen = camera.to_screen(world, viewport());
        let back = camera.to_world(screen, viewport());
        assert!((back.x - world.x).abs() < 0.01);
        assert!((back.y - world.y).abs() < 0.01);
    }

    #[test]
    fn zooming_keeps_the_anchor_point_fixed() {
        let mut camera = Camera::default();
        let anchor = pos2(200.0, 150.0);
        let before = camera.to_world(anchor, viewport());
        camera.zoom_at(anchor, 1.4, viewport());
        let after = camera.to_world(anchor, viewport());
        assert!((before.x - after.x).abs() < 0.01);
        assert!((before.y - after.y).abs() < 0.01);
    }

    #[rstest]
    // Small layouts hit the zoom cap instead of blowing up.
    #[case((0.0, 0.0, 10.0, 10.0), FIT_MAX_ZOOM)]
    // Wide layouts shrink to fit the padded viewport.
    #[case((0.0, 0.0, 1280.0, 100.0), (800.0 - 160.0) / 1280.0)]
    fn fit_zoom_is_capped_and_padded(#[case] bounds: (f32, f32, f32, f32), #[case] expected: f32) {
        let (zoom, _) = fit_transform(bounds, (800.0, 600.0), FIT_PADDING, FIT_MAX_ZOOM);
        assert!((zoom - expected).abs() < 1e-4, "zoom was {zoom}");
    }

    #[test]
    fn fit_centres_the_bounds() {
        let bounds = (100.0, 50.0, 300.0, 250.0);
        let (zoom, pan) = fit_transform(bounds, (800.0, 600.0), FIT_PADDING, FIT_MAX_ZOOM);
        let mut camera = Camera::default();
        camera.zoom = zoom;
        camera.pan = vec2(pan.0, pan.1);
        let centre = camera.to_screen(pos2(200.0, 150.0), viewport());
        assert!((centre.x - 400.0).abs() < 0.01);
        assert!((centre.y - 300.0).abs() < 0.01);
    }

    #[test]
    fn transitions_land_exactly_on_the_target() {
        let mut camera = Camera::default();
        camera.zoom = 0.4;
        camera.pan = vec2(100.0, 100.0);
        camera.animate_reset(10.0);
        assert!(camera.step(10.2));
        assert!(camera.is_animating());
        assert!(!camera.step(11.0));
        assert_eq!(camera.zoom, 1.0);
        assert_eq!(camera.pan, Vec2::ZERO);
    }
}
