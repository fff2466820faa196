//! Force-directed layout, following the d3-force model: a cooling `alpha`
//! drives link, charge, centering and collision forces each tick, and nodes
//! with a fixed position (`fx`/`fy`) are pinned in place.

pub const NODE_WIDTH: f32 = 80.0;
pub const NODE_HEIGHT: f32 = 40.0;

/// Per-node simulation state; indexed in step with the owning graph's nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Pin: while set, the particle stays exactly here.
    pub fx: Option<f32>,
    pub fy: Option<f32>,
}

impl Particle {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    pub fn pinned(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            fx: Some(x),
            fy: Some(y),
            ..Default::default()
        }
    }

    pub fn pin(&mut self) {
        self.fx = Some(self.x);
        self.fy = Some(self.y);
    }

    pub fn unpin(&mut self) {
        self.fx = None;
        self.fy = None;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimLink {
    pub source: usize,
    pub target: usize,
}

pub struct ForceSim {
    pub alpha: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub alpha_target: f32,
    pub velocity_decay: f32,
    pub center: (f32, f32),
    pub link_distance: f32,
    pub link_strength: f32,
    pub charge: f32,
    pub collide_radius: f32,
}

impl Default for ForceSim {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            alpha_min: 0.001,
            // 1 - 0.001^(1/300): reaches alpha_min in ~300 ticks.
            alpha_decay: 0.0228,
            alpha_target: 0.0,
            velocity_decay: 0.6,
            center: (0.0, 0.0),
            link_distance: 150.0,
            link_strength: 0.5,
            charge: -400.0,
            collide_radius: NODE_WIDTH / 2.0 + 20.0,
        }
    }
}

impl ForceSim {
    /// Whether another tick would still visibly move things.
    pub fn active(&self) -> bool {
        self.alpha >= self.alpha_min || self.alpha_target > 0.0
    }

    /// Full restart, used after a structural change.
    pub fn restart(&mut self) {
        self.alpha = 1.0;
    }

    /// Keep the simulation warm (dragging) or let it cool (release).
    pub fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target;
        if target > self.alpha {
            self.alpha = self.alpha.max(target);
        }
    }

    pub fn tick(&mut self, particles: &mut [Particle], links: &[SimLink]) {
        if particles.is_empty() {
            return;
        }
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        let alpha = self.alpha;

        self.apply_links(particles, links, alpha);
        self.apply_charge(particles, alpha);
        self.apply_center(particles);
        self.apply_collisions(particles);

        for p in particles.iter_mut() {
            p.vx *= self.velocity_decay;
            p.vy *= self.velocity_decay;
            match p.fx {
                Some(fx) => {
                    p.x = fx;
                    p.vx = 0.0;
                }
                None => p.x += p.vx,
            }
            match p.fy {
                Some(fy) => {
                    p.y = fy;
                    p.vy = 0.0;
                }
                None => p.y += p.vy,
            }
        }
    }

    fn apply_links(&self, particles: &mut [Particle], links: &[SimLink], alpha: f32) {
        for link in links {
            if link.source >= particles.len() || link.target >= particles.len() {
                continue;
            }
            let (s, t) = (particles[link.source], particles[link.target]);
            let mut dx = t.x + t.vx - s.x - s.vx;
            let mut dy = t.y + t.vy - s.y - s.vy;
            if dx == 0.0 && dy == 0.0 {
                let (jx, jy) = jiggle(link.source + link.target);
                dx = jx;
                dy = jy;
            }
            let dist = (dx * dx + dy * dy).sqrt();
            let l = (dist - self.link_distance) / dist * alpha * self.link_strength;
            let (lx, ly) = (dx * l, dy * l);
            particles[link.target].vx -= lx * 0.5;
            particles[link.target].vy -= ly * 0.5;
            particles[link.source].vx += lx * 0.5;
            particles[link.source].vy += ly * 0.5;
        }
    }

    fn apply_charge(&self, particles: &mut [Particle], alpha: f32) {
        // Pairwise; node counts here are small enough that O(n^2) is fine.
        for i in 0..particles.len() {
            for j in (i + 1)..particles.len() {
                let (a, b) = (particles[i], particles[j]);
                let mut dx = b.x - a.x;
                let mut dy = b.y - a.y;
                if dx == 0.0 && dy == 0.0 {
                    let (jx, jy) = jiggle(i * 31 + j);
                    dx = jx;
                    dy = jy;
                }
                let d2 = (dx * dx + dy * dy).max(1.0);
                let w = self.charge * alpha / d2;
                particles[j].vx += dx * w;
                particles[j].vy += dy * w;
                particles[i].vx -= dx * w;
                particles[i].vy -= dy * w;
            }
        }
    }

    fn apply_center(&self, particles: &mut [Particle]) {
        let n = particles.len() as f32;
        let cx = particles.iter().map(|p| p.x).sum::<f32>() / n;
        let cy = particles.iter().map(|p| p.y).sum::<f32>() / n;
        let (sx, sy) = (cx - self.center.0, cy - self.center.1);
        for p in particles.iter_mut() {
            if p.fx.is_none() {
                p.x -= sx;
            }
            if p.fy.is_none() {
                p.y -= sy;
            }
        }
    }

    fn apply_collisions(&self, particles: &mut [Particle]) {
        let min_dist = self.collide_radius * 2.0;
        for i in 0..particles.len() {
            for j in (i + 1)..particles.len() {
                let (a, b) = (particles[i], particles[j]);
                let mut dx = b.x + b.vx - a.x - a.vx;
                let mut dy = b.y + b.vy - a.y - a.vy;
                if dx == 0.0 && dy == 0.0 {
                    let (jx, jy) = jiggle(i * 17 + j);
                    dx = jx;
                    dy = jy;
                }
                let dist = (dx * dx + dy * dy).sqrt();
                if dist >= min_dist {
                    continue;
                }
                let push = (min_dist - dist) / dist * 0.5;
                let (px, py) = (dx * push, dy * push);
                particles[j].vx += px;
                particles[j].vy += py;
                particles[i].vx -= px;
                particles[i].vy -= py;
            }
        }
    }
}

/// Deterministic sub-pixel offset to separate coincident points.
fn jiggle(seed: usize) -> (f32, f32) {
    let angle = (seed as f32 * 0.618_034) % 1.0 * std::f32::consts::TAU;
    (angle.cos() * 1e-6, angle.sin() * 1e-6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_particles_do_not_move() {
        let mut sim = ForceSim::default();
        let mut particles = vec![Particle::pinned(10.0, 20.0), Particle::at(12.0, 22.0)];
        for _ in 0..50 {
            sim.tick(&mut particles, &[]);
        }
        assert_eq!(particles[0].x, 10.0);
        assert_eq!(particles[0].y, 20.0);
    }

    #[test]
    fn charge_pushes_free_particles_apart() {
        let mut sim = ForceSim::default();
        let mut particles = vec![Particle::at(-1.0, 0.0), Particle::at(1.0, 0.0)];
        for _ in 0..100 {
            sim.tick(&mut particles, &[]);
        }
        let dist = (particles[1].x - particles[0].x).abs();
        assert!(dist > 50.0, "expected repulsion, distance was {dist}");
    }

    #[test]
    fn links_pull_distant_particles_towards_link_distance() {
        let mut sim = ForceSim::default();
        let mut particles = vec![Particle::at(-400.0, 0.0), Particle::at(400.0, 0.0)];
        let links = [SimLink {
            source: 0,
            target: 1,
        }];
        for _ in 0..300 {
            sim.tick(&mut particles, &links);
        }
        let dx = particles[1].x - particles[0].x;
        let dy = particles[1].y - particles[0].y;
        let dist = (dx * dx + dy * dy).sqrt();
        assert!(
            (dist - sim.link_distance).abs() < sim.link_distance,
            "distance {dist} did not approach {}",
            sim.link_distance
        );
    }

    #[test]
    fn alpha_cools_below_threshold_without_a_target() {
        let mut sim = ForceSim::default();
        let mut particles = vec![Particle::at(0.0, 0.0)];
        for _ in 0..400 {
            sim.tick(&mut particles, &[]);
        }
        assert!(!sim.active());
        sim.set_alpha_target(0.3);
        assert!(sim.active());
    }
}
