//! Decorative background particles.
//!
//! A [`ParticleSet`] is drawn once per view and then frozen. Regenerating it
//! on unrelated state changes would make the background jump, so the
//! [`ParticleLayer`] memoizes the first draw for the life of the view.

use std::ops::{Deref, Range};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use rand::Rng;
use serde::Serialize;

/// Horizontal/vertical position range, in percent of the container.
pub const POSITION_RANGE: Range<f32> = 0.0..100.0;
/// Particle size range, in px.
pub const SIZE_RANGE: Range<f32> = 1.0..4.0;
/// Animation duration range, in seconds.
pub const DURATION_RANGE: Range<f32> = 2.0..5.0;
/// Animation delay range, in seconds.
pub const DELAY_RANGE: Range<f32> = 0.0..5.0;

/// One decorative particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Particle {
    /// Left offset (%)
    pub x: f32,
    /// Top offset (%)
    pub y: f32,
    /// Diameter (px)
    pub size: f32,
    pub duration: Duration,
    pub delay: Duration,
}

impl Particle {
    /// Draws every parameter independently and uniformly.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self {
            x: rng.random_range(POSITION_RANGE),
            y: rng.random_range(POSITION_RANGE),
            size: rng.random_range(SIZE_RANGE),
            duration: Duration::from_secs_f32(rng.random_range(DURATION_RANGE)),
            delay: Duration::from_secs_f32(rng.random_range(DELAY_RANGE)),
        }
    }
}

/// An immutable, cheaply clonable set of particles.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSet(Arc<[Particle]>);

impl ParticleSet {
    /// Generates `count` particles from the thread-local RNG.
    pub fn generate(count: usize) -> Self {
        Self::generate_with(count, &mut rand::rng())
    }

    /// Generates `count` particles from the given RNG.
    pub fn generate_with<R: Rng>(count: usize, rng: &mut R) -> Self {
        Self((0..count).map(|_| Particle::random(rng)).collect())
    }

    /// True if both sets share the same allocation (same draw).
    pub fn same_draw(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for ParticleSet {
    type Target = [Particle];

    fn deref(&self) -> &[Particle] {
        &self.0
    }
}

/// Per-view memoized particle set.
#[derive(Debug)]
pub struct ParticleLayer {
    count: usize,
    set: OnceLock<ParticleSet>,
}

impl ParticleLayer {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            set: OnceLock::new(),
        }
    }

    /// The view's particles, drawn on first access.
    pub fn particles(&self) -> &ParticleSet {
        self.set.get_or_init(|| {
            tracing::debug!(count = self.count, "Drawing particle set");
            ParticleSet::generate(self.count)
        })
    }

    pub fn is_drawn(&self) -> bool {
        self.set.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let set = ParticleSet::generate_with(500, &mut rng);
        assert_eq!(set.len(), 500);

        for p in set.iter() {
            assert!(POSITION_RANGE.contains(&p.x));
            assert!(POSITION_RANGE.contains(&p.y));
            assert!(SIZE_RANGE.contains(&p.size));
            assert!(p.duration >= Duration::from_secs(2) && p.duration <= Duration::from_secs(5));
            assert!(p.delay <= Duration::from_secs(5));
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = ParticleSet::generate_with(30, &mut StdRng::seed_from_u64(1));
        let b = ParticleSet::generate_with(30, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
        assert!(!a.same_draw(&b));
    }

    #[test]
    fn test_layer_memoizes() {
        let layer = ParticleLayer::new(30);
        assert!(!layer.is_drawn());

        let first = layer.particles().clone();
        let second = layer.particles().clone();
        assert!(first.same_draw(&second));
        assert_eq!(first.len(), 30);
    }

    #[test]
    fn test_separate_views_differ() {
        let a = ParticleLayer::new(30);
        let b = ParticleLayer::new(30);
        assert_ne!(a.particles(), b.particles());
    }
}
