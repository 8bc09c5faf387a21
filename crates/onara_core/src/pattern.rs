//! # Burst Planner
//!
//! Pure trajectory math: given a tap, the settings snapshot and the firing
//! spawn points, compute every particle of the burst together with the
//! delay at which it must appear. Nothing here touches a clock.
//!
//! ## Patterns
//!
//! For spawn point `s`, particle `i` of `n = min(count, 15)` and `U` uniform
//! in `[0, 1)`:
//!
//! ```text
//! normal     target = tap + (60U - 30, 60U - 30)            delay 20i
//! explosion  θ = 2πU,               d = 100 + 200U           delay 30i
//! spiral     θ = atan2(tap - s) + 2πi/n, d = 50 + 15i        delay 80i
//! fountain   θ = -π/2 + (U - ½)π/2, d = 150 + 200U           delay 60i
//! ring       θ = 2πi/n,             d = 100                  delay 0
//! bubble     θ = -π/2 + (U - ½)π/4, d = 100 + 150U           delay 50i
//! cloud      3 or 5 layers of rings, layer delay 120ms
//! ```

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, FRAC_PI_6, TAU};
use std::time::Duration;

use rand::Rng;

use crate::color::{Color, ColorSettings};
use crate::error::CoreResult;
use crate::geometry::Point;
use crate::particle::{ParticleKind, ParticleSpec};
use crate::settings::{EffectOptions, EffectSettings, Pattern};
use crate::spawn::{SpawnPoint, SpawnPointId};

/// Fixed ring radius.
pub const RING_RADIUS: f32 = 100.0;
/// Jitter half-width around the tap for the normal pattern.
pub const NORMAL_JITTER: f32 = 30.0;
/// Opacity of standard particles.
pub const STANDARD_OPACITY: f32 = 0.7;
/// Lifetime of pop puffs.
pub const POP_PUFF_LIFETIME: Duration = Duration::from_millis(800);
/// Opacity of pop puffs.
pub const POP_PUFF_OPACITY: f32 = 0.6;

/// Input to [`plan_burst`].
#[derive(Clone, Copy, Debug)]
pub struct BurstRequest<'a> {
    /// Interaction position.
    pub tap: Point,
    /// Settings snapshot.
    pub settings: &'a EffectSettings,
    /// Color snapshot.
    pub colors: &'a ColorSettings,
    /// The spawn points chosen to fire.
    pub points: &'a [SpawnPoint],
    /// How many times the whole burst repeats (at least 1).
    pub repeats: u32,
}

/// One particle of a plan.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedParticle {
    /// Delay from the start of the burst.
    pub delay: Duration,
    /// The particle to create.
    pub spec: ParticleSpec,
    /// For popping bubbles: time after creation at which it pops.
    pub pop_after: Option<Duration>,
}

/// Every particle of one burst, in generation order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BurstPlan {
    /// Planned particles.
    pub particles: Vec<PlannedParticle>,
}

impl BurstPlan {
    /// Total planned particles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// True if nothing was planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Number of particles planned from one spawn point.
    #[must_use]
    pub fn count_from(&self, id: SpawnPointId) -> usize {
        self.particles
            .iter()
            .filter(|p| p.spec.spawn_point == Some(id))
            .count()
    }

    /// Delay of the latest particle.
    #[must_use]
    pub fn last_delay(&self) -> Duration {
        self.particles
            .iter()
            .map(|p| p.delay)
            .max()
            .unwrap_or(Duration::ZERO)
    }
}

/// Plans a complete burst, including repeats.
///
/// Repeat `r` is offset by `r * burst_interval`.
///
/// # Errors
///
/// Fails if the tap or a spawn point is not finite, or the settings are out
/// of range.
pub fn plan_burst<R: Rng + ?Sized>(request: &BurstRequest<'_>, rng: &mut R) -> CoreResult<BurstPlan> {
    let tap = request.tap.ensure_finite()?;
    request.settings.validate()?;
    for point in request.points {
        point.position().ensure_finite()?;
    }

    let interval = Duration::from_millis(u64::from(request.settings.burst_interval_ms));
    let mut plan = BurstPlan::default();
    for repeat in 0..request.repeats.max(1) {
        let offset = interval * repeat;
        for point in request.points {
            plan.particles.extend(
                plan_point(tap, request.settings, request.colors, point, rng)
                    .into_iter()
                    .map(|mut p| {
                        p.delay += offset;
                        p
                    }),
            );
        }
    }
    Ok(plan)
}

/// Plans the particles one spawn point emits in one burst.
///
/// Always yields exactly `settings.effective_count()` particles. The
/// settings must already be validated; [`plan_burst`] does that.
pub(crate) fn plan_point<R: Rng + ?Sized>(
    tap: Point,
    settings: &EffectSettings,
    colors: &ColorSettings,
    point: &SpawnPoint,
    rng: &mut R,
) -> Vec<PlannedParticle> {
    let n = settings.effective_count();
    let origin = point.position();

    if settings.pattern == Pattern::Cloud {
        return plan_cloud(settings, colors, point, rng);
    }

    let mut out = Vec::with_capacity(n as usize);
    for i in 0..n {
        let (target, kind) = match settings.pattern {
            Pattern::Normal => {
                let dx = rng.gen::<f32>() * 2.0 * NORMAL_JITTER - NORMAL_JITTER;
                let dy = rng.gen::<f32>() * 2.0 * NORMAL_JITTER - NORMAL_JITTER;
                (Point::new(tap.x + dx, tap.y + dy), ParticleKind::Smoke)
            }
            Pattern::Explosion => {
                let angle = rng.gen::<f32>() * TAU;
                let distance = 100.0 + rng.gen::<f32>() * 200.0;
                (origin.polar_offset(angle, distance), ParticleKind::Smoke)
            }
            Pattern::Spiral => {
                let angle = origin.angle_to(tap) + (i as f32 / n as f32) * TAU;
                let distance = 50.0 + i as f32 * 15.0;
                (origin.polar_offset(angle, distance), ParticleKind::Smoke)
            }
            Pattern::Fountain => {
                let angle = -FRAC_PI_2 + (rng.gen::<f32>() - 0.5) * FRAC_PI_2;
                let distance = 150.0 + rng.gen::<f32>() * 200.0;
                (origin.polar_offset(angle, distance), ParticleKind::Smoke)
            }
            // Cloud returned above
            Pattern::Ring | Pattern::Cloud => {
                let angle = (i as f32 / n as f32) * TAU;
                (origin.polar_offset(angle, RING_RADIUS), ParticleKind::Smoke)
            }
            Pattern::Bubble => {
                let angle = -FRAC_PI_2 + (rng.gen::<f32>() - 0.5) * FRAC_PI_4;
                let distance = 100.0 + rng.gen::<f32>() * 150.0;
                let sway = rng.gen::<f32>() * 0.5 + 0.5;
                let target = Point::new(
                    origin.x + angle.cos() * distance * sway,
                    origin.y + angle.sin() * distance,
                );
                (target, ParticleKind::Bubble)
            }
        };

        let pop_after = (kind == ParticleKind::Bubble && settings.options.trail).then(|| {
            settings
                .lifetime()
                .mul_f32(0.3 + rng.gen::<f32>() * 0.4)
        });

        let size = settings.size * (0.8 + rng.gen::<f32>() * 0.4);
        out.push(PlannedParticle {
            delay: settings.stagger(i),
            spec: standard_spec(settings, colors, point, target, size, STANDARD_OPACITY, kind, rng),
            pop_after,
        });
    }
    out
}

/// Layered cloud: `n` particles spread over 3 (or 5 with trail) rings.
fn plan_cloud<R: Rng + ?Sized>(
    settings: &EffectSettings,
    colors: &ColorSettings,
    point: &SpawnPoint,
    rng: &mut R,
) -> Vec<PlannedParticle> {
    let n = settings.effective_count();
    let layers: u32 = if settings.options.trail { 5 } else { 3 };
    let origin = point.position();
    let opacity = if settings.options.fade { 0.9 } else { 0.6 };
    let blur = if settings.options.pulsate { 10.0 } else { 5.0 };

    let mut out = Vec::with_capacity(n as usize);
    for layer in 0..layers {
        let in_layer = n / layers + u32::from(layer < n % layers);
        if in_layer == 0 {
            continue;
        }
        let delay = Duration::from_millis(Pattern::CLOUD_LAYER_DELAY_MS * u64::from(layer));
        let size_factor = 0.7 + (layer as f32 / layers as f32) * 0.6;
        let distance = settings.size * (0.5 + layer as f32 * 0.5);
        let rise = if settings.options.gravity {
            -50.0 - layer as f32 * 20.0
        } else {
            0.0
        };

        for j in 0..in_layer {
            let angle = (j as f32 / in_layer as f32) * TAU;
            let mut target = origin.polar_offset(angle, distance);
            target.y += rise;
            let size = settings.size * size_factor * (0.7 + rng.gen::<f32>() * 0.6);
            out.push(PlannedParticle {
                delay,
                spec: standard_spec(
                    settings,
                    colors,
                    point,
                    target,
                    size,
                    opacity,
                    ParticleKind::Cloud { blur },
                    rng,
                ),
                pop_after: None,
            });
        }
    }
    out
}

#[allow(clippy::too_many_arguments)]
fn standard_spec<R: Rng + ?Sized>(
    settings: &EffectSettings,
    colors: &ColorSettings,
    point: &SpawnPoint,
    target: Point,
    size: f32,
    opacity: f32,
    kind: ParticleKind,
    rng: &mut R,
) -> ParticleSpec {
    let lifetime = settings.lifetime();
    ParticleSpec {
        origin: point.position(),
        target,
        size,
        opacity,
        lifetime,
        transition: lifetime.div_f32(settings.speed).min(lifetime),
        kind,
        start_color: point.color.clone(),
        end_color: colors.end_color(&point.color, rng),
        options: settings.options,
        spawn_point: Some(point.id),
    }
}

/// Plans the 1-2 puffs released where a bubble popped.
pub fn plan_pop_puffs<R: Rng + ?Sized>(
    at: Point,
    options: EffectOptions,
    rng: &mut R,
) -> Vec<ParticleSpec> {
    let count = 1 + rng.gen_range(0..2);
    (0..count)
        .map(|_| {
            let angle = -FRAC_PI_2 + (rng.gen::<f32>() - 0.5) * FRAC_PI_6;
            let distance = 20.0 + rng.gen::<f32>() * 30.0;
            ParticleSpec {
                origin: at,
                target: at.polar_offset(angle, distance),
                size: 20.0 + rng.gen::<f32>() * 20.0,
                opacity: POP_PUFF_OPACITY,
                lifetime: POP_PUFF_LIFETIME,
                transition: POP_PUFF_LIFETIME,
                kind: ParticleKind::PopPuff,
                start_color: Color::pop_yellow(),
                end_color: Color::pop_yellow(),
                options,
                spawn_point: None,
            }
        })
        .collect()
}
