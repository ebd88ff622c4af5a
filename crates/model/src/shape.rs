use glam::Vec3;
use orbitview_kernel::SeedSequence;

const TERMS: usize = 4;
const MAX_AMPLITUDE: f32 = 0.12;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Harmonic {
    amplitude: f32,
    polar: f32,
    azimuthal: f32,
    polar_phase: f32,
    azimuthal_phase: f32,
}

/// Star-shaped surface `r(θ, φ) = 1 + Σ a·sin(l·θ + p)·cos(m·φ + q)`.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicShape {
    terms: Vec<Harmonic>,
}

impl HarmonicShape {
    pub fn sphere() -> Self {
        Self { terms: Vec::new() }
    }

    pub fn from_seed(seed: u64) -> Self {
        let mut rng = SeedSequence::new(seed);
        let terms = (0..TERMS)
            .map(|_| Harmonic {
                amplitude: unit(&mut rng) * MAX_AMPLITUDE,
                polar: (1 + rng.next_u64() % 5) as f32,
                azimuthal: (rng.next_u64() % 6) as f32,
                polar_phase: unit(&mut rng) * std::f32::consts::TAU,
                azimuthal_phase: unit(&mut rng) * std::f32::consts::TAU,
            })
            .collect();
        Self { terms }
    }

    /// Radius at polar angle `theta` (from +Y) and azimuth `phi`.
    pub fn radius_at(&self, theta: f32, phi: f32) -> f32 {
        1.0 + self
            .terms
            .iter()
            .map(|h| {
                // Azimuthal terms vanish at the poles.
                let taper = if h.azimuthal > 0.0 { theta.sin() } else { 1.0 };
                h.amplitude
                    * taper
                    * (h.polar * theta + h.polar_phase).sin()
                    * (h.azimuthal * phi + h.azimuthal_phase).cos()
            })
            .sum::<f32>()
    }

    /// Radius along `dir`; a zero direction is treated as +Y.
    pub fn radius(&self, dir: Vec3) -> f32 {
        let (theta, phi) = angles(dir);
        self.radius_at(theta, phi)
    }
}

/// Polar and azimuthal angles of a direction, matching [`direction`].
pub fn angles(dir: Vec3) -> (f32, f32) {
    let len = dir.length();
    if len <= f32::EPSILON || !len.is_finite() {
        return (0.0, 0.0);
    }
    let d = dir / len;
    (d.y.clamp(-1.0, 1.0).acos(), d.z.atan2(d.x))
}

/// Unit vector for polar angle `theta` from +Y and azimuth `phi` from +X toward +Z.
pub fn direction(theta: f32, phi: f32) -> Vec3 {
    Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin())
}

/// Uniform in [0, 1).
pub(crate) fn unit(rng: &mut SeedSequence) -> f32 {
    (rng.next_u64() >> 40) as f32 / (1u64 << 24) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn sphere_is_unit() {
        let s = HarmonicShape::sphere();
        assert_eq!(s.radius(Vec3::new(0.3, -0.2, 0.9)), 1.0);
    }

    #[test]
    fn seeded_shape_is_deterministic_and_bounded() {
        let a = HarmonicShape::from_seed(11);
        assert_eq!(a, HarmonicShape::from_seed(11));
        assert_ne!(a, HarmonicShape::from_seed(12));
        for i in 0..50 {
            let r = a.radius_at(i as f32 * 0.06, i as f32 * 0.13);
            assert!(r > 1.0 - TERMS as f32 * MAX_AMPLITUDE - 1e-6);
            assert!(r < 1.0 + TERMS as f32 * MAX_AMPLITUDE + 1e-6);
        }
    }

    #[test]
    fn angles_invert_direction() {
        let (theta, phi) = (1.1, -2.0);
        let (t, p) = angles(direction(theta, phi));
        assert_abs_diff_eq!(t, theta, epsilon = 1e-5);
        assert_abs_diff_eq!(p, phi, epsilon = 1e-5);
        assert_eq!(angles(Vec3::ZERO), (0.0, 0.0));
    }
}
