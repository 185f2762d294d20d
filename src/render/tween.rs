use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// Quadratic deceleration.
    Power1Out,
    /// Exponential deceleration; most of the distance is covered early.
    ExpoOut,
}

impl Easing {
    /// Maps elapsed fraction `t` in [0, 1] to progress in [0, 1].
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 1.0 };
        match self {
            Easing::Linear => t,
            Easing::Power1Out => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::ExpoOut => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f32.powf(-10.0 * t)
                }
            }
        }
    }
}

pub trait Lerp: Copy {
    fn lerp_to(self, other: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Vec3 {
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self.lerp(other, t)
    }
}

impl Lerp for [f32; 3] {
    fn lerp_to(self, other: Self, t: f32) -> Self {
        [
            self[0].lerp_to(other[0], t),
            self[1].lerp_to(other[1], t),
            self[2].lerp_to(other[2], t),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenState<T> {
    Active(T),
    /// Final frame; carries exactly the end value.
    Done(T),
}

/// Frame-stepped interpolation from one value to another.
#[derive(Debug, Clone)]
pub struct Tween<T: Lerp> {
    from: T,
    to: T,
    duration: f32,
    elapsed: f32,
    easing: Easing,
}

impl<T: Lerp> Tween<T> {
    pub fn new(from: T, to: T, duration: f32, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            elapsed: 0.0,
            easing,
        }
    }

    pub fn advance(&mut self, dt: f32) -> TweenState<T> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed += dt;
        if self.duration <= 0.0 || self.elapsed >= self.duration {
            return TweenState::Done(self.to);
        }
        let progress = self.easing.apply(self.elapsed / self.duration);
        TweenState::Active(self.from.lerp_to(self.to, progress))
    }
}

#[cfg(test)]
mod tests {
    use super::{Easing, Tween, TweenState};
    use glam::Vec3;

    #[test]
    fn test_easing_endpoints_are_exact() {
        for easing in [Easing::Linear, Easing::Power1Out, Easing::ExpoOut] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
            assert_eq!(easing.apply(2.0), 1.0);
        }
    }

    #[test]
    fn test_ease_out_starts_fast() {
        let early = Easing::ExpoOut.apply(0.1);
        assert!(early > 0.4, "expo out at 10% should exceed 40%, got {early}");
        assert!(Easing::Power1Out.apply(0.5) > 0.5);
        let mut last = 0.0;
        for step in 1..=20 {
            let value = Easing::ExpoOut.apply(step as f32 / 20.0);
            assert!(value >= last);
            last = value;
        }
    }

    #[test]
    fn test_tween_finishes_exactly_on_target() {
        let mut tween = Tween::new(0.0f32, 10.0, 1.0, Easing::Linear);
        match tween.advance(0.5) {
            TweenState::Active(value) => assert!((value - 5.0).abs() < 1e-4),
            other => panic!("expected active tween, got {other:?}"),
        }
        assert_eq!(tween.advance(0.6), TweenState::Done(10.0));
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let target = Vec3::new(1.0, 2.0, 3.0);
        let mut tween = Tween::new(Vec3::ZERO, target, 0.0, Easing::ExpoOut);
        assert_eq!(tween.advance(0.0), TweenState::Done(target));
    }
}
