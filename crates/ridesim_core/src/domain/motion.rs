//! Geometry and motion interpolation.
//!
//! A [`MotionPlan`] is an ordered sequence of [`MoveTask`] legs. Drivers
//! interpolate their position against the active leg rather than jumping
//! straight to the destination, so a cancel mid-leg can snap the driver to
//! its true location instead of either endpoint.

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A single straight-line segment traversed over `[start_t, end_t]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveTask {
    pub start: Point,
    pub end: Point,
    pub start_t: f64,
    pub end_t: f64,
}

impl MoveTask {
    /// Fraction of the leg completed at `t`, clamped to `[0, 1]`.
    pub fn frac(&self, t: f64) -> f64 {
        if self.end_t <= self.start_t {
            return 1.0;
        }
        ((t - self.start_t) / (self.end_t - self.start_t)).clamp(0.0, 1.0)
    }

    pub fn pos(&self, t: f64) -> Point {
        let f = self.frac(t);
        Point::new(
            self.start.x + (self.end.x - self.start.x) * f,
            self.start.y + (self.end.y - self.start.y) * f,
        )
    }
}

/// An ordered itinerary of legs a driver is currently executing.
///
/// Most legs are a single [`MoveTask`]; multi-segment plans exist for
/// future routers that checkpoint through waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionPlan {
    pub legs: Vec<MoveTask>,
}

impl MotionPlan {
    pub fn single(task: MoveTask) -> Self {
        MotionPlan { legs: vec![task] }
    }

    pub fn start_t(&self) -> f64 {
        self.legs.first().map(|l| l.start_t).unwrap_or(0.0)
    }

    pub fn end_t(&self) -> f64 {
        self.legs.last().map(|l| l.end_t).unwrap_or(0.0)
    }

    fn current_task_index(&self, t: f64) -> usize {
        self.legs
            .iter()
            .position(|leg| t < leg.end_t)
            .unwrap_or_else(|| self.legs.len().saturating_sub(1))
    }

    /// Interpolated position at `t`, for snapping a driver mid-leg on preemption.
    pub fn pos(&self, t: f64) -> Point {
        let idx = self.current_task_index(t);
        self.legs[idx].pos(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_task_interpolates_linearly() {
        let task = MoveTask {
            start: Point::new(0.0, 0.0),
            end: Point::new(10.0, 0.0),
            start_t: 0.0,
            end_t: 10.0,
        };
        assert_eq!(task.pos(5.0), Point::new(5.0, 0.0));
        assert_eq!(task.frac(-1.0), 0.0);
        assert_eq!(task.frac(100.0), 1.0);
    }

    #[test]
    fn zero_duration_leg_is_immediately_complete() {
        let task = MoveTask {
            start: Point::new(1.0, 1.0),
            end: Point::new(2.0, 2.0),
            start_t: 5.0,
            end_t: 5.0,
        };
        assert_eq!(task.frac(5.0), 1.0);
        assert_eq!(task.pos(5.0), Point::new(2.0, 2.0));
    }

    #[test]
    fn multi_leg_plan_finds_active_segment() {
        let plan = MotionPlan {
            legs: vec![
                MoveTask { start: Point::new(0.0, 0.0), end: Point::new(1.0, 0.0), start_t: 0.0, end_t: 10.0 },
                MoveTask { start: Point::new(1.0, 0.0), end: Point::new(2.0, 0.0), start_t: 10.0, end_t: 20.0 },
            ],
        };
        assert_eq!(plan.pos(15.0), Point::new(1.5, 0.0));
        assert_eq!(plan.end_t(), 20.0);
    }
}
