//! Machine state tracked during one compilation run.

use crate::instruction::{Axes, MotionMode, ShutterState};
use femtowrite_core::Point3;

/// Mutable context of a single [`PgmCompiler`](crate::PgmCompiler) run.
///
/// Created fresh by `open` and consumed by `close`. Never shared between
/// runs.
#[derive(Debug, Clone, Default)]
pub struct CompilerState {
    position: Option<Point3>,
    mode: MotionMode,
    shutter: ShutterState,
    feed_rate: Option<f64>,
    dwell_time: f64,
    loops: Vec<u32>,
    variables: Vec<String>,
    loaded: Vec<String>,
    axis_rotation: bool,
}

impl CompilerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute machine position, `None` until the first move.
    pub fn position(&self) -> Option<Point3> {
        self.position
    }

    pub fn mode(&self) -> MotionMode {
        self.mode
    }

    pub fn shutter(&self) -> ShutterState {
        self.shutter
    }

    /// Modal feed rate of the last move.
    pub fn feed_rate(&self) -> Option<f64> {
        self.feed_rate
    }

    /// Total pause time, loop repetitions included (s).
    pub fn dwell_time(&self) -> f64 {
        self.dwell_time
    }

    pub fn axis_rotation(&self) -> bool {
        self.axis_rotation
    }

    pub(crate) fn set_mode(&mut self, mode: MotionMode) {
        self.mode = mode;
    }

    pub(crate) fn set_shutter(&mut self, state: ShutterState) {
        self.shutter = state;
    }

    pub(crate) fn set_axis_rotation(&mut self, active: bool) {
        self.axis_rotation = active;
    }

    /// Records a move to `target` in the current motion mode.
    pub(crate) fn advance(&mut self, target: &Axes, feed_rate: Option<f64>) {
        if !target.is_empty() {
            let current = self.position.unwrap_or_default();
            self.position = Some(match self.mode {
                MotionMode::Absolute => target.resolve(current),
                MotionMode::Incremental => target.offset_from(current),
            });
        }
        if feed_rate.is_some() {
            self.feed_rate = feed_rate;
        }
    }

    /// Redefines the coordinates of the current position (G92).
    pub(crate) fn rehome(&mut self, axes: &Axes) {
        self.position = Some(axes.resolve(self.position.unwrap_or_default()));
    }

    /// Number of times an instruction appended now will run.
    pub fn repetitions(&self) -> u64 {
        self.loops.iter().map(|&n| u64::from(n)).product()
    }

    pub(crate) fn add_dwell(&mut self, pause: f64) {
        self.dwell_time += pause * self.repetitions() as f64;
    }

    pub(crate) fn enter_loop(&mut self, count: u32) {
        self.loops.push(count);
    }

    pub(crate) fn exit_loop(&mut self) {
        self.loops.pop();
    }

    pub fn loop_depth(&self) -> usize {
        self.loops.len()
    }

    pub(crate) fn declare(&mut self, var: &str) {
        let var = var.to_ascii_lowercase();
        if !self.variables.contains(&var) {
            self.variables.push(var);
        }
    }

    pub fn is_declared(&self, var: &str) -> bool {
        self.variables.contains(&var.to_ascii_lowercase())
    }

    pub(crate) fn load(&mut self, stem: &str) {
        self.loaded.push(stem.to_string());
    }

    pub(crate) fn unload(&mut self, stem: &str) -> bool {
        match self.loaded.iter().position(|s| s == stem) {
            Some(i) => {
                self.loaded.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn is_loaded(&self, stem: &str) -> bool {
        self.loaded.iter().any(|s| s == stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_modes() {
        let mut state = CompilerState::new();
        assert_eq!(state.position(), None);
        state.advance(&Axes::all(Point3::new(1.0, 2.0, 3.0)), Some(5.0));
        state.set_mode(MotionMode::Incremental);
        state.advance(&Axes::new(Some(1.0), None, None), None);
        assert_eq!(state.position(), Some(Point3::new(2.0, 2.0, 3.0)));
        assert_eq!(state.feed_rate(), Some(5.0));
    }

    #[test]
    fn test_dwell_in_loops() {
        let mut state = CompilerState::new();
        state.add_dwell(1.0);
        state.enter_loop(3);
        state.enter_loop(2);
        state.add_dwell(0.5);
        state.exit_loop();
        state.add_dwell(0.1);
        state.exit_loop();
        assert!((state.dwell_time() - (1.0 + 3.0 + 0.3)).abs() < 1e-12);
        assert_eq!(state.loop_depth(), 0);
    }

    #[test]
    fn test_variables_and_programs() {
        let mut state = CompilerState::new();
        state.declare("I");
        assert!(state.is_declared("i"));
        state.load("sub");
        assert!(state.is_loaded("sub"));
        assert!(state.unload("sub"));
        assert!(!state.unload("sub"));
    }
}
