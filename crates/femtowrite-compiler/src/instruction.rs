//! Abstract machine instructions.
//!
//! A compiled [`Program`](crate::Program) is an ordered list of
//! [`Instruction`]s. Each instruction renders to exactly one line of PGM
//! code (see [`PgmWriter`](crate::PgmWriter)).

use femtowrite_core::Point3;
use femtowrite_designer::ArcDirection;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Optional coordinates of a move. Missing axes keep their current value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Axes {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl Axes {
    pub fn new(x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Self {
        Self { x, y, z }
    }

    /// All three axes of `p`.
    pub fn all(p: Point3) -> Self {
        Self::new(Some(p.x), Some(p.y), Some(p.z))
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none()
    }

    /// Absolute target reached from `current` in absolute mode.
    pub fn resolve(&self, current: Point3) -> Point3 {
        Point3::new(
            self.x.unwrap_or(current.x),
            self.y.unwrap_or(current.y),
            self.z.unwrap_or(current.z),
        )
    }

    /// Target reached from `current` in incremental mode.
    pub fn offset_from(&self, current: Point3) -> Point3 {
        Point3::new(
            current.x + self.x.unwrap_or(0.0),
            current.y + self.y.unwrap_or(0.0),
            current.z + self.z.unwrap_or(0.0),
        )
    }
}

impl From<Point3> for Axes {
    fn from(p: Point3) -> Self {
        Axes::all(p)
    }
}

/// Coordinate interpretation of motion commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MotionMode {
    #[default]
    Absolute,
    Incremental,
}

impl fmt::Display for MotionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionMode::Absolute => write!(f, "ABSOLUTE"),
            MotionMode::Incremental => write!(f, "INCREMENTAL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShutterState {
    Open,
    #[default]
    Closed,
}

impl ShutterState {
    pub fn is_open(self) -> bool {
        self == ShutterState::Open
    }
}

impl From<bool> for ShutterState {
    fn from(on: bool) -> Self {
        if on {
            ShutterState::Open
        } else {
            ShutterState::Closed
        }
    }
}

impl fmt::Display for ShutterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutterState::Open => write!(f, "ON"),
            ShutterState::Closed => write!(f, "OFF"),
        }
    }
}

/// A single machine command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// G1 linear move
    Linear {
        target: Axes,
        feed_rate: Option<f64>,
    },
    /// G2/G3 circular move in the xy plane (helical when z changes)
    Arc {
        start: Point3,
        target: Point3,
        center: Point3,
        direction: ArcDirection,
        feed_rate: f64,
    },
    /// Pause (s)
    Dwell(f64),
    /// PSO laser gate
    Shutter { axis: char, state: ShutterState },
    Mode(MotionMode),
    /// G92 redefinition of the current position
    SetHome(Axes),
    Comment(String),
    /// Empty spacer line
    Blank,
    /// Pass-through line
    Raw(String),
    DeclareVariables(Vec<String>),
    RepeatStart(u32),
    RepeatEnd,
    ForStart { var: String, count: u32 },
    ForEnd { var: String },
    LoadProgram { task: u32, file: String },
    ProgramStop { task: u32 },
    WaitTaskIdle { task: u32 },
    RemoveProgram { file: String },
    FarCall { file: String },
    BufferedCall { task: u32, file: String },
    MsgDisplay(String),
    /// G84 hardware axis rotation; `None` resets it
    AxisRotation(Option<f64>),
}

impl Instruction {
    pub fn linear(target: impl Into<Axes>, feed_rate: f64) -> Self {
        Instruction::Linear {
            target: target.into(),
            feed_rate: Some(feed_rate),
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Instruction::Comment(text.into())
    }

    /// Loop markers delimit repeated blocks and are not executed themselves.
    pub fn is_loop_marker(&self) -> bool {
        matches!(
            self,
            Instruction::RepeatStart(_)
                | Instruction::RepeatEnd
                | Instruction::ForStart { .. }
                | Instruction::ForEnd { .. }
        )
    }

    pub fn is_motion(&self) -> bool {
        matches!(self, Instruction::Linear { .. } | Instruction::Arc { .. })
    }

    pub fn is_shutter(&self) -> bool {
        matches!(self, Instruction::Shutter { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axes_resolve() {
        let current = Point3::new(1.0, 2.0, 3.0);
        let axes = Axes::new(Some(5.0), None, Some(0.0));
        assert_eq!(axes.resolve(current), Point3::new(5.0, 2.0, 0.0));
        assert_eq!(axes.offset_from(current), Point3::new(6.0, 2.0, 3.0));
        assert!(Axes::default().is_empty());
    }

    #[test]
    fn test_loop_markers() {
        assert!(Instruction::RepeatStart(3).is_loop_marker());
        assert!(Instruction::ForEnd { var: "I".into() }.is_loop_marker());
        assert!(!Instruction::Dwell(0.5).is_loop_marker());
        assert!(Instruction::linear(Point3::origin(), 5.0).is_motion());
    }

    #[test]
    fn test_display() {
        assert_eq!(MotionMode::Incremental.to_string(), "INCREMENTAL");
        assert_eq!(ShutterState::from(true).to_string(), "ON");
        assert!(!ShutterState::default().is_open());
    }
}
