//! PGM text rendering.

use crate::instruction::{Axes, Instruction};
use femtowrite_designer::ArcDirection;

/// Renders instructions as Aerotech PGM lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgmWriter {
    digits: usize,
}

impl Default for PgmWriter {
    fn default() -> Self {
        Self { digits: 6 }
    }
}

impl PgmWriter {
    pub fn new(digits: usize) -> Self {
        Self { digits }
    }

    pub fn digits(&self) -> usize {
        self.digits
    }

    fn axes(&self, axes: &Axes, feed_rate: Option<f64>) -> String {
        let d = self.digits;
        let mut args = Vec::with_capacity(4);
        if let Some(x) = axes.x {
            args.push(format!("X{:.*}", d, x));
        }
        if let Some(y) = axes.y {
            args.push(format!("Y{:.*}", d, y));
        }
        if let Some(z) = axes.z {
            args.push(format!("Z{:.*}", d, z));
        }
        if let Some(f) = feed_rate {
            args.push(format!("F{:.*}", d, f));
        }
        args.join(" ")
    }

    /// One line of PGM code, without the line terminator.
    pub fn render(&self, instruction: &Instruction) -> String {
        let d = self.digits;
        match instruction {
            Instruction::Linear { target, feed_rate } => {
                let args = self.axes(target, *feed_rate);
                if target.is_empty() {
                    args
                } else {
                    format!("G1 {}", args)
                }
            }
            Instruction::Arc {
                start,
                target,
                center,
                direction,
                feed_rate,
            } => {
                let code = match direction {
                    ArcDirection::Clockwise => "G2",
                    ArcDirection::CounterClockwise => "G3",
                };
                format!(
                    "{} X{:.*} Y{:.*} Z{:.*} I{:.*} J{:.*} F{:.*}",
                    code,
                    d,
                    target.x,
                    d,
                    target.y,
                    d,
                    target.z,
                    d,
                    center.x - start.x,
                    d,
                    center.y - start.y,
                    d,
                    feed_rate
                )
            }
            Instruction::Dwell(t) => format!("DWELL {:?}", t),
            Instruction::Shutter { axis, state } => format!("PSOCONTROL {} {}", axis, state),
            Instruction::Mode(mode) => mode.to_string(),
            Instruction::SetHome(axes) => format!("G92 {}", self.axes(axes, None)),
            Instruction::Comment(text) => format!("; {}", text),
            Instruction::Blank => String::new(),
            Instruction::Raw(line) => line.clone(),
            Instruction::DeclareVariables(vars) => {
                let args: Vec<String> = vars.iter().map(|v| format!("${}", v)).collect();
                format!("DVAR {}", args.join(" "))
            }
            Instruction::RepeatStart(n) => format!("REPEAT {}", n),
            Instruction::RepeatEnd => "ENDREPEAT".to_string(),
            Instruction::ForStart { var, count } => {
                format!("FOR ${} = 0 TO {}", var, count.saturating_sub(1))
            }
            Instruction::ForEnd { var } => format!("NEXT ${}", var),
            Instruction::LoadProgram { task, file } => format!("PROGRAM {} LOAD \"{}\"", task, file),
            Instruction::ProgramStop { task } => format!("PROGRAM {} STOP", task),
            Instruction::WaitTaskIdle { task } => format!(
                "WAIT (TASKSTATUS({}, DATAITEM_TaskState) == TASKSTATE_Idle) -1",
                task
            ),
            Instruction::RemoveProgram { file } => format!("REMOVEPROGRAM \"{}\"", file),
            Instruction::FarCall { file } => format!("FARCALL \"{}\"", file),
            Instruction::BufferedCall { task, file } => {
                format!("PROGRAM {} BUFFEREDRUN \"{}\"", task, file)
            }
            Instruction::MsgDisplay(text) => format!("MSGDISPLAY 1, \"{}\"", text),
            Instruction::AxisRotation(None) => "G84 X Y".to_string(),
            Instruction::AxisRotation(Some(angle)) => format!("G84 X Y F{:?}", angle),
        }
    }

    /// Full program text, one line per instruction.
    pub fn render_all(&self, instructions: &[Instruction]) -> String {
        let mut text = String::new();
        for instruction in instructions {
            text.push_str(&self.render(instruction));
            text.push('\n');
        }
        text
    }
}
