//! Compiled programs.

use crate::instruction::{Instruction, MotionMode};
use crate::writer::PgmWriter;
use femtowrite_core::Point3;
use femtowrite_designer::ArcDirection;
use std::f64::consts::TAU;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Ordered instruction stream produced by a closed compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    name: String,
    export_dir: Option<PathBuf>,
    writer: PgmWriter,
    instructions: Vec<Instruction>,
    dwell_time: f64,
    shutter_delay: f64,
}

impl Program {
    pub(crate) fn new(
        name: String,
        export_dir: Option<PathBuf>,
        writer: PgmWriter,
        instructions: Vec<Instruction>,
        dwell_time: f64,
        shutter_delay: f64,
    ) -> Self {
        Self {
            name,
            export_dir,
            writer,
            instructions,
            dwell_time,
            shutter_delay,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn last(&self) -> Option<&Instruction> {
        self.instructions.last()
    }

    /// Total pause time with loop repetitions (s).
    pub fn dwell_time(&self) -> f64 {
        self.dwell_time
    }

    /// Instructions in execution order with loops unrolled. Loop markers
    /// are not included.
    pub fn expanded(&self) -> Vec<&Instruction> {
        let mut out = Vec::new();
        expand_into(&self.instructions, &mut out);
        out
    }

    pub fn expanded_len(&self) -> usize {
        self.expanded().len()
    }

    /// Number of executed motion instructions.
    pub fn motion_count(&self) -> usize {
        self.expanded().iter().filter(|i| i.is_motion()).count()
    }

    /// Machine position after the whole program has run.
    pub fn final_position(&self) -> Option<Point3> {
        let mut replay = Replay::default();
        for instruction in self.expanded() {
            replay.step(instruction);
        }
        replay.position
    }

    /// Execution time estimate: motion at the programmed feeds, pauses and
    /// shutter delays (s).
    pub fn estimated_duration(&self) -> f64 {
        let mut replay = Replay::default();
        let mut total = 0.0;
        for instruction in self.expanded() {
            match instruction {
                Instruction::Dwell(t) => total += t,
                Instruction::Shutter { .. } => total += self.shutter_delay,
                _ => {}
            }
            let from = replay.position.unwrap_or_default();
            replay.step(instruction);
            let length = match instruction {
                Instruction::Linear { .. } => {
                    replay.position.unwrap_or_default().distance_to(&from)
                }
                Instruction::Arc {
                    start,
                    target,
                    center,
                    direction,
                    ..
                } => arc_length(*start, *target, *center, *direction),
                _ => 0.0,
            };
            if let Some(feed) = replay.feed_rate.filter(|f| *f > 0.0) {
                total += length / feed;
            }
        }
        total
    }

    /// PGM source text.
    pub fn to_pgm(&self) -> String {
        self.writer.render_all(&self.instructions)
    }

    /// Output path: name with a `.pgm` extension inside the export directory.
    pub fn file_path(&self) -> PathBuf {
        let file = Path::new(&self.name).with_extension("pgm");
        match &self.export_dir {
            Some(dir) => dir.join(file),
            None => file,
        }
    }

    /// Writes the program, creating the export directory if needed.
    pub fn write_to_file(&self) -> io::Result<PathBuf> {
        let path = self.file_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, self.to_pgm())?;
        info!(
            "Wrote {} instructions to {}",
            self.instructions.len(),
            path.display()
        );
        Ok(path)
    }
}

fn expand_into<'a>(items: &'a [Instruction], out: &mut Vec<&'a Instruction>) {
    let mut i = 0;
    while i < items.len() {
        match &items[i] {
            Instruction::RepeatStart(count) | Instruction::ForStart { count, .. } => {
                let end = matching_end(items, i);
                let body = &items[i + 1..end];
                for _ in 0..*count {
                    expand_into(body, out);
                }
                i = end + 1;
            }
            Instruction::RepeatEnd | Instruction::ForEnd { .. } => i += 1,
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
}

/// Index of the marker closing the loop opened at `start`, or the slice
/// length when it is never closed.
fn matching_end(items: &[Instruction], start: usize) -> usize {
    let mut depth = 0usize;
    for (i, item) in items.iter().enumerate().skip(start) {
        match item {
            Instruction::RepeatStart(_) | Instruction::ForStart { .. } => depth += 1,
            Instruction::RepeatEnd | Instruction::ForEnd { .. } => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    items.len()
}

fn arc_length(start: Point3, target: Point3, center: Point3, direction: ArcDirection) -> f64 {
    let a0 = (start.y - center.y).atan2(start.x - center.x);
    let a1 = (target.y - center.y).atan2(target.x - center.x);
    let sweep = match direction {
        ArcDirection::CounterClockwise => (a1 - a0).rem_euclid(TAU),
        ArcDirection::Clockwise => (a0 - a1).rem_euclid(TAU),
    };
    let radius = start.planar_distance_to(&center);
    (radius * sweep).hypot(target.z - start.z)
}

#[derive(Debug, Default)]
struct Replay {
    position: Option<Point3>,
    feed_rate: Option<f64>,
    mode: MotionMode,
}

impl Replay {
    fn step(&mut self, instruction: &Instruction) {
        let current = self.position.unwrap_or_default();
        match instruction {
            Instruction::Linear { target, feed_rate } => {
                if !target.is_empty() {
                    self.position = Some(match self.mode {
                        MotionMode::Absolute => target.resolve(current),
                        MotionMode::Incremental => target.offset_from(current),
                    });
                }
                if feed_rate.is_some() {
                    self.feed_rate = *feed_rate;
                }
            }
            Instruction::Arc {
                target, feed_rate, ..
            } => {
                self.position = Some(*target);
                self.feed_rate = Some(*feed_rate);
            }
            Instruction::Mode(mode) => self.mode = *mode,
            Instruction::SetHome(axes) => self.position = Some(axes.resolve(current)),
            _ => {}
        }
    }
}
