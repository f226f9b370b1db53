//! Fabrication line profiles.
//!
//! The laser profile selects the PGM dialect details: program header, PSO
//! axis label and shutter delay. It never affects geometry.

use crate::instruction::{Instruction, MotionMode, ShutterState};
use femtowrite_core::CompileError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LaserProfile {
    #[default]
    Pharos,
    Carbide,
    Uwe,
    Ant,
}

impl LaserProfile {
    pub const ALL: [LaserProfile; 4] = [
        LaserProfile::Pharos,
        LaserProfile::Carbide,
        LaserProfile::Uwe,
        LaserProfile::Ant,
    ];

    /// Axis carrying the PSO laser gate.
    pub fn pso_label(self) -> char {
        match self {
            LaserProfile::Ant => 'Z',
            _ => 'X',
        }
    }

    /// Shutter opening delay (s). UWE uses a mechanical shutter, the other
    /// lines a Pockels cell.
    pub fn shutter_delay(self) -> f64 {
        match self {
            LaserProfile::Uwe => 0.005,
            _ => 0.0,
        }
    }

    /// Whether the PSO output has to be routed explicitly.
    fn routes_pso_output(self) -> bool {
        matches!(self, LaserProfile::Pharos | LaserProfile::Ant)
    }

    /// Program preamble for this line.
    pub fn header(self) -> Vec<Instruction> {
        let pso = self.pso_label();
        let mut lines = vec![
            Instruction::Raw("ENABLE X Y Z".to_string()),
            Instruction::Raw("METRIC".to_string()),
            Instruction::Raw("SECONDS".to_string()),
        ];
        if self.routes_pso_output() {
            lines.push(Instruction::Raw("G359".to_string()));
        } else {
            lines.push(Instruction::Raw("WAIT MODE NOWAIT".to_string()));
        }
        lines.push(Instruction::Raw("VELOCITY ON".to_string()));
        lines.push(Instruction::Raw(format!("PSOCONTROL {} RESET", pso)));
        if self.routes_pso_output() {
            lines.push(Instruction::Raw(format!("PSOOUTPUT {} CONTROL 3 0", pso)));
        }
        lines.push(Instruction::Shutter {
            axis: pso,
            state: ShutterState::Closed,
        });
        lines.push(Instruction::Mode(MotionMode::Absolute));
        lines.push(Instruction::Raw("G17".to_string()));
        lines
    }
}

impl fmt::Display for LaserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LaserProfile::Pharos => "PHAROS",
            LaserProfile::Carbide => "CARBIDE",
            LaserProfile::Uwe => "UWE",
            LaserProfile::Ant => "ANT",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for LaserProfile {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pharos" => Ok(LaserProfile::Pharos),
            "carbide" => Ok(LaserProfile::Carbide),
            "uwe" => Ok(LaserProfile::Uwe),
            "ant" => Ok(LaserProfile::Ant),
            _ => Err(CompileError::invalid(
                "laser",
                format!("laser can be only ANT, CARBIDE, PHAROS or UWE, given {}", s),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("pharos".parse::<LaserProfile>().unwrap(), LaserProfile::Pharos);
        assert_eq!(" Ant ".parse::<LaserProfile>().unwrap(), LaserProfile::Ant);
        let err = "femto".parse::<LaserProfile>().unwrap_err();
        assert!(matches!(err, CompileError::InvalidParameter { .. }));
    }

    #[test]
    fn test_pso_label_and_delay() {
        assert_eq!(LaserProfile::Ant.pso_label(), 'Z');
        assert_eq!(LaserProfile::Carbide.pso_label(), 'X');
        assert_eq!(LaserProfile::Uwe.shutter_delay(), 0.005);
        assert_eq!(LaserProfile::Pharos.shutter_delay(), 0.0);
    }

    #[test]
    fn test_header_shape() {
        for laser in LaserProfile::ALL {
            let header = laser.header();
            assert_eq!(header[0], Instruction::Raw("ENABLE X Y Z".to_string()));
            assert_eq!(header.last(), Some(&Instruction::Raw("G17".to_string())));
            assert!(header.contains(&Instruction::Shutter {
                axis: laser.pso_label(),
                state: ShutterState::Closed,
            }));
        }
        assert!(LaserProfile::Carbide
            .header()
            .contains(&Instruction::Raw("WAIT MODE NOWAIT".to_string())));
        assert!(LaserProfile::Ant
            .header()
            .contains(&Instruction::Raw("PSOOUTPUT Z CONTROL 3 0".to_string())));
    }

    #[test]
    fn test_serde_uppercase() {
        let json = serde_json::to_string(&LaserProfile::Carbide).unwrap();
        assert_eq!(json, "\"CARBIDE\"");
    }
}
