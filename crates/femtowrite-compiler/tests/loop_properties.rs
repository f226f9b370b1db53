use femtowrite_compiler::{CompilerParameters, Instruction, PgmCompiler, Program, ShutterState};
use proptest::prelude::*;

fn repeated_block(count: u32, lines: usize, pause: f64) -> Program {
    PgmCompiler::run(CompilerParameters::new("loops"), |gc| {
        gc.repeat(count, |gc| {
            for j in 0..lines {
                gc.instruction(format!("; line {}", j));
            }
            gc.dwell(pause);
            Ok(())
        })
    })
    .unwrap()
}

fn body_len(program: &Program) -> usize {
    let instructions = program.instructions();
    let start = instructions
        .iter()
        .position(|i| matches!(i, Instruction::RepeatStart(_)))
        .unwrap();
    let end = instructions
        .iter()
        .position(|i| matches!(i, Instruction::RepeatEnd))
        .unwrap();
    end - start - 1
}

proptest! {
    #[test]
    fn repeat_expands_body_n_times(count in 1u32..20, lines in 0usize..8) {
        let once = repeated_block(1, lines, 0.1);
        let many = repeated_block(count, lines, 0.1);
        let k = body_len(&once);

        prop_assert_eq!(many.len(), once.len());
        prop_assert_eq!(
            many.expanded_len(),
            once.expanded_len() + (count as usize - 1) * k
        );
    }

    #[test]
    fn dwell_time_counts_repetitions(count in 1u32..50, pause in 0.001f64..2.0) {
        let once = repeated_block(1, 0, pause);
        let many = repeated_block(count, 0, pause);
        let expected = once.dwell_time() + f64::from(count - 1) * pause;
        prop_assert!((many.dwell_time() - expected).abs() < 1e-9);
    }

    #[test]
    fn shutter_written_only_on_change(states in proptest::collection::vec(any::<bool>(), 0..30)) {
        let program = PgmCompiler::run(CompilerParameters::new("shutter"), |gc| {
            for &open in &states {
                gc.shutter(ShutterState::from(open));
            }
            Ok(())
        })
        .unwrap();

        let written: Vec<ShutterState> = program
            .instructions()
            .iter()
            .filter_map(|i| match i {
                Instruction::Shutter { state, .. } => Some(*state),
                _ => None,
            })
            .collect();
        prop_assert!(written.windows(2).all(|w| w[0] != w[1]));
        prop_assert_eq!(written.last().copied(), Some(ShutterState::Closed));
    }
}
