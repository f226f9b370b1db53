//! PGM toolpath compiler.
//!
//! A [`PgmCompiler`] value is one compilation run: [`open`](PgmCompiler::open)
//! writes the laser header and creates a fresh [`CompilerState`], the
//! command methods append instructions in call order, and
//! [`close`](PgmCompiler::close) returns the machine home and hands back the
//! finished [`Program`].
//!
//! ```text
//! Primitive -> placement -> global transforms -> moves -> instructions
//! ```

use crate::instruction::{Axes, Instruction, MotionMode, ShutterState};
use crate::parameters::CompilerParameters;
use crate::program::Program;
use crate::state::CompilerState;
use crate::writer::PgmWriter;
use femtowrite_core::constants::{COLLINEAR_TOLERANCE, CONTINUITY_TOLERANCE, EPSILON, X_INIT};
use femtowrite_core::{CompileError, GeometryError, PathPoint, Point3};
use femtowrite_designer::{
    ArcDirection, Device, FlatSurface, Primitive, SegmentKind, ToolpathSink, Transform,
    TransformStack, WarpCompensation, WarpSurface,
};
use std::f64::consts::FRAC_PI_2;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Task used for external programs when none is given.
pub const DEFAULT_TASK: u32 = 2;

/// A failed compilation run.
///
/// `program` is the closed program when the run could be finalized, i.e.
/// whenever the failure happened after `open`.
#[derive(thiserror::Error, Debug)]
#[error("{source}")]
pub struct CompileFailure {
    pub program: Option<Program>,
    pub source: CompileError,
}

#[derive(Debug, Clone, Copy)]
enum Move {
    Line(PathPoint),
    Arc {
        end: PathPoint,
        center: Point3,
        direction: ArcDirection,
    },
}

impl Move {
    fn end(&self) -> PathPoint {
        match self {
            Move::Line(p) => *p,
            Move::Arc { end, .. } => *end,
        }
    }
}

/// An external `.pgm` program referenced by load/call commands.
struct ProgramFile {
    /// Path as written in LOAD, FARCALL and BUFFEREDRUN
    path: String,
    /// File name as written in REMOVEPROGRAM
    name: String,
    stem: String,
}

impl ProgramFile {
    fn parse(filename: &str) -> Result<Self, CompileError> {
        let given = Path::new(filename);
        let path = match given.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pgm") => given.to_path_buf(),
            None => given.with_extension("pgm"),
            Some(ext) => {
                return Err(CompileError::invalid(
                    "filename",
                    format!("wrong extension .{} for {}, required .pgm", ext, filename),
                ))
            }
        };
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CompileError::invalid("filename", "program file name is empty"))?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(stem)
            .to_string();
        Ok(Self {
            stem: stem.to_string(),
            name,
            path: path.to_string_lossy().into_owned(),
        })
    }
}

/// Compiles primitives into an Aerotech PGM instruction stream.
#[derive(Debug)]
pub struct PgmCompiler {
    params: CompilerParameters,
    global: TransformStack,
    state: CompilerState,
    instructions: Vec<Instruction>,
}

impl PgmCompiler {
    /// Starts a run. With `warp_flag` set and no fitted surface, a flat
    /// surface is used.
    pub fn open(params: CompilerParameters) -> Result<Self, CompileError> {
        let surface: Option<Arc<dyn WarpSurface>> = if params.warp_flag {
            warn!("Warp compensation enabled without a fitted surface, assuming a flat sample");
            Some(Arc::new(FlatSurface))
        } else {
            None
        };
        Self::open_inner(params, surface)
    }

    /// Starts a run compensating the given sample surface.
    pub fn open_with_surface(
        params: CompilerParameters,
        surface: Arc<dyn WarpSurface>,
    ) -> Result<Self, CompileError> {
        Self::open_inner(params, Some(surface))
    }

    fn open_inner(
        params: CompilerParameters,
        surface: Option<Arc<dyn WarpSurface>>,
    ) -> Result<Self, CompileError> {
        params.validate()?;
        let global = global_stack(&params, surface)?;
        let mut compiler = Self {
            instructions: params.laser.header(),
            params,
            global,
            state: CompilerState::new(),
        };
        compiler.dwell(1.0);
        compiler.blank();

        if compiler.params.rotation_angle != 0.0 {
            warn!(
                "Rotation angle is {:.3} deg (angles are in degrees)",
                compiler.params.rotation_angle
            );
        }
        if let Some(angle) = compiler.params.hardware_angle() {
            warn!("G84 axis rotation will be used, rotation angle is {:.3} deg", angle);
            compiler.enter_axis_rotation(Some(angle));
        }
        info!(
            "Opened PGM compiler for '{}' ({} laser, n_eff {:.4})",
            compiler.params.filename,
            compiler.params.laser,
            compiler.params.neff()
        );
        Ok(compiler)
    }

    /// Opens a run, executes `body` and always closes.
    pub fn run<F>(params: CompilerParameters, body: F) -> Result<Program, CompileFailure>
    where
        F: FnOnce(&mut PgmCompiler) -> Result<(), CompileError>,
    {
        let compiler = Self::open(params).map_err(|source| CompileFailure {
            program: None,
            source,
        })?;
        compiler.finish_with(body)
    }

    /// Executes `body` on an opened run, then closes it even if `body`
    /// failed.
    pub fn finish_with<F>(mut self, body: F) -> Result<Program, CompileFailure>
    where
        F: FnOnce(&mut PgmCompiler) -> Result<(), CompileError>,
    {
        let outcome = body(&mut self);
        let program = self.close();
        match outcome {
            Ok(()) => Ok(program),
            Err(source) => {
                warn!("Compilation of '{}' failed: {}", program.name(), source);
                Err(CompileFailure {
                    program: Some(program),
                    source,
                })
            }
        }
    }

    pub fn params(&self) -> &CompilerParameters {
        &self.params
    }

    pub fn state(&self) -> &CompilerState {
        &self.state
    }

    /// Transforms applied to every primitive after its placement.
    pub fn global_transform(&self) -> &TransformStack {
        &self.global
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn dwell_time(&self) -> f64 {
        self.state.dwell_time()
    }

    fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn blank(&mut self) {
        self.push(Instruction::Blank);
    }

    pub fn comment(&mut self, text: impl Into<String>) {
        self.push(Instruction::Blank);
        self.push(Instruction::Comment(text.into()));
    }

    /// Raw pass-through line.
    pub fn instruction(&mut self, line: impl Into<String>) {
        self.push(Instruction::Raw(line.into()));
    }

    /// Pause for `|pause|` seconds. A zero pause is skipped.
    pub fn dwell(&mut self, pause: f64) {
        let pause = pause.abs();
        if pause == 0.0 {
            return;
        }
        self.push(Instruction::Dwell(pause));
        self.state.add_dwell(pause);
    }

    /// Sets the laser gate, only if it changes.
    pub fn shutter(&mut self, state: ShutterState) {
        if state == self.state.shutter() {
            return;
        }
        self.push(Instruction::Shutter {
            axis: self.params.laser.pso_label(),
            state,
        });
        self.state.set_shutter(state);
    }

    /// Shutter change framed by the short and long pauses.
    fn toggle_shutter(&mut self, state: ShutterState) {
        if state == self.state.shutter() {
            return;
        }
        self.blank();
        self.dwell(self.params.short_pause);
        self.shutter(state);
        self.dwell(self.params.long_pause);
        self.blank();
    }

    pub fn mode(&mut self, mode: MotionMode) {
        self.push(Instruction::Mode(mode));
        self.state.set_mode(mode);
    }

    /// Redefines the coordinates of the current position.
    pub fn set_home(&mut self, axes: impl Into<Axes>) -> Result<(), CompileError> {
        let axes = axes.into();
        if axes.is_empty() {
            return Err(CompileError::invalid(
                "home_position",
                "(None, None, None) is not a valid home position",
            ));
        }
        self.push(Instruction::SetHome(axes));
        self.state.rehome(&axes);
        Ok(())
    }

    fn check_feed(&self, feed_rate: f64) -> Result<(), CompileError> {
        if !(feed_rate.is_finite() && feed_rate >= self.params.min_feed()) {
            return Err(CompileError::invalid(
                "feed_rate",
                format!(
                    "feed rate {} is zero at {} output digits",
                    feed_rate, self.params.output_digits
                ),
            ));
        }
        Ok(())
    }

    /// Positioning move with the shutter closed, at `speed` or the default
    /// positioning speed.
    pub fn move_to(&mut self, target: impl Into<Axes>, speed: Option<f64>) -> Result<(), CompileError> {
        let feed = speed.unwrap_or(self.params.speed_pos);
        self.check_feed(feed)?;
        self.position_to(target.into(), feed);
        Ok(())
    }

    fn position_to(&mut self, target: Axes, feed: f64) {
        self.shutter(ShutterState::Closed);
        self.push(Instruction::Linear {
            target,
            feed_rate: Some(feed),
        });
        self.state.advance(&target, Some(feed));
        self.dwell(self.params.long_pause);
        self.blank();
    }

    pub fn go_origin(&mut self) -> Result<(), CompileError> {
        self.comment("HOMING");
        self.ensure_absolute();
        self.move_to(Point3::origin(), None)
    }

    /// Moves to the waveguide start abscissa `(X_INIT, 0, 0)`.
    pub fn go_init(&mut self) -> Result<(), CompileError> {
        self.ensure_absolute();
        self.move_to(Point3::new(X_INIT, 0.0, 0.0), None)
    }

    /// Declares loop variables at the top of the program.
    pub fn dvar<I, S>(&mut self, variables: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let vars: Vec<String> = variables.into_iter().map(Into::into).collect();
        for var in &vars {
            self.state.declare(var);
        }
        self.instructions.insert(0, Instruction::Blank);
        self.instructions.insert(0, Instruction::DeclareVariables(vars));
    }

    fn check_count(count: u32) -> Result<(), CompileError> {
        if count == 0 {
            return Err(CompileError::invalid("count", "number of iterations is 0"));
        }
        Ok(())
    }

    /// REPEAT block. The closing marker is written even if `body` fails.
    pub fn repeat<F>(&mut self, count: u32, body: F) -> Result<(), CompileError>
    where
        F: FnOnce(&mut Self) -> Result<(), CompileError>,
    {
        Self::check_count(count)?;
        self.push(Instruction::RepeatStart(count));
        self.state.enter_loop(count);
        let outcome = body(self);
        self.state.exit_loop();
        self.push(Instruction::RepeatEnd);
        self.blank();
        outcome
    }

    /// FOR block over a variable declared with [`dvar`](Self::dvar).
    pub fn for_loop<F>(&mut self, var: &str, count: u32, body: F) -> Result<(), CompileError>
    where
        F: FnOnce(&mut Self) -> Result<(), CompileError>,
    {
        Self::check_count(count)?;
        if !self.state.is_declared(var) {
            return Err(CompileError::UndeclaredVariable(var.to_string()));
        }
        self.push(Instruction::ForStart {
            var: var.to_string(),
            count,
        });
        self.state.enter_loop(count);
        let outcome = body(self);
        self.state.exit_loop();
        self.push(Instruction::ForEnd {
            var: var.to_string(),
        });
        self.blank();
        outcome
    }

    /// Start timestamp in the controller message panel.
    pub fn tic(&mut self) {
        self.push(Instruction::MsgDisplay("START #TS".to_string()));
        self.blank();
    }

    /// End timestamp in the controller message panel.
    pub fn toc(&mut self) {
        self.push(Instruction::MsgDisplay("END   #TS".to_string()));
        self.push(Instruction::MsgDisplay("---------------------".to_string()));
        self.push(Instruction::MsgDisplay(" ".to_string()));
        self.blank();
    }

    pub fn load_program(&mut self, filename: &str, task: u32) -> Result<(), CompileError> {
        let file = ProgramFile::parse(filename)?;
        self.push(Instruction::LoadProgram {
            task,
            file: file.path,
        });
        self.state.load(&file.stem);
        Ok(())
    }

    /// Stops the task and waits until it is idle.
    pub fn program_stop(&mut self, task: u32) {
        self.push(Instruction::ProgramStop { task });
        self.push(Instruction::WaitTaskIdle { task });
    }

    pub fn remove_program(&mut self, filename: &str, task: u32) -> Result<(), CompileError> {
        let file = ProgramFile::parse(filename)?;
        if !self.state.is_loaded(&file.stem) {
            return Err(CompileError::ProgramNotLoaded(file.path));
        }
        self.program_stop(task);
        self.push(Instruction::RemoveProgram { file: file.name });
        self.state.unload(&file.stem);
        Ok(())
    }

    pub fn farcall(&mut self, filename: &str) -> Result<(), CompileError> {
        let file = ProgramFile::parse(filename)?;
        if !self.state.is_loaded(&file.stem) {
            return Err(CompileError::ProgramNotLoaded(file.path));
        }
        self.dwell(self.params.short_pause);
        self.push(Instruction::FarCall { file: file.path });
        Ok(())
    }

    /// Queues a loaded program on `task`.
    pub fn buffered_call(&mut self, filename: &str, task: u32) -> Result<(), CompileError> {
        let file = ProgramFile::parse(filename)?;
        if !self.state.is_loaded(&file.stem) {
            return Err(CompileError::ProgramNotLoaded(file.path));
        }
        self.dwell(self.params.short_pause);
        self.blank();
        self.push(Instruction::BufferedCall {
            task,
            file: file.path,
        });
        Ok(())
    }

    /// Loads, runs and removes each program in turn. Missing task ids
    /// default to [`DEFAULT_TASK`], extra ones are ignored.
    pub fn farcall_list(&mut self, filenames: &[&str], tasks: &[u32]) -> Result<(), CompileError> {
        for (i, filename) in filenames.iter().enumerate() {
            let task = tasks.get(i).copied().unwrap_or(DEFAULT_TASK);
            let file = ProgramFile::parse(filename)?;
            self.load_program(&file.path, task)?;
            self.farcall(&file.name)?;
            self.dwell(self.params.short_pause);
            self.remove_program(&file.name, task)?;
            self.dwell(self.params.short_pause);
            self.blank();
            self.blank();
        }
        Ok(())
    }

    /// Switches to absolute coordinates unless already there.
    fn ensure_absolute(&mut self) {
        if self.state.mode() != MotionMode::Absolute {
            self.mode(MotionMode::Absolute);
        }
    }

    fn enter_axis_rotation(&mut self, angle: Option<f64>) {
        self.comment("ACTIVATE AXIS ROTATION");
        self.shutter(ShutterState::Closed);
        self.ensure_absolute();
        self.linear(Point3::origin(), self.params.speed_pos);
        self.push(Instruction::AxisRotation(None));
        self.dwell(self.params.short_pause);
        if let Some(angle) = angle {
            self.push(Instruction::AxisRotation(Some(angle.rem_euclid(360.0))));
            self.blank();
            self.dwell(self.params.short_pause);
        }
        self.state.set_axis_rotation(true);
    }

    fn exit_axis_rotation(&mut self) {
        self.comment("DEACTIVATE AXIS ROTATION");
        self.shutter(ShutterState::Closed);
        self.ensure_absolute();
        self.linear(Point3::origin(), self.params.speed_pos);
        self.push(Instruction::AxisRotation(None));
        self.dwell(self.params.short_pause);
        self.state.set_axis_rotation(false);
    }

    /// G84 hardware rotation block of `angle` degrees around `body`.
    pub fn axis_rotation<F>(&mut self, angle: Option<f64>, body: F) -> Result<(), CompileError>
    where
        F: FnOnce(&mut Self) -> Result<(), CompileError>,
    {
        if self.state.axis_rotation() {
            return Err(CompileError::invalid(
                "axis_rotation",
                "an axis rotation is already active",
            ));
        }
        self.enter_axis_rotation(angle);
        let outcome = body(self);
        self.exit_axis_rotation();
        outcome
    }

    fn linear(&mut self, target: Point3, feed: f64) {
        let target = Axes::all(target);
        self.push(Instruction::Linear {
            target,
            feed_rate: Some(feed),
        });
        self.state.advance(&target, Some(feed));
    }

    fn check_bounds(&self, p: Point3) -> Result<(), CompileError> {
        let margin = self.params.bounds_margin;
        let (x_min, x_max) = (-margin, self.params.x_sample() + margin);
        let (y_min, y_max) = (-margin, self.params.y_sample() + margin);
        let inside = p.is_finite() && p.x >= x_min && p.x <= x_max && p.y >= y_min && p.y <= y_max;
        if inside {
            Ok(())
        } else {
            Err(CompileError::OutOfBounds {
                x: p.x,
                y: p.y,
                z: p.z,
                x_min,
                x_max,
                y_min,
                y_max,
            })
        }
    }

    /// Compiles a primitive at its design coordinates.
    pub fn emit(&mut self, primitive: &Primitive) -> Result<(), CompileError> {
        self.emit_with(primitive, &TransformStack::new())
    }

    /// Compiles every primitive of `device` in fabrication order.
    pub fn emit_device(&mut self, device: &Device) -> Result<(), CompileError> {
        info!(
            "Compiling device '{}' ({} primitives)",
            device.name(),
            device.len()
        );
        device.compile(self)
    }

    fn emit_with(&mut self, primitive: &Primitive, placement: &TransformStack) -> Result<(), CompileError> {
        let samples = primitive.path_points();
        if samples.is_empty() {
            return Err(GeometryError::degenerate(format!(
                "primitive '{}' has no points",
                primitive.id()
            ))
            .into());
        }
        for p in &samples {
            self.check_bounds(placement.apply_point(p.position))?;
        }
        let stack = placement.then(&self.global)?;
        let moves = self.plan_moves(primitive, &stack);
        self.check_feed(primitive.speed_closed())?;
        for m in &moves {
            self.check_feed(m.end().feed_rate)?;
        }
        let Some((first, body)) = moves.split_first() else {
            return Ok(());
        };
        debug!(
            "Emitting {} '{}': {} samples as {} moves, {} scan(s)",
            primitive.kind(),
            primitive.id(),
            samples.len(),
            moves.len(),
            primitive.scan()
        );

        self.ensure_absolute();
        let start = first.end().position;
        let at_start = self
            .state
            .position()
            .is_some_and(|p| p.approx_eq(&start, CONTINUITY_TOLERANCE));
        if !at_start {
            self.toggle_shutter(ShutterState::Closed);
            self.linear(start, primitive.speed_closed());
        }

        if primitive.scan() > 1 {
            self.repeat(primitive.scan(), |gc| {
                gc.write_moves(body);
                Ok(())
            })?;
        } else {
            self.write_moves(body);
        }
        self.dwell(self.params.long_pause);
        self.blank();
        Ok(())
    }

    fn write_moves(&mut self, moves: &[Move]) {
        for m in moves {
            let end = m.end();
            self.toggle_shutter(ShutterState::from(end.laser_on));
            match *m {
                Move::Line(p) => self.linear(p.position, p.feed_rate),
                Move::Arc {
                    end,
                    center,
                    direction,
                } => {
                    let start = self.state.position().unwrap_or_default();
                    self.push(Instruction::Arc {
                        start,
                        target: end.position,
                        center,
                        direction,
                        feed_rate: end.feed_rate,
                    });
                    self.state
                        .advance(&Axes::all(end.position), Some(end.feed_rate));
                }
            }
        }
        self.toggle_shutter(ShutterState::Closed);
    }

    /// Transformed moves of one pass, arcs kept native where possible and
    /// collinear samples merged.
    fn plan_moves(&self, primitive: &Primitive, stack: &TransformStack) -> Vec<Move> {
        let map = |p: &PathPoint| p.with_position(stack.apply_point(p.position));
        let mut moves = Vec::new();
        for (i, segment) in primitive.segments().iter().enumerate() {
            let skip = usize::from(i > 0);
            if let Some(arcs) = self.native_arcs(&segment.kind, &segment.points, stack) {
                if i == 0 {
                    moves.extend(segment.points.first().map(|p| Move::Line(map(p))));
                }
                moves.extend(arcs);
                continue;
            }
            moves.extend(segment.points.iter().skip(skip).map(|p| Move::Line(map(p))));
        }
        collapse_collinear(&moves)
    }

    /// G2/G3 moves for an arc segment, each sweeping at most a half turn.
    /// `None` falls back to the dense samples.
    fn native_arcs(&self, kind: &SegmentKind, points: &[PathPoint], stack: &TransformStack) -> Option<Vec<Move>> {
        if !self.params.native_arcs {
            return None;
        }
        let SegmentKind::Arc {
            center,
            radius,
            direction,
            sweep,
        } = kind
        else {
            return None;
        };
        let first = points.first()?;
        let planar = points
            .iter()
            .all(|p| (p.position.z - first.position.z).abs() <= CONTINUITY_TOLERANCE);
        if !planar || !sweep.is_finite() || *sweep <= EPSILON {
            return None;
        }
        // Samples are evenly spaced in angle, so pieces are cut at sample
        // indices.
        let intervals = points.len() - 1;
        let pieces = (sweep / FRAC_PI_2).ceil().max(1.0) as usize;
        if pieces > intervals {
            return None;
        }
        let mapped = stack.map_arc(*center, *radius, *direction)?;
        let arcs = (1..=pieces)
            .map(|k| {
                let end = &points[(k * intervals + pieces / 2) / pieces];
                Move::Arc {
                    end: end.with_position(stack.apply_point(end.position)),
                    center: mapped.center,
                    direction: mapped.direction,
                }
            })
            .collect();
        Some(arcs)
    }

    /// Finishes the run: leaves any axis rotation, closes the shutter and
    /// returns to the home position.
    pub fn close(mut self) -> Program {
        if self.state.axis_rotation() {
            self.exit_axis_rotation();
            self.blank();
        }
        self.toggle_shutter(ShutterState::Closed);
        self.comment("HOMING");
        self.ensure_absolute();
        self.position_to(Axes::all(self.params.home_position), self.params.speed_pos);

        let dwell = self.state.dwell_time();
        info!(
            "Closed '{}': {} instructions, {:.2} s of pauses",
            self.params.filename,
            self.instructions.len(),
            dwell
        );
        Program::new(
            self.params.filename.clone(),
            self.params.export_dir.clone(),
            PgmWriter::new(self.params.output_digits),
            self.instructions,
            dwell,
            self.params.laser.shutter_delay(),
        )
    }
}

impl ToolpathSink for PgmCompiler {
    fn emit_placed(&mut self, primitive: &Primitive, placement: &TransformStack) -> Result<(), CompileError> {
        self.emit_with(primitive, placement)
    }
}

/// Global transforms for the run: index compensation, flip, rotation,
/// origin shift and warp compensation.
fn global_stack(
    params: &CompilerParameters,
    surface: Option<Arc<dyn WarpSurface>>,
) -> Result<TransformStack, GeometryError> {
    let neff = params.neff();
    let flip = Transform::flip(params.flip_x, params.flip_y);
    let rotation = Transform::rotation(params.rotation_radians());

    let mut stack = TransformStack::new();
    if (neff - 1.0).abs() > EPSILON {
        stack.push(Transform::index_compensation(neff))?;
    }
    if params.flip_x || params.flip_y {
        stack.push(flip.clone())?;
    }
    if params.rotation_radians() != 0.0 {
        stack.push(rotation.clone())?;
    }
    // The origin shift acts before flip and rotation, so it is carried
    // through both.
    let shift = Point3::new(-params.new_origin.0, -params.new_origin.1, 0.0);
    let offset = rotation.apply_point(flip.apply_point(shift));
    if offset != Point3::origin() {
        stack.push(Transform::translation(offset))?;
    }
    if let Some(surface) = surface {
        stack.push(Transform::warp(WarpCompensation::for_index(surface, neff)))?;
    }
    Ok(stack)
}

fn same_state(a: &PathPoint, b: &PathPoint) -> bool {
    a.laser_on == b.laser_on && (a.feed_rate - b.feed_rate).abs() <= EPSILON
}

/// Whether `samples` lie in order on the chord `a -> b`.
fn on_chord<'a>(a: Point3, b: Point3, samples: impl IntoIterator<Item = &'a Point3>) -> bool {
    let origin = a.to_vector();
    let ab = b.to_vector() - origin;
    let len2 = ab.norm_squared();
    if len2 <= EPSILON * EPSILON {
        return false;
    }
    let mut previous = 0.0;
    samples.into_iter().all(|q| {
        let aq = q.to_vector() - origin;
        let t = aq.dot(&ab) / len2;
        let distance = (aq - ab * t).norm();
        let ordered = t >= previous - EPSILON && t <= 1.0 + EPSILON;
        previous = t;
        ordered && distance <= COLLINEAR_TOLERANCE
    })
}

/// Merges consecutive linear moves with the same feed and laser state
/// whose intermediate samples stay on the resulting chord.
fn collapse_collinear(moves: &[Move]) -> Vec<Move> {
    let mut out: Vec<Move> = Vec::with_capacity(moves.len());
    let mut absorbed: Vec<Point3> = Vec::new();
    for &m in moves {
        if let Move::Line(p) = m {
            if let [.., before, Move::Line(last)] = out.as_slice() {
                let (anchor, last) = (before.end().position, *last);
                let samples = absorbed.iter().chain(std::iter::once(&last.position));
                if same_state(&last, &p) && on_chord(anchor, p.position, samples) {
                    absorbed.push(last.position);
                    if let Some(slot) = out.last_mut() {
                        *slot = Move::Line(p);
                    }
                    continue;
                }
            }
        }
        absorbed.clear();
        out.push(m);
    }
    out
}
