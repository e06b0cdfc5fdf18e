//! Level scripting
//!
//! Scripts never touch the run directly. Every host function a script calls
//! either reads a snapshot synced before the call or queues a
//! [`ScriptCommand`]; the update driver applies the queue once the call has
//! returned successfully. A failed call discards its queue, so a broken script
//! can never leave the run half-mutated.

pub mod rhai_runtime;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use thiserror::Error;

pub use rhai_runtime::RhaiRuntime;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("failed to compile script `{name}`: {message}")]
    Compile { name: String, message: String },
    #[error("script function `{function}` failed: {message}")]
    Runtime { function: String, message: String },
    #[error("script function `{function}` returned {found}, expected {expected}")]
    Type {
        function: String,
        expected: &'static str,
        found: String,
    },
    #[error("no script loaded")]
    NoScript,
}

/// Value crossing the script boundary
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScriptValue {
    #[default]
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ScriptValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Unit => "()",
            ScriptValue::Bool(_) => "bool",
            ScriptValue::Int(_) => "int",
            ScriptValue::Float(_) => "float",
            ScriptValue::Str(_) => "string",
        }
    }
}

/// Conversion from a script return value
pub trait FromScriptValue: Sized + Default {
    const EXPECTED: &'static str;
    fn from_script_value(value: &ScriptValue) -> Option<Self>;
}

impl FromScriptValue for () {
    const EXPECTED: &'static str = "any";
    // Return values of procedures are ignored
    fn from_script_value(_: &ScriptValue) -> Option<Self> {
        Some(())
    }
}

impl FromScriptValue for bool {
    const EXPECTED: &'static str = "bool";
    fn from_script_value(value: &ScriptValue) -> Option<Self> {
        match value {
            ScriptValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromScriptValue for i64 {
    const EXPECTED: &'static str = "int";
    fn from_script_value(value: &ScriptValue) -> Option<Self> {
        match value {
            ScriptValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromScriptValue for f32 {
    const EXPECTED: &'static str = "number";
    fn from_script_value(value: &ScriptValue) -> Option<Self> {
        match value {
            ScriptValue::Float(f) => Some(*f as f32),
            ScriptValue::Int(i) => Some(*i as f32),
            _ => None,
        }
    }
}

impl FromScriptValue for String {
    const EXPECTED: &'static str = "string";
    fn from_script_value(value: &ScriptValue) -> Option<Self> {
        match value {
            ScriptValue::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Read-only view of the run that script getters see
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostSnapshot {
    pub sides: u32,
    /// Effective (difficulty-scaled) wall speed multiplier
    pub speed_mult: f32,
    /// Effective (difficulty-scaled) delay multiplier
    pub delay_mult: f32,
    pub difficulty_mult: f32,
    pub rotation_speed: f32,
    pub level_time: f32,
    pub values: HashMap<String, f32>,
}

/// Mutations a script asked for, applied after the call returns
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    SetLevelValue { name: String, value: f32 },
    Wall { side: i64, thickness: f32, speed_adj: f32 },
    Wait(f32),
    ScheduleCall(String),
    Message { text: String, duration: f32, important: bool },
    ClearMessages,
    TimeStop(f32),
    Flash(f32),
    RequestSideChange,
    ForceIncrement,
    ReverseRotation,
    PlaySound(String),
    ClearTimeline,
    SetIncrementEnabled(bool),
    SetSideChangesEnabled(bool),
}

#[derive(Debug)]
struct BridgeState {
    commands: Vec<ScriptCommand>,
    snapshot: HostSnapshot,
    rng: Pcg32,
}

/// Shared channel between registered host functions and the host
#[derive(Debug, Clone)]
pub struct ScriptBridge {
    state: Rc<RefCell<BridgeState>>,
}

impl Default for ScriptBridge {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ScriptBridge {
    pub fn new(seed: u64) -> Self {
        Self {
            state: Rc::new(RefCell::new(BridgeState {
                commands: Vec::new(),
                snapshot: HostSnapshot::default(),
                rng: Pcg32::seed_from_u64(seed),
            })),
        }
    }

    pub fn push(&self, command: ScriptCommand) {
        self.state.borrow_mut().commands.push(command);
    }

    pub fn take_commands(&self) -> Vec<ScriptCommand> {
        std::mem::take(&mut self.state.borrow_mut().commands)
    }

    pub fn discard(&self) {
        self.state.borrow_mut().commands.clear();
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().commands.len()
    }

    pub fn sync(&self, snapshot: HostSnapshot) {
        self.state.borrow_mut().snapshot = snapshot;
    }

    pub fn reseed(&self, seed: u64) {
        self.state.borrow_mut().rng = Pcg32::seed_from_u64(seed);
    }

    /// Read from the current snapshot
    pub fn read<T>(&self, f: impl FnOnce(&HostSnapshot) -> T) -> T {
        f(&self.state.borrow().snapshot)
    }

    pub fn random_side(&self) -> i64 {
        let mut state = self.state.borrow_mut();
        let sides = state.snapshot.sides.max(1);
        state.rng.random_range(0..sides) as i64
    }

    /// Uniform integer in `[min, max]`, bounds in either order
    pub fn random_int(&self, min: i64, max: i64) -> i64 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.state.borrow_mut().rng.random_range(lo..=hi)
    }

    /// Uniform float in `[min, max)`; empty ranges return `min`
    pub fn random_float(&self, min: f64, max: f64) -> f64 {
        if !min.is_finite() || !max.is_finite() || (max - min).abs() <= f64::EPSILON {
            return if min.is_finite() { min } else { 0.0 };
        }
        let (lo, hi) = if min < max { (min, max) } else { (max, min) };
        self.state.borrow_mut().rng.random_range(lo..hi)
    }
}

/// Capability interface of a script engine
pub trait ScriptRuntime {
    /// Compile `source`; on error the previously loaded script stays active
    fn load(&mut self, name: &str, source: &str) -> Result<(), ScriptError>;
    fn has_function(&self, name: &str, arity: usize) -> bool;
    fn call(&mut self, name: &str, args: &[ScriptValue]) -> Result<ScriptValue, ScriptError>;
    fn bridge(&self) -> &ScriptBridge;
}

/// Builds a fresh runtime for every loaded level
pub type ScriptFactory = Box<dyn Fn() -> Box<dyn ScriptRuntime>>;

pub fn rhai_factory() -> ScriptFactory {
    Box::new(|| Box::new(RhaiRuntime::new()) as Box<dyn ScriptRuntime>)
}

/// Result of one host-side script call
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptOutcome<R> {
    pub value: R,
    pub commands: Vec<ScriptCommand>,
    pub failed: bool,
}

impl<R: Default> ScriptOutcome<R> {
    fn empty() -> Self {
        Self {
            value: R::default(),
            commands: Vec::new(),
            failed: false,
        }
    }
}

/// Owns the runtime of the active level and isolates its failures
#[derive(Default)]
pub struct ScriptHost {
    runtime: Option<Box<dyn ScriptRuntime>>,
    failures: u32,
    last_error: Option<ScriptError>,
}

impl std::fmt::Debug for ScriptHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptHost")
            .field("loaded", &self.runtime.is_some())
            .field("failures", &self.failures)
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl ScriptHost {
    /// Host without a script; every call is a silent no-op
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile `source` into a fresh runtime
    pub fn compile(
        factory: &ScriptFactory,
        name: &str,
        source: &str,
        seed: u64,
    ) -> Result<Self, ScriptError> {
        let mut runtime = factory();
        runtime.load(name, source)?;
        runtime.bridge().reseed(seed);
        Ok(Self {
            runtime: Some(runtime),
            failures: 0,
            last_error: None,
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.runtime.is_some()
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn last_error(&self) -> Option<&ScriptError> {
        self.last_error.as_ref()
    }

    pub fn has_function(&self, name: &str, arity: usize) -> bool {
        self.runtime
            .as_ref()
            .is_some_and(|rt| rt.has_function(name, arity))
    }

    /// Refresh the state script getters read
    pub fn sync(&self, snapshot: HostSnapshot) {
        if let Some(runtime) = &self.runtime {
            runtime.bridge().sync(snapshot);
        }
    }

    /// Call `name` if the script defines it.
    ///
    /// Missing functions are not an error. Failures are logged, counted and
    /// yield the default value with no commands.
    pub fn run_function<R: FromScriptValue>(
        &mut self,
        name: &str,
        args: &[ScriptValue],
    ) -> ScriptOutcome<R> {
        let Some(runtime) = self.runtime.as_mut() else {
            return ScriptOutcome::empty();
        };
        if !runtime.has_function(name, args.len()) {
            return ScriptOutcome::empty();
        }

        runtime.bridge().discard();
        match runtime.call(name, args) {
            Ok(value) => {
                let commands = runtime.bridge().take_commands();
                let value = match R::from_script_value(&value) {
                    Some(v) => v,
                    None => {
                        let err = ScriptError::Type {
                            function: name.to_string(),
                            expected: R::EXPECTED,
                            found: value.type_name().to_string(),
                        };
                        log::warn!("{}", err);
                        self.last_error = Some(err);
                        R::default()
                    }
                };
                ScriptOutcome {
                    value,
                    commands,
                    failed: false,
                }
            }
            Err(err) => {
                runtime.bridge().discard();
                log::error!("{}", err);
                self.failures += 1;
                self.last_error = Some(err);
                ScriptOutcome {
                    value: R::default(),
                    commands: Vec::new(),
                    failed: true,
                }
            }
        }
    }
}
