//! Rhai script runtime
//!
//! Level scripts are plain Rhai files defining any of the callbacks
//! `on_load()`, `on_step()`, `on_increment()`, `on_update(dt)` and
//! `on_unload()`, plus whatever helpers they schedule with `schedule_call`.
//!
//! The engine is sandboxed: operation, call depth and container size limits
//! turn runaway scripts into ordinary call errors, and `eval` is disabled.

use rhai::{CallFnOptions, Dynamic, Engine, EvalAltResult, ImmutableString, Scope, AST};

use super::{ScriptBridge, ScriptCommand, ScriptError, ScriptRuntime, ScriptValue};

const MAX_OPERATIONS: u64 = 500_000;
const MAX_CALL_LEVELS: usize = 32;
const MAX_EXPR_DEPTH: usize = 64;
const MAX_FN_EXPR_DEPTH: usize = 32;
const MAX_STRING_SIZE: usize = 4096;
const MAX_ARRAY_SIZE: usize = 4096;
const MAX_MAP_SIZE: usize = 1024;

type FnResult<T> = Result<T, Box<EvalAltResult>>;

pub struct RhaiRuntime {
    engine: Engine,
    ast: Option<AST>,
    scope: Scope<'static>,
    name: String,
    bridge: ScriptBridge,
}

impl Default for RhaiRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl RhaiRuntime {
    pub fn new() -> Self {
        let bridge = ScriptBridge::default();
        let mut engine = Engine::new();
        engine.set_fast_operators(true);
        engine.set_max_operations(MAX_OPERATIONS);
        engine.set_max_call_levels(MAX_CALL_LEVELS);
        engine.set_max_expr_depths(MAX_EXPR_DEPTH, MAX_FN_EXPR_DEPTH);
        engine.set_max_string_size(MAX_STRING_SIZE);
        engine.set_max_array_size(MAX_ARRAY_SIZE);
        engine.set_max_map_size(MAX_MAP_SIZE);
        engine.disable_symbol("eval");
        engine.on_print(|text| log::info!(target: "script", "{}", text));
        engine.on_debug(|text, source, pos| {
            log::debug!(target: "script", "{} {:?}: {}", source.unwrap_or("script"), pos, text)
        });
        register_api(&mut engine, &bridge);

        Self {
            engine,
            ast: None,
            scope: Scope::new(),
            name: String::new(),
            bridge,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ScriptRuntime for RhaiRuntime {
    fn load(&mut self, name: &str, source: &str) -> Result<(), ScriptError> {
        let ast = self
            .engine
            .compile(source)
            .map_err(|err| ScriptError::Compile {
                name: name.to_string(),
                message: err.to_string(),
            })?;

        // Top-level statements run once to set up constants
        let mut scope = Scope::new();
        self.engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|err| ScriptError::Compile {
                name: name.to_string(),
                message: err.to_string(),
            })?;
        let stray = self.bridge.take_commands();
        if !stray.is_empty() {
            log::warn!(
                "Script `{}` issued {} commands at top level; ignored",
                name,
                stray.len()
            );
        }

        log::info!(
            "Loaded script `{}` ({} functions)",
            name,
            ast.iter_functions().count()
        );
        self.ast = Some(ast);
        self.scope = scope;
        self.name = name.to_string();
        Ok(())
    }

    fn has_function(&self, name: &str, arity: usize) -> bool {
        self.ast.as_ref().is_some_and(|ast| {
            ast.iter_functions()
                .any(|f| f.name == name && f.params.len() == arity)
        })
    }

    fn call(&mut self, name: &str, args: &[ScriptValue]) -> Result<ScriptValue, ScriptError> {
        let ast = self.ast.as_ref().ok_or(ScriptError::NoScript)?;
        let args: Vec<Dynamic> = args.iter().map(to_dynamic).collect();
        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
        self.engine
            .call_fn_with_options::<Dynamic>(options, &mut self.scope, ast, name, args)
            .map(from_dynamic)
            .map_err(|err| ScriptError::Runtime {
                function: name.to_string(),
                message: err.to_string(),
            })
    }

    fn bridge(&self) -> &ScriptBridge {
        &self.bridge
    }
}

fn to_dynamic(value: &ScriptValue) -> Dynamic {
    match value {
        ScriptValue::Unit => Dynamic::UNIT,
        ScriptValue::Bool(b) => Dynamic::from_bool(*b),
        ScriptValue::Int(i) => Dynamic::from_int(*i),
        ScriptValue::Float(f) => Dynamic::from_float(*f),
        ScriptValue::Str(s) => Dynamic::from(s.clone()),
    }
}

fn from_dynamic(value: Dynamic) -> ScriptValue {
    if value.is_unit() {
        ScriptValue::Unit
    } else if let Ok(b) = value.as_bool() {
        ScriptValue::Bool(b)
    } else if let Ok(i) = value.as_int() {
        ScriptValue::Int(i)
    } else if let Ok(f) = value.as_float() {
        ScriptValue::Float(f)
    } else {
        ScriptValue::Str(value.to_string())
    }
}

/// Accept both Rhai ints and floats where a number is expected
fn number(function: &str, value: &Dynamic) -> FnResult<f32> {
    if let Ok(f) = value.as_float() {
        return Ok(f as f32);
    }
    if let Ok(i) = value.as_int() {
        return Ok(i as f32);
    }
    Err(format!("{}: expected a number, got {}", function, value.type_name()).into())
}

/// Non-finite numbers are dropped with a warning instead of reaching the run
fn finite(function: &str, values: &[f32]) -> bool {
    if values.iter().all(|v| v.is_finite()) {
        true
    } else {
        log::warn!(target: "script", "{} received non-finite values; command ignored", function);
        false
    }
}

fn register_api(engine: &mut Engine, bridge: &ScriptBridge) {
    register_setters(engine, bridge);
    register_timeline(engine, bridge);
    register_effects(engine, bridge);
    register_getters(engine, bridge);

    engine.register_fn("log", |message: ImmutableString| {
        log::info!(target: "script", "{}", message);
    });
}

fn register_setters(engine: &mut Engine, bridge: &ScriptBridge) {
    let b = bridge.clone();
    engine.register_fn(
        "set_level_value",
        move |name: ImmutableString, value: Dynamic| -> FnResult<()> {
            let value = number("set_level_value", &value)?;
            if finite("set_level_value", &[value]) {
                b.push(ScriptCommand::SetLevelValue {
                    name: name.to_string(),
                    value,
                });
            }
            Ok(())
        },
    );

    for (function, value_name) in [
        ("set_speed_mult", "speed_multiplier"),
        ("set_delay_mult", "delay_multiplier"),
        ("set_rotation_speed", "rotation_speed"),
        ("set_sides", "sides"),
    ] {
        let b = bridge.clone();
        engine.register_fn(function, move |value: Dynamic| -> FnResult<()> {
            let value = number(function, &value)?;
            if finite(function, &[value]) {
                b.push(ScriptCommand::SetLevelValue {
                    name: value_name.to_string(),
                    value,
                });
            }
            Ok(())
        });
    }

    let b = bridge.clone();
    engine.register_fn("set_increment_enabled", move |enabled: bool| {
        b.push(ScriptCommand::SetIncrementEnabled(enabled));
    });
    let b = bridge.clone();
    engine.register_fn("set_side_changes_enabled", move |enabled: bool| {
        b.push(ScriptCommand::SetSideChangesEnabled(enabled));
    });
}

fn register_timeline(engine: &mut Engine, bridge: &ScriptBridge) {
    let b = bridge.clone();
    engine.register_fn("wall", move |side: i64, thickness: Dynamic| -> FnResult<()> {
        let thickness = number("wall", &thickness)?;
        if finite("wall", &[thickness]) {
            b.push(ScriptCommand::Wall {
                side,
                thickness,
                speed_adj: 1.0,
            });
        }
        Ok(())
    });

    let b = bridge.clone();
    engine.register_fn(
        "wall_adj",
        move |side: i64, thickness: Dynamic, speed_adj: Dynamic| -> FnResult<()> {
            let thickness = number("wall_adj", &thickness)?;
            let speed_adj = number("wall_adj", &speed_adj)?;
            if finite("wall_adj", &[thickness, speed_adj]) {
                b.push(ScriptCommand::Wall {
                    side,
                    thickness,
                    speed_adj,
                });
            }
            Ok(())
        },
    );

    let b = bridge.clone();
    engine.register_fn("wait", move |duration: Dynamic| -> FnResult<()> {
        let duration = number("wait", &duration)?;
        if finite("wait", &[duration]) {
            b.push(ScriptCommand::Wait(duration));
        }
        Ok(())
    });

    let b = bridge.clone();
    engine.register_fn("schedule_call", move |function: ImmutableString| {
        b.push(ScriptCommand::ScheduleCall(function.to_string()));
    });

    let b = bridge.clone();
    engine.register_fn("timeline_clear", move || b.push(ScriptCommand::ClearTimeline));
}

fn register_effects(engine: &mut Engine, bridge: &ScriptBridge) {
    for (function, important) in [("message_add", false), ("message_important_add", true)] {
        let b = bridge.clone();
        engine.register_fn(
            function,
            move |text: ImmutableString, duration: Dynamic| -> FnResult<()> {
                let duration = number(function, &duration)?;
                if finite(function, &[duration]) {
                    b.push(ScriptCommand::Message {
                        text: text.to_string(),
                        duration,
                        important,
                    });
                }
                Ok(())
            },
        );
    }

    let b = bridge.clone();
    engine.register_fn("message_clear", move || b.push(ScriptCommand::ClearMessages));

    let b = bridge.clone();
    engine.register_fn("time_stop", move |duration: Dynamic| -> FnResult<()> {
        let duration = number("time_stop", &duration)?;
        if finite("time_stop", &[duration]) {
            b.push(ScriptCommand::TimeStop(duration));
        }
        Ok(())
    });

    let b = bridge.clone();
    engine.register_fn("flash", move |intensity: Dynamic| -> FnResult<()> {
        let intensity = number("flash", &intensity)?;
        if finite("flash", &[intensity]) {
            b.push(ScriptCommand::Flash(intensity));
        }
        Ok(())
    });

    let b = bridge.clone();
    engine.register_fn("request_side_change", move || {
        b.push(ScriptCommand::RequestSideChange)
    });
    let b = bridge.clone();
    engine.register_fn("force_increment", move || b.push(ScriptCommand::ForceIncrement));
    let b = bridge.clone();
    engine.register_fn("reverse_rotation", move || b.push(ScriptCommand::ReverseRotation));
    let b = bridge.clone();
    engine.register_fn("play_sound", move |id: ImmutableString| {
        b.push(ScriptCommand::PlaySound(id.to_string()));
    });
}

fn register_getters(engine: &mut Engine, bridge: &ScriptBridge) {
    let b = bridge.clone();
    engine.register_fn("get_sides", move || b.read(|s| s.sides as i64));
    let b = bridge.clone();
    engine.register_fn("get_half_sides", move || b.read(|s| (s.sides / 2) as i64));
    let b = bridge.clone();
    engine.register_fn("get_random_side", move || b.random_side());
    let b = bridge.clone();
    engine.register_fn("get_speed_mult", move || b.read(|s| s.speed_mult as f64));
    let b = bridge.clone();
    engine.register_fn("get_delay_mult", move || b.read(|s| s.delay_mult as f64));
    let b = bridge.clone();
    engine.register_fn("get_difficulty_mult", move || {
        b.read(|s| s.difficulty_mult as f64)
    });
    let b = bridge.clone();
    engine.register_fn("get_rotation_speed", move || {
        b.read(|s| s.rotation_speed as f64)
    });
    let b = bridge.clone();
    engine.register_fn("get_level_time", move || b.read(|s| s.level_time as f64));
    let b = bridge.clone();
    engine.register_fn(
        "get_level_value",
        move |name: ImmutableString| -> FnResult<f64> {
            b.read(|s| s.values.get(name.as_str()).copied())
                .map(|v| v as f64)
                .ok_or_else(|| format!("unknown level value `{}`", name).into())
        },
    );

    let b = bridge.clone();
    engine.register_fn("random_int", move |min: i64, max: i64| b.random_int(min, max));
    let b = bridge.clone();
    engine.register_fn(
        "random_float",
        move |min: Dynamic, max: Dynamic| -> FnResult<f64> {
            let min = number("random_float", &min)? as f64;
            let max = number("random_float", &max)? as f64;
            Ok(b.random_float(min, max))
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::HostSnapshot;

    fn load(source: &str) -> RhaiRuntime {
        let mut rt = RhaiRuntime::new();
        rt.load("test", source).unwrap();
        rt
    }

    #[test]
    fn test_callbacks_queue_commands() {
        let mut rt = load(
            r#"
            fn on_step() {
                wall(0, 40);
                wait(0.5);
                wall_adj(3, 40.0, 1.5);
                schedule_call("later");
            }
            "#,
        );
        assert!(rt.has_function("on_step", 0));
        rt.call("on_step", &[]).unwrap();
        assert_eq!(
            rt.bridge().take_commands(),
            vec![
                ScriptCommand::Wall {
                    side: 0,
                    thickness: 40.0,
                    speed_adj: 1.0
                },
                ScriptCommand::Wait(0.5),
                ScriptCommand::Wall {
                    side: 3,
                    thickness: 40.0,
                    speed_adj: 1.5
                },
                ScriptCommand::ScheduleCall("later".into()),
            ]
        );
    }

    #[test]
    fn test_arity_is_checked() {
        let rt = load("fn on_update(dt) { } fn on_load() { }");
        assert!(rt.has_function("on_update", 1));
        assert!(!rt.has_function("on_update", 0));
        assert!(rt.has_function("on_load", 0));
        assert!(!rt.has_function("on_step", 0));
    }

    #[test]
    fn test_getters_read_snapshot() {
        let mut rt = load(
            r#"
            fn half() { get_half_sides() }
            fn speed() { get_speed_mult() }
            fn value() { get_level_value("pulse_max") }
            "#,
        );
        let mut snapshot = HostSnapshot {
            sides: 6,
            speed_mult: 1.5,
            ..Default::default()
        };
        snapshot.values.insert("pulse_max".into(), 80.0);
        rt.bridge().sync(snapshot);

        assert_eq!(rt.call("half", &[]).unwrap(), ScriptValue::Int(3));
        assert_eq!(rt.call("speed", &[]).unwrap(), ScriptValue::Float(1.5));
        assert_eq!(rt.call("value", &[]).unwrap(), ScriptValue::Float(80.0));
    }

    #[test]
    fn test_args_are_passed() {
        let mut rt = load("fn double(x) { x * 2.0 }");
        assert_eq!(
            rt.call("double", &[ScriptValue::Float(1.25)]).unwrap(),
            ScriptValue::Float(2.5)
        );
    }

    #[test]
    fn test_runtime_error_is_reported() {
        let mut rt = load(r#"fn on_step() { wall(0, "thick"); }"#);
        let err = rt.call("on_step", &[]).unwrap_err();
        assert!(matches!(err, ScriptError::Runtime { ref function, .. } if function == "on_step"));
    }

    #[test]
    fn test_infinite_loop_is_stopped() {
        let mut rt = load("fn on_step() { loop { } }");
        assert!(rt.call("on_step", &[]).is_err());
    }

    #[test]
    fn test_eval_is_disabled() {
        let mut rt = RhaiRuntime::new();
        let err = rt.load("bad", r#"fn f() { eval("1") }"#).unwrap_err();
        assert!(matches!(err, ScriptError::Compile { .. }));
    }

    #[test]
    fn test_compile_error_keeps_previous_script() {
        let mut rt = load("fn on_step() { }");
        assert!(rt.load("broken", "fn on_step( {").is_err());
        assert!(rt.has_function("on_step", 0));
        assert_eq!(rt.name(), "test");
    }

    #[test]
    fn test_ints_accepted_as_numbers() {
        let mut rt = load("fn on_step() { flash(10); time_stop(0.5); }");
        rt.call("on_step", &[]).unwrap();
        assert_eq!(
            rt.bridge().take_commands(),
            vec![ScriptCommand::Flash(10.0), ScriptCommand::TimeStop(0.5)]
        );
    }

    #[test]
    fn test_non_finite_values_are_dropped() {
        assert!(!finite("flash", &[f32::NAN]));
        assert!(!finite("wall_adj", &[1.0, f32::INFINITY]));
        assert!(finite("wall_adj", &[1.0, 2.0]));
    }
}
