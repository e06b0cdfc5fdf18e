//! Level-authored events
//!
//! Levels ship a static schedule of timed events in their JSON file. Scripts
//! can also inject events at runtime through `HexagonGame::execute_events`.
//! Execution lives in the update driver; this module only defines the event
//! kinds and the arithmetic on level values.

use serde::{Deserialize, Serialize};

use crate::data::{LevelData, LevelValueError};

/// An event with its offset on the event timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Seconds since run start
    #[serde(default)]
    pub time: f32,
    #[serde(flatten)]
    pub event: LevelEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LevelEvent {
    MessageAdd {
        message: String,
        #[serde(default = "default_message_duration")]
        duration: f32,
    },
    /// Also shown on replays, not only on the first play
    MessageImportantAdd {
        message: String,
        #[serde(default = "default_message_duration")]
        duration: f32,
    },
    MessageClear,
    TimeStop {
        duration: f32,
    },
    /// Push the main timeline cursor forward
    TimelineWait {
        duration: f32,
    },
    TimelineClear,
    #[serde(alias = "level_int_set")]
    LevelFloatSet {
        value_name: String,
        value: f32,
    },
    #[serde(alias = "level_int_add")]
    LevelFloatAdd {
        value_name: String,
        value: f32,
    },
    #[serde(alias = "level_int_subtract")]
    LevelFloatSubtract {
        value_name: String,
        value: f32,
    },
    #[serde(alias = "level_int_multiply")]
    LevelFloatMultiply {
        value_name: String,
        value: f32,
    },
    #[serde(alias = "level_int_divide")]
    LevelFloatDivide {
        value_name: String,
        value: f32,
    },
    IncrementStop,
    IncrementStart,
    SideChangingStop,
    SideChangingRestart,
    Flash {
        #[serde(default = "default_flash")]
        intensity: f32,
    },
    RotationReverse,
    PlaySound {
        id: String,
    },
    ScriptCall {
        function: String,
    },
    LevelChange {
        id: String,
    },
    Menu,
}

fn default_message_duration() -> f32 {
    2.0
}

fn default_flash() -> f32 {
    crate::consts::FLASH_MAX
}

/// Arithmetic applied to a named level value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueOp {
    Set,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ValueOp {
    /// Combine the current value with `operand`, then store it through the
    /// validated setter. Returns the applied value.
    pub fn apply(self, level: &mut LevelData, name: &str, operand: f32) -> Result<f32, LevelValueError> {
        let current = level
            .value(name)
            .ok_or_else(|| LevelValueError::Unknown(name.to_string()))?;
        let next = match self {
            ValueOp::Set => operand,
            ValueOp::Add => current + operand,
            ValueOp::Subtract => current - operand,
            ValueOp::Multiply => current * operand,
            ValueOp::Divide => {
                if operand == 0.0 {
                    return Err(LevelValueError::DivideByZero(name.to_string()));
                }
                current / operand
            }
        };
        level.set_value(name, next)
    }
}

impl LevelEvent {
    /// Level value arithmetic carried by this event, if any
    pub fn value_op(&self) -> Option<(ValueOp, &str, f32)> {
        let (op, name, value) = match self {
            LevelEvent::LevelFloatSet { value_name, value } => (ValueOp::Set, value_name, value),
            LevelEvent::LevelFloatAdd { value_name, value } => (ValueOp::Add, value_name, value),
            LevelEvent::LevelFloatSubtract { value_name, value } => {
                (ValueOp::Subtract, value_name, value)
            }
            LevelEvent::LevelFloatMultiply { value_name, value } => {
                (ValueOp::Multiply, value_name, value)
            }
            LevelEvent::LevelFloatDivide { value_name, value } => {
                (ValueOp::Divide, value_name, value)
            }
            _ => return None,
        };
        Some((op, name.as_str(), *value))
    }
}
