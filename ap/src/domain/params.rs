//! Typed parameter extraction for action descriptors
//!
//! Server params arrive as an open JSON object. Each accessor yields a typed
//! value, a default, or a `ParamError`; any error drops the whole descriptor.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Key holding the list of target actor names
pub const TARGETS_KEY: &str = "targetActors";

/// Why a parameter could not be extracted
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("missing required field '{0}'")]
    Missing(&'static str),

    #[error("field '{field}' has wrong type, expected {expected}")]
    WrongType { field: &'static str, expected: &'static str },

    #[error("field '{field}' out of range: {reason}")]
    OutOfRange { field: &'static str, reason: String },
}

pub type ParamResult<T> = Result<T, ParamError>;

/// Location / scale triple
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Vec3 = Vec3 { x: 1.0, y: 1.0, z: 1.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Rotation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotator {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl Rotator {
    pub const ZERO: Rotator = Rotator {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    pub fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }
}

impl std::fmt::Display for Rotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.pitch, self.yaw, self.roll)
    }
}

/// Planar coordinate, used by landscape brushes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Vec2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Borrowed view over a descriptor's `params` object
///
/// `null` values are treated the same as absent keys.
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Params<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    /// Required number
    pub fn f64_req(&self, key: &'static str) -> ParamResult<f64> {
        self.f64_opt(key)?.ok_or(ParamError::Missing(key))
    }

    /// Number with a default when absent
    pub fn f64_or(&self, key: &'static str, default: f64) -> ParamResult<f64> {
        Ok(self.f64_opt(key)?.unwrap_or(default))
    }

    pub fn f64_opt(&self, key: &'static str) -> ParamResult<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v.as_f64().map(Some).ok_or(ParamError::WrongType {
                field: key,
                expected: "number",
            }),
        }
    }

    /// Non-negative integer with a default; integral floats are accepted
    pub fn u64_or(&self, key: &'static str, default: u64) -> ParamResult<u64> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => as_whole(v).ok_or(ParamError::WrongType {
                field: key,
                expected: "non-negative integer",
            }),
        }
    }

    /// Count-like integer with a default and a lower bound of 1
    pub fn count_or(&self, key: &'static str, default: u32) -> ParamResult<u32> {
        let value = self.u64_or(key, u64::from(default))?;
        if value == 0 {
            return Err(ParamError::OutOfRange {
                field: key,
                reason: "must be at least 1".to_string(),
            });
        }
        u32::try_from(value).map_err(|_| ParamError::OutOfRange {
            field: key,
            reason: format!("{} is too large", value),
        })
    }

    pub fn u32_or(&self, key: &'static str, default: u32) -> ParamResult<u32> {
        let value = self.u64_or(key, u64::from(default))?;
        u32::try_from(value).map_err(|_| ParamError::OutOfRange {
            field: key,
            reason: format!("{} is too large", value),
        })
    }

    pub fn bool_or(&self, key: &'static str, default: bool) -> ParamResult<bool> {
        Ok(self.bool_opt(key)?.unwrap_or(default))
    }

    pub fn bool_opt(&self, key: &'static str) -> ParamResult<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v.as_bool().map(Some).ok_or(ParamError::WrongType {
                field: key,
                expected: "boolean",
            }),
        }
    }

    /// Required, non-empty string (surrounding whitespace trimmed)
    pub fn str_req(&self, key: &'static str) -> ParamResult<String> {
        self.str_opt(key)?.ok_or(ParamError::Missing(key))
    }

    pub fn str_or(&self, key: &'static str, default: &str) -> ParamResult<String> {
        Ok(self.str_opt(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// Optional string; an empty string counts as absent
    pub fn str_opt(&self, key: &'static str) -> ParamResult<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
            }
            Some(_) => Err(ParamError::WrongType {
                field: key,
                expected: "string",
            }),
        }
    }

    pub fn vec3_or(&self, key: &'static str, default: Vec3) -> ParamResult<Vec3> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => {
                let obj = object(v, key)?;
                Ok(Vec3 {
                    x: component(obj, "x", key)?,
                    y: component(obj, "y", key)?,
                    z: component(obj, "z", key)?,
                })
            }
        }
    }

    pub fn rotator_or(&self, key: &'static str, default: Rotator) -> ParamResult<Rotator> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => {
                let obj = object(v, key)?;
                Ok(Rotator {
                    pitch: component(obj, "pitch", key)?,
                    yaw: component(obj, "yaw", key)?,
                    roll: component(obj, "roll", key)?,
                })
            }
        }
    }

    pub fn vec2_req(&self, key: &'static str) -> ParamResult<Vec2> {
        self.vec2_opt(key)?.ok_or(ParamError::Missing(key))
    }

    pub fn vec2_opt(&self, key: &'static str) -> ParamResult<Option<Vec2>> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => {
                let obj = object(v, key)?;
                Ok(Some(Vec2 {
                    x: component(obj, "x", key)?,
                    y: component(obj, "y", key)?,
                }))
            }
        }
    }

    /// Target actor names; absent means "current selection" (empty list)
    pub fn targets(&self) -> ParamResult<Vec<String>> {
        let Some(value) = self.get(TARGETS_KEY) else {
            return Ok(Vec::new());
        };
        let wrong_type = ParamError::WrongType {
            field: TARGETS_KEY,
            expected: "array of strings",
        };
        let items = value.as_array().ok_or_else(|| wrong_type.clone())?;
        items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(|| wrong_type.clone()))
            .collect()
    }
}

fn object<'v>(value: &'v Value, field: &'static str) -> ParamResult<&'v Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        debug!(%field, "object: vector field is not an object");
        ParamError::WrongType {
            field,
            expected: "object",
        }
    })
}

fn component(obj: &Map<String, Value>, name: &str, field: &'static str) -> ParamResult<f64> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(0.0),
        Some(v) => v.as_f64().ok_or(ParamError::WrongType {
            field,
            expected: "numeric components",
        }),
    }
}

fn as_whole(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}
