//! Comparable parameter values and the constant-or-texture slot.

use std::cmp::Ordering;

use serde::Serialize;

use crate::host::{EvalTime, HostMaterial, TextureHandle};

/// `f32` with IEEE total ordering so it can sit inside a map key.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(transparent)]
pub struct Scalar(pub f32);

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scalar {}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar(v)
    }
}

/// Linear RGB triple, ordered channel by channel.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(transparent)]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0.0, 0.0, 0.0]);
    pub const WHITE: Rgb = Rgb([1.0, 1.0, 1.0]);

    pub fn grey(v: f32) -> Self {
        Rgb([v, v, v])
    }
}

impl PartialEq for Rgb {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Rgb {}

impl PartialOrd for Rgb {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rgb {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| a.total_cmp(b))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl From<[f32; 3]> for Rgb {
    fn from(v: [f32; 3]) -> Self {
        Rgb(v)
    }
}

/// Either a constant or a texture, never both.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ParamSlot<T> {
    Constant(T),
    Texture(TextureHandle),
}

impl<T> ParamSlot<T> {
    pub fn texture(&self) -> Option<&TextureHandle> {
        match self {
            ParamSlot::Texture(t) => Some(t),
            ParamSlot::Constant(_) => None,
        }
    }

    pub fn constant(&self) -> Option<&T> {
        match self {
            ParamSlot::Constant(v) => Some(v),
            ParamSlot::Texture(_) => None,
        }
    }
}

/// Read `param` as a scalar slot. An enabled texture wins and the constant is not evaluated.
pub fn read_scalar(
    mat: &dyn HostMaterial,
    param: &str,
    time: EvalTime,
    default: f32,
) -> ParamSlot<Scalar> {
    if let Some(tex) = mat.texture(param) {
        return ParamSlot::Texture(tex);
    }
    ParamSlot::Constant(read_f32(mat, param, time, default))
}

pub fn read_rgb(
    mat: &dyn HostMaterial,
    param: &str,
    time: EvalTime,
    default: [f32; 3],
) -> ParamSlot<Rgb> {
    if let Some(tex) = mat.texture(param) {
        return ParamSlot::Texture(tex);
    }
    let v = mat
        .value(param, time)
        .and_then(|v| v.as_rgb())
        .unwrap_or(default);
    ParamSlot::Constant(Rgb(v))
}

/// Constant-only scalar read (parameters that never take a map).
pub fn read_f32(mat: &dyn HostMaterial, param: &str, time: EvalTime, default: f32) -> Scalar {
    Scalar(
        mat.value(param, time)
            .and_then(|v| v.as_f32())
            .unwrap_or(default),
    )
}

pub fn read_i32(mat: &dyn HostMaterial, param: &str, time: EvalTime, default: i32) -> i32 {
    mat.value(param, time)
        .and_then(|v| v.as_i32())
        .unwrap_or(default)
}

pub fn read_bool(mat: &dyn HostMaterial, param: &str, time: EvalTime, default: bool) -> bool {
    mat.value(param, time)
        .and_then(|v| v.as_bool())
        .unwrap_or(default)
}
