use log::warn;
use std::fmt;
use tiny_skia::BlendMode as SkiaBlendMode;

/// Pixel combination used when one buffer is drawn onto another.
///
/// The set mirrors the canvas `globalCompositeOperation` values that the
/// document blend modes are mapped onto.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum CompositeOp {
    #[default]
    SourceOver,
    Lighter,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl CompositeOp {
    pub fn skia_blend_mode(self) -> SkiaBlendMode {
        match self {
            CompositeOp::SourceOver => SkiaBlendMode::SourceOver,
            CompositeOp::Lighter => SkiaBlendMode::Plus,
            CompositeOp::Multiply => SkiaBlendMode::Multiply,
            CompositeOp::Screen => SkiaBlendMode::Screen,
            CompositeOp::Overlay => SkiaBlendMode::Overlay,
            CompositeOp::Darken => SkiaBlendMode::Darken,
            CompositeOp::Lighten => SkiaBlendMode::Lighten,
            CompositeOp::ColorDodge => SkiaBlendMode::ColorDodge,
            CompositeOp::ColorBurn => SkiaBlendMode::ColorBurn,
            CompositeOp::HardLight => SkiaBlendMode::HardLight,
            CompositeOp::SoftLight => SkiaBlendMode::SoftLight,
            CompositeOp::Difference => SkiaBlendMode::Difference,
            CompositeOp::Exclusion => SkiaBlendMode::Exclusion,
            CompositeOp::Hue => SkiaBlendMode::Hue,
            CompositeOp::Saturation => SkiaBlendMode::Saturation,
            CompositeOp::Color => SkiaBlendMode::Color,
            CompositeOp::Luminosity => SkiaBlendMode::Luminosity,
        }
    }
}

/// One row of the document blend-mode table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendMode {
    /// Four-character key as stored in the binary document.
    pub key: &'static str,
    /// Name used by exported node lists.
    pub name: &'static str,
    /// `None` for modes with no standard operator.
    pub op: Option<CompositeOp>,
}

pub const PASSTHRU: &str = "passthru";

pub const BLEND_MODES: &[BlendMode] = &[
    BlendMode { key: "pass", name: PASSTHRU, op: None },
    BlendMode { key: "norm", name: "normal", op: Some(CompositeOp::SourceOver) },
    BlendMode { key: "mul ", name: "multiply", op: Some(CompositeOp::Multiply) },
    // Linear dodge differs between editors; lighter is the additive one.
    BlendMode { key: "lddg", name: "linear_dodge", op: Some(CompositeOp::Lighter) },
    BlendMode { key: "fsub", name: "subtract", op: None },
    BlendMode { key: "fdiv", name: "divide", op: None },
    BlendMode { key: "over", name: "overlay", op: Some(CompositeOp::Overlay) },
    BlendMode { key: "scrn", name: "screen", op: Some(CompositeOp::Screen) },
    BlendMode { key: "lite", name: "lighten", op: Some(CompositeOp::Lighten) },
    BlendMode { key: "dark", name: "darken", op: Some(CompositeOp::Darken) },
    BlendMode { key: "diff", name: "difference", op: Some(CompositeOp::Difference) },
    BlendMode { key: "smud", name: "exclusion", op: Some(CompositeOp::Exclusion) },
    BlendMode { key: "div ", name: "color_dodge", op: Some(CompositeOp::ColorDodge) },
    BlendMode { key: "idiv", name: "color_burn", op: Some(CompositeOp::ColorBurn) },
    BlendMode { key: "sLit", name: "soft_light", op: Some(CompositeOp::SoftLight) },
    BlendMode { key: "hLit", name: "hard_light", op: Some(CompositeOp::HardLight) },
    BlendMode { key: "hue ", name: "hue", op: Some(CompositeOp::Hue) },
    BlendMode { key: "sat ", name: "saturation", op: Some(CompositeOp::Saturation) },
    BlendMode { key: "colr", name: "color", op: Some(CompositeOp::Color) },
    BlendMode { key: "lum ", name: "luminosity", op: Some(CompositeOp::Luminosity) },
    BlendMode { key: "diss", name: "dissolve", op: None },
    BlendMode { key: "lbrn", name: "linear_burn", op: None },
    BlendMode { key: "vLit", name: "vivid_light", op: None },
    BlendMode { key: "lLit", name: "linear_light", op: None },
    BlendMode { key: "pLit", name: "pin_light", op: None },
    BlendMode { key: "hMix", name: "hard_mix", op: None },
    BlendMode { key: "dkCl", name: "darker_color", op: None },
    BlendMode { key: "lgCl", name: "lighter_color", op: None },
];

/// Looks a code up by exported name first, then by four-character key.
pub fn find(code: &str) -> Option<&'static BlendMode> {
    BLEND_MODES.iter().find(|m| m.name == code).or_else(|| BLEND_MODES.iter().find(|m| m.key == code))
}

/// The operator for `code`, if the table has one.
pub fn operator(code: &str) -> Option<CompositeOp> {
    find(code).and_then(|mode| mode.op)
}

pub fn is_passthrough(code: &str) -> bool {
    find(code).map(|m| m.name == PASSTHRU).unwrap_or(false)
}

/// Resolves `code` to a paint operator, falling back to source-over.
///
/// The fallback is logged against `owner` and the render goes on.
pub fn resolve(code: &str, owner: impl fmt::Display) -> CompositeOp {
    operator(code).unwrap_or_else(|| {
        warn!("{}: unsupported blend mode {:?}, drawing with source-over", owner, code);
        CompositeOp::SourceOver
    })
}
