//! Uniform handle table and the CPU shadow of the program's uniform block.
//!
//! Every uniform the background shader may declare is known at compile time,
//! so handles live in a fixed array indexed by [`UniformName`] instead of a
//! string map. A handle is the std140 word offset of the uniform inside the
//! block emitted by [`crate::compile`]; names a shader variant does not declare
//! keep the absent sentinel and their setters do nothing.

use std::fmt;

/// Value shapes supported inside the generated uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
}

impl UniformKind {
    pub fn from_glsl(ty: &str) -> Option<Self> {
        match ty {
            "float" => Some(Self::Float),
            "vec2" => Some(Self::Vec2),
            "vec3" => Some(Self::Vec3),
            "vec4" => Some(Self::Vec4),
            _ => None,
        }
    }

    pub fn glsl(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
        }
    }

    /// Number of 32-bit components.
    pub fn components(self) -> u32 {
        match self {
            Self::Float => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 => 4,
        }
    }

    /// std140 base alignment in 32-bit words.
    fn alignment(self) -> u32 {
        match self {
            Self::Float => 1,
            Self::Vec2 => 2,
            Self::Vec3 | Self::Vec4 => 4,
        }
    }
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glsl())
    }
}

macro_rules! uniform_names {
    ($($variant:ident => ($glsl:literal, $kind:ident)),+ $(,)?) => {
        /// Uniforms understood by the renderer.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum UniformName {
            $($variant),+
        }

        impl UniformName {
            pub const ALL: &'static [UniformName] = &[$(UniformName::$variant),+];
            pub const COUNT: usize = Self::ALL.len();

            /// Identifier used in shader source.
            pub fn glsl_name(self) -> &'static str {
                match self {
                    $(UniformName::$variant => $glsl),+
                }
            }

            /// Shape the renderer writes for this uniform.
            pub fn kind(self) -> UniformKind {
                match self {
                    $(UniformName::$variant => UniformKind::$kind),+
                }
            }
        }
    };
}

uniform_names! {
    Resolution => ("iResolution", Vec2),
    Time => ("iTime", Float),
    TimeSpeed => ("uTimeSpeed", Float),
    ColorBalance => ("uColorBalance", Float),
    WarpStrength => ("uWarpStrength", Float),
    WarpFrequency => ("uWarpFrequency", Float),
    WarpSpeed => ("uWarpSpeed", Float),
    WarpAmplitude => ("uWarpAmplitude", Float),
    BlendAngle => ("uBlendAngle", Float),
    BlendSoftness => ("uBlendSoftness", Float),
    RotationAmount => ("uRotationAmount", Float),
    NoiseScale => ("uNoiseScale", Float),
    GrainAmount => ("uGrainAmount", Float),
    GrainScale => ("uGrainScale", Float),
    GrainAnimated => ("uGrainAnimated", Float),
    Contrast => ("uContrast", Float),
    Gamma => ("uGamma", Float),
    Saturation => ("uSaturation", Float),
    CenterDarkness => ("uCenterDarkness", Float),
    CenterOffset => ("uCenterOffset", Vec2),
    Zoom => ("uZoom", Float),
    Color1 => ("uColor1", Vec3),
    Color2 => ("uColor2", Vec3),
    Color3 => ("uColor3", Vec3),
}

impl UniformName {
    fn index(self) -> usize {
        self as usize
    }

    pub fn from_glsl_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|known| known.glsl_name() == name)
    }
}

/// A uniform declared by a shader, placed at its std140 offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformSlot {
    pub name: String,
    pub kind: UniformKind,
    /// Offset in 32-bit words from the start of the block.
    pub offset: u32,
}

/// std140 layout of the uniform block generated for a fragment stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformLayout {
    slots: Vec<UniformSlot>,
    words: u32,
}

impl UniformLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a member, returning `false` when the name is already present.
    pub fn push(&mut self, name: &str, kind: UniformKind) -> bool {
        if self.slot(name).is_some() {
            return false;
        }
        let offset = align_up(self.words, kind.alignment());
        self.words = offset + kind.components();
        self.slots.push(UniformSlot {
            name: name.to_string(),
            kind,
            offset,
        });
        true
    }

    pub fn slots(&self) -> &[UniformSlot] {
        &self.slots
    }

    pub fn slot(&self, name: &str) -> Option<&UniformSlot> {
        self.slots.iter().find(|slot| slot.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Block size in bytes, padded to a 16-byte multiple as std140 requires.
    pub fn size_bytes(&self) -> u64 {
        u64::from(align_up(self.words.max(1), 4)) * 4
    }
}

fn align_up(value: u32, alignment: u32) -> u32 {
    value.div_ceil(alignment) * alignment
}

/// Opaque resolved reference to a uniform inside the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformHandle {
    offset: u32,
}

/// Resolved handles plus the block contents uploaded with every draw.
#[derive(Debug, Clone)]
pub struct UniformRegistry {
    handles: [Option<UniformHandle>; UniformName::COUNT],
    block: Vec<f32>,
}

impl UniformRegistry {
    /// Resolves every known name against `layout` once, after linking.
    pub fn resolve(layout: &UniformLayout) -> Self {
        let mut handles = [None; UniformName::COUNT];
        for name in UniformName::ALL.iter().copied() {
            let Some(slot) = layout.slot(name.glsl_name()) else {
                continue;
            };
            if slot.kind != name.kind() {
                tracing::warn!(
                    uniform = name.glsl_name(),
                    declared = %slot.kind,
                    expected = %name.kind(),
                    "uniform declared with an unexpected type; treating as absent"
                );
                continue;
            }
            handles[name.index()] = Some(UniformHandle {
                offset: slot.offset,
            });
        }
        let words = (layout.size_bytes() / 4) as usize;
        Self {
            handles,
            block: vec![0.0; words],
        }
    }

    pub fn handle(&self, name: UniformName) -> Option<UniformHandle> {
        self.handles[name.index()]
    }

    /// Number of known names the program actually declares.
    pub fn resolved_count(&self) -> usize {
        self.handles.iter().filter(|handle| handle.is_some()).count()
    }

    pub fn set_1f(&mut self, name: UniformName, x: f32) {
        self.write(name, UniformKind::Float, &[x]);
    }

    pub fn set_2f(&mut self, name: UniformName, x: f32, y: f32) {
        self.write(name, UniformKind::Vec2, &[x, y]);
    }

    pub fn set_3f(&mut self, name: UniformName, value: [f32; 3]) {
        self.write(name, UniformKind::Vec3, &value);
    }

    /// Current shadow value of `name`, or `None` when the program lacks it.
    pub fn value(&self, name: UniformName) -> Option<&[f32]> {
        let handle = self.handle(name)?;
        let start = handle.offset as usize;
        let len = name.kind().components() as usize;
        self.block.get(start..start + len)
    }

    /// Raw block contents in std140 layout.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.block)
    }

    fn write(&mut self, name: UniformName, kind: UniformKind, values: &[f32]) {
        if name.kind() != kind {
            tracing::debug!(
                uniform = name.glsl_name(),
                expected = %name.kind(),
                written = %kind,
                "ignoring uniform write with mismatched shape"
            );
            return;
        }
        let Some(handle) = self.handle(name) else {
            return;
        };
        let start = handle.offset as usize;
        if let Some(target) = self.block.get_mut(start..start + values.len()) {
            target.copy_from_slice(values);
        }
    }
}
