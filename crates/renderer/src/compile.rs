//! Shader program builder.
//!
//! Sources are written against the WebGL-style interface (loose `uniform`
//! declarations, unqualified `in`/`out` variables). Before compilation each
//! stage is rewritten into GLSL 4.50 that wgpu accepts: the version directive
//! is replaced, precision statements are dropped, interface variables receive
//! explicit locations, and the fragment stage's loose uniforms are gathered
//! into a single std140 block whose layout is returned alongside the stage.
//!
//! Stages are compiled on the CPU through naga so a broken shader is reported
//! before any GPU object exists. Linking is left to the [`DrawSurface`].

use std::borrow::Cow;

use wgpu::naga;

use crate::error::{BuildError, Stage};
use crate::platform::DrawSurface;
use crate::uniforms::{UniformKind, UniformLayout};

pub const DEFAULT_VERTEX_SHADER: &str = include_str!("../shaders/grainient.vert");
pub const DEFAULT_FRAGMENT_SHADER: &str = include_str!("../shaders/grainient.frag");

/// Name of the generated uniform block instance in wrapped fragment sources.
const BLOCK_INSTANCE: &str = "grainient_ubo";
const PRECISION_QUALIFIERS: [&str; 3] = ["lowp", "mediump", "highp"];

/// Vertex and fragment text for the background program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
}

impl ShaderSource {
    pub fn new(vertex: impl Into<Cow<'static, str>>, fragment: impl Into<Cow<'static, str>>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }
}

impl Default for ShaderSource {
    fn default() -> Self {
        Self::new(DEFAULT_VERTEX_SHADER, DEFAULT_FRAGMENT_SHADER)
    }
}

/// A stage that parsed and validated successfully.
#[derive(Debug, Clone)]
pub struct CompiledStage {
    stage: Stage,
    glsl: String,
    module: naga::Module,
}

impl CompiledStage {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Wrapped GLSL handed to the backend.
    pub fn glsl(&self) -> &str {
        &self.glsl
    }

    pub fn module(&self) -> &naga::Module {
        &self.module
    }

    pub fn naga_stage(&self) -> naga::ShaderStage {
        naga_stage(self.stage)
    }
}

/// Both compiled stages plus the fragment uniform layout, ready to link.
#[derive(Debug, Clone)]
pub struct ProgramStages {
    pub vertex: CompiledStage,
    pub fragment: CompiledStage,
    pub layout: UniformLayout,
}

/// A linked program together with the uniform layout it was built from.
pub struct BuiltProgram<P> {
    pub program: P,
    pub layout: UniformLayout,
}

/// Compiles both stages and links them on `surface`.
///
/// Failures are logged and returned; nothing partially built survives.
pub fn build_program<S: DrawSurface>(
    surface: &mut S,
    source: &ShaderSource,
) -> Result<BuiltProgram<S::Program>, BuildError> {
    let stages = compile_stages(source).inspect_err(|err| {
        tracing::warn!(error = %err, "background shader failed to compile");
    })?;
    let program = surface.link_program(&stages).inspect_err(|err| {
        tracing::warn!(error = %err, "background program failed to link");
    })?;
    Ok(BuiltProgram {
        program,
        layout: stages.layout,
    })
}

/// Compiles each stage independently; both must succeed.
pub fn compile_stages(source: &ShaderSource) -> Result<ProgramStages, BuildError> {
    let vertex = compile_vertex(&source.vertex);
    let fragment = compile_fragment(&source.fragment);
    match (vertex, fragment) {
        (Ok(vertex), Ok((fragment, layout))) => Ok(ProgramStages {
            vertex,
            fragment,
            layout,
        }),
        (Err(err), Ok(_)) | (Ok(_), Err(err)) => Err(err),
        (Err(vertex_err), Err(fragment_err)) => {
            tracing::warn!(error = %fragment_err, "fragment stage also failed");
            Err(vertex_err)
        }
    }
}

pub fn compile_vertex(source: &str) -> Result<CompiledStage, BuildError> {
    let glsl = wrap_vertex(source);
    let module = parse_and_validate(Stage::Vertex, &glsl)?;
    Ok(CompiledStage {
        stage: Stage::Vertex,
        glsl,
        module,
    })
}

pub fn compile_fragment(source: &str) -> Result<(CompiledStage, UniformLayout), BuildError> {
    let (glsl, layout) = wrap_fragment(source)?;
    let module = parse_and_validate(Stage::Fragment, &glsl)?;
    Ok((
        CompiledStage {
            stage: Stage::Fragment,
            glsl,
            module,
        },
        layout,
    ))
}

fn naga_stage(stage: Stage) -> naga::ShaderStage {
    match stage {
        Stage::Vertex => naga::ShaderStage::Vertex,
        Stage::Fragment => naga::ShaderStage::Fragment,
    }
}

fn parse_and_validate(stage: Stage, glsl: &str) -> Result<naga::Module, BuildError> {
    let options = naga::front::glsl::Options::from(naga_stage(stage));
    let module = naga::front::glsl::Frontend::default()
        .parse(&options, glsl)
        .map_err(|err| BuildError::Compile {
            stage,
            message: err.to_string(),
        })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|err| BuildError::Compile {
        stage,
        message: err.to_string(),
    })?;

    if module.entry_points.is_empty() {
        return Err(BuildError::Compile {
            stage,
            message: "no entry point".into(),
        });
    }
    Ok(module)
}

/// Rewrites a vertex source for GLSL 4.50. Stripped lines become blank so
/// diagnostics keep their original line numbers.
fn wrap_vertex(source: &str) -> String {
    let mut body = String::with_capacity(source.len() + 64);
    let mut next_location = 0u32;
    for line in source.lines() {
        let trimmed = line.trim_start();
        if is_version(trimmed) || is_precision(strip_line_comment(trimmed)) {
            body.push('\n');
            continue;
        }
        match qualify_interface(trimmed, "in", next_location) {
            Some(qualified) => {
                body.push_str(&qualified);
                next_location += 1;
            }
            None => body.push_str(line),
        }
        body.push('\n');
    }
    format!("#version 450\n#line 1\n{body}")
}

/// Rewrites a fragment source for GLSL 4.50 and collects its loose uniforms
/// into a std140 block.
fn wrap_fragment(source: &str) -> Result<(String, UniformLayout), BuildError> {
    let mut body = String::with_capacity(source.len() + 64);
    let mut layout = UniformLayout::new();
    let mut next_location = 0u32;
    // Uniform declaration spanning several lines: joined code and raw lines.
    let mut pending: Option<(String, Vec<&str>)> = None;
    for line in source.lines() {
        let trimmed = line.trim_start();
        let code = strip_line_comment(trimmed);

        if let Some((mut joined, mut raw)) = pending.take() {
            raw.push(line);
            joined.push(' ');
            joined.push_str(code);
            if joined.contains('{') {
                // A uniform block; leave it to the author.
                for raw_line in raw {
                    body.push_str(raw_line);
                    body.push('\n');
                }
            } else if joined.ends_with(';') {
                collect_uniforms(&mut layout, parse_uniform_line(&joined)?);
                body.push_str(&"\n".repeat(raw.len()));
            } else {
                pending = Some((joined, raw));
            }
            continue;
        }

        if is_version(trimmed) || is_precision(code) {
            body.push('\n');
            continue;
        }
        if starts_uniform(code) && !code.contains('{') && !code.ends_with(';') {
            pending = Some((code.to_string(), vec![line]));
            continue;
        }
        if let Some(declarations) = parse_uniform_line(code)? {
            collect_uniforms(&mut layout, Some(declarations));
            body.push('\n');
            continue;
        }
        match qualify_interface(trimmed, "out", next_location) {
            Some(qualified) => {
                body.push_str(&qualified);
                next_location += 1;
            }
            None => body.push_str(line),
        }
        body.push('\n');
    }

    if let Some((_, raw)) = pending {
        for raw_line in raw {
            body.push_str(raw_line);
            body.push('\n');
        }
    }

    let header = uniform_block_header(&layout);
    Ok((format!("#version 450\n{header}#line 1\n{body}"), layout))
}

fn collect_uniforms(layout: &mut UniformLayout, declarations: Option<Vec<(String, UniformKind)>>) {
    for (name, kind) in declarations.into_iter().flatten() {
        if !layout.push(&name, kind) {
            tracing::debug!(uniform = %name, "duplicate uniform declaration ignored");
        }
    }
}

fn starts_uniform(code: &str) -> bool {
    code.strip_prefix("uniform")
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// Code part of a line, without a trailing `//` comment.
fn strip_line_comment(line: &str) -> &str {
    line.find("//").map_or(line, |index| &line[..index]).trim_end()
}

fn uniform_block_header(layout: &UniformLayout) -> String {
    if layout.is_empty() {
        return String::new();
    }
    let mut header = String::from("layout(std140, set = 0, binding = 0) uniform GrainientParams {\n");
    for slot in layout.slots() {
        header.push_str(&format!("    {} _{};\n", slot.kind.glsl(), slot.name));
    }
    header.push_str(&format!("}} {BLOCK_INSTANCE};\n"));
    for slot in layout.slots() {
        header.push_str(&format!(
            "#define {name} {BLOCK_INSTANCE}._{name}\n",
            name = slot.name
        ));
    }
    header
}

fn is_version(trimmed: &str) -> bool {
    trimmed.starts_with("#version")
}

fn is_precision(code: &str) -> bool {
    code.starts_with("precision ") && code.ends_with(';')
}

/// Parses `uniform [precision] <type> <name>[, <name>...];` from a line with
/// comments already stripped.
///
/// Returns `Ok(None)` for lines that are not loose uniform declarations
/// (including uniform blocks, which are left to the author).
fn parse_uniform_line(trimmed: &str) -> Result<Option<Vec<(String, UniformKind)>>, BuildError> {
    if !starts_uniform(trimmed) {
        return Ok(None);
    }
    let rest = &trimmed["uniform".len()..];
    let Some(declaration) = rest.trim_end().strip_suffix(';') else {
        return Ok(None);
    };

    let mut tokens = declaration.split_whitespace().peekable();
    while tokens
        .peek()
        .is_some_and(|token| PRECISION_QUALIFIERS.contains(token))
    {
        tokens.next();
    }
    let Some(ty) = tokens.next() else {
        return Ok(None);
    };
    let names: String = tokens.collect::<Vec<_>>().join(" ");

    let mut declarations = Vec::new();
    for name in names.split(',').map(str::trim) {
        if name.is_empty() || !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            return Err(BuildError::UnsupportedUniform {
                name: name.to_string(),
                ty: ty.to_string(),
            });
        }
        let kind = UniformKind::from_glsl(ty).ok_or_else(|| BuildError::UnsupportedUniform {
            name: name.to_string(),
            ty: ty.to_string(),
        })?;
        declarations.push((name.to_string(), kind));
    }
    Ok(Some(declarations))
}

/// Adds `layout(location = N)` to an unqualified global `in`/`out` declaration.
fn qualify_interface(trimmed: &str, keyword: &str, location: u32) -> Option<String> {
    let rest = trimmed.strip_prefix(keyword)?;
    if !rest.starts_with(char::is_whitespace) || !strip_line_comment(rest).ends_with(';') {
        return None;
    }
    Some(format!("layout(location = {location}) {keyword}{rest}"))
}
