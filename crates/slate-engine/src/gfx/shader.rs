use super::{GfxError, UniformDecl};

/// WGSL program plus the description of its uniform block.
///
/// Binding convention shared by all backends:
/// - `@group(0) @binding(0)`: the uniform block, members in `uniforms` order
/// - `@group(0) @binding(1 + i)`: texture bound to slot `i`
/// - `@group(0) @binding(1 + TEX_SLOT_CAPACITY + i)`: sampler of slot `i`
///
/// Entry points are `vs_main` and `fs_main`.
#[derive(Debug, Copy, Clone)]
pub struct ShaderSource<'a> {
    pub label: &'a str,
    pub wgsl: &'a str,
    pub uniforms: &'a [UniformDecl],
}

/// Parses and validates WGSL, turning diagnostics into [`GfxError::ShaderCompile`].
pub fn validate_wgsl(label: &str, wgsl: &str) -> Result<(), GfxError> {
    let module = naga::front::wgsl::parse_str(wgsl).map_err(|e| GfxError::ShaderCompile {
        label: label.to_string(),
        message: e.emit_to_string(wgsl),
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    );

    validator
        .validate(&module)
        .map_err(|e| GfxError::ShaderCompile {
            label: label.to_string(),
            message: e.into_inner().to_string(),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_parse_errors() {
        let err = validate_wgsl("broken", "fn main( {").unwrap_err();
        assert!(matches!(err, GfxError::ShaderCompile { ref label, .. } if label == "broken"));
    }

    #[test]
    fn accepts_trivial_shader() {
        let src = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
        assert!(validate_wgsl("ok", src).is_ok());
    }
}
