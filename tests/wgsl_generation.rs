use prismal_glass::renderer::validation::validate_wgsl_with_context;
use prismal_glass::renderer::wgsl::glass_fragment_wgsl;
use prismal_glass::renderer::GlassUniforms;

#[test]
fn glass_program_parses_and_validates() {
    let source = glass_fragment_wgsl();
    let module = validate_wgsl_with_context(&source, "glass program")
        .unwrap_or_else(|e| panic!("{e:#}"));

    let stages: Vec<(naga::ShaderStage, &str)> = module
        .entry_points
        .iter()
        .map(|ep| (ep.stage, ep.name.as_str()))
        .collect();
    assert!(stages.contains(&(naga::ShaderStage::Vertex, "vs_main")), "{stages:?}");
    assert!(stages.contains(&(naga::ShaderStage::Fragment, "fs_main")), "{stages:?}");
}

#[test]
fn uniform_block_matches_the_wgsl_struct() {
    let source = glass_fragment_wgsl();
    let module = validate_wgsl_with_context(&source, "glass program")
        .unwrap_or_else(|e| panic!("{e:#}"));

    let (_, ty) = module
        .types
        .iter()
        .find(|(_, ty)| ty.name.as_deref() == Some("GlassUniforms"))
        .unwrap_or_else(|| panic!("GlassUniforms struct missing"));
    let naga::TypeInner::Struct { members, span } = &ty.inner else {
        panic!("GlassUniforms is not a struct");
    };
    assert_eq!(members.len(), 8);
    assert_eq!(*span as usize, std::mem::size_of::<GlassUniforms>());
    assert_eq!(*span, 128);
}

#[test]
fn program_is_stable() {
    assert_eq!(glass_fragment_wgsl(), glass_fragment_wgsl());
}
