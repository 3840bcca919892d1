//! WGSL form of the glass pixel program.
//!
//! Mirrors `crate::glass` function for function. Constants are emitted from
//! `crate::glass::consts` so both hosts always agree on them.

use crate::glass::consts::{
    AA_FEATHER_PX, BLUR_TAPS_PER_AXIS, CHROMATIC_PIXEL_SCALE, DISCARD_THRESHOLD, EPSILON,
    HEIGHT_EDGE_FEATHER_PX, HEIGHT_STEEPNESS, LIGHT_DIR, MAX_TINT, SIGMOID_LIMIT,
};

/// Format an f32 as a WGSL float literal. Always keeps a decimal point or exponent.
fn wgsl_f32(v: f32) -> String {
    if v.is_finite() {
        format!("{v:?}")
    } else {
        "0.0".to_string()
    }
}

fn constants_prelude() -> String {
    let f = |name: &str, v: f32| format!("const {name}: f32 = {};\n", wgsl_f32(v));
    let mut s = String::new();
    s.push_str(&f("EPSILON", EPSILON));
    s.push_str(&f("DISCARD_THRESHOLD", DISCARD_THRESHOLD));
    s.push_str(&f("HEIGHT_STEEPNESS", HEIGHT_STEEPNESS));
    s.push_str(&f("HEIGHT_EDGE_FEATHER_PX", HEIGHT_EDGE_FEATHER_PX));
    s.push_str(&f("SIGMOID_LIMIT", SIGMOID_LIMIT));
    s.push_str(&f("AA_FEATHER_PX", AA_FEATHER_PX));
    s.push_str(&f("CHROMATIC_PIXEL_SCALE", CHROMATIC_PIXEL_SCALE));
    s.push_str(&f("MAX_TINT", MAX_TINT));
    s.push_str(&format!(
        "const LIGHT_DIR: vec2f = vec2f({}, {});\n",
        wgsl_f32(LIGHT_DIR.x),
        wgsl_f32(LIGHT_DIR.y)
    ));
    s.push_str(&format!(
        "const BLUR_TAPS_PER_AXIS: u32 = {BLUR_TAPS_PER_AXIS}u;\n"
    ));
    s.push_str("const VIEW_DIR: vec3f = vec3f(0.0, 0.0, 1.0);\n");
    s
}

const GLASS_PROGRAM_BODY: &str = r#"
struct GlassUniforms {
    // size.x, size.y, corner_radius, smoothing
    geometry: vec4f,
    // ior, thickness, normal_strength, displacement_scale
    optics: vec4f,
    // transition_width, edge_falloff_exponent, refraction_inset, edge_band
    shaping: vec4f,
    // blur_radius, chromatic_aberration, brightness, highlight_width
    post: vec4f,
    shadow_color: vec4f,
    overlay_color: vec4f,
    // shadow_falloff, opacity_inset, show_normals, unused
    extra: vec4f,
    // viewport width, viewport height, unused, unused
    viewport: vec4f,
};

@group(0) @binding(0)
var<uniform> params: GlassUniforms;
@group(0) @binding(1)
var background_tex: texture_2d<f32>;
@group(0) @binding(2)
var background_samp: sampler;

struct VSOut {
    @builtin(position) position: vec4f,
};

// Fullscreen triangle, no vertex buffer.
@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VSOut {
    var out: VSOut;
    let x = f32((vertex_index << 1u) & 2u) * 2.0 - 1.0;
    let y = f32(vertex_index & 2u) * 2.0 - 1.0;
    out.position = vec4f(x, y, 0.0, 1.0);
    return out;
}

fn glass_smin(a: f32, b: f32, k: f32) -> f32 {
    if (k <= 0.0) {
        return min(a, b);
    }
    let h = clamp(0.5 + 0.5 * (b - a) / k, 0.0, 1.0);
    return mix(b, a, h) - k * h * (1.0 - h);
}

fn glass_smax(a: f32, b: f32, k: f32) -> f32 {
    return -glass_smin(-a, -b, k);
}

fn glass_sd_rounded_box(p: vec2f, half_size: vec2f, radius: f32, k: f32) -> f32 {
    let r = min(max(radius, 0.0), max(min(half_size.x, half_size.y), 0.0));
    let q = abs(p) - half_size + vec2f(r);
    if (k <= 0.0) {
        return length(max(q, vec2f(0.0))) + min(max(q.x, q.y), 0.0) - r;
    }
    let outside = vec2f(glass_smax(q.x, 0.0, k), glass_smax(q.y, 0.0, k));
    return length(outside) + glass_smin(glass_smax(q.x, q.y, k), 0.0, k) - r;
}

fn glass_local(frag: vec2f) -> vec2f {
    return frag - params.viewport.xy * 0.5;
}

fn glass_distance(local: vec2f) -> f32 {
    return glass_sd_rounded_box(local, params.geometry.xy * 0.5, params.geometry.z, params.geometry.w);
}

fn glass_opacity(d: f32, inset: f32) -> f32 {
    if (d >= 0.0) {
        return 0.0;
    }
    let base = 1.0 - smoothstep(-inset, 0.0, d);
    let aa = 1.0 - smoothstep(-AA_FEATHER_PX, 0.0, d);
    return mix(base, 1.0, aa);
}

fn glass_height(d: f32) -> f32 {
    let w = max(params.shaping.x, EPSILON);
    let x = clamp(HEIGHT_STEEPNESS * (-d / w), -SIGMOID_LIMIT, SIGMOID_LIMIT);
    return (1.0 / (1.0 + exp(-x))) * smoothstep(0.0, HEIGHT_EDGE_FEATHER_PX, -d);
}

fn glass_surface_height(local: vec2f) -> f32 {
    return glass_height(glass_distance(local));
}

fn glass_gradient(local: vec2f) -> vec2f {
    let dx = glass_surface_height(local + vec2f(1.0, 0.0)) - glass_surface_height(local - vec2f(1.0, 0.0));
    let dy = glass_surface_height(local + vec2f(0.0, 1.0)) - glass_surface_height(local - vec2f(0.0, 1.0));
    return vec2f(dx, dy) * 0.5;
}

fn glass_normal(g: vec2f, strength: f32) -> vec3f {
    return normalize(vec3f(-g.x * strength, -g.y * strength, 1.0));
}

fn glass_fresnel(n: vec3f, v: vec3f, ior: f32) -> f32 {
    let r = (1.0 - ior) / (1.0 + ior);
    let r0 = r * r;
    let m = 1.0 - min(abs(dot(n, v)), 1.0);
    let m2 = m * m;
    return r0 + (1.0 - r0) * (m2 * m2 * m);
}

fn glass_refract(i: vec3f, n: vec3f, eta: f32) -> vec3f {
    let n_dot_i = dot(n, i);
    let k = 1.0 - eta * eta * (1.0 - n_dot_i * n_dot_i);
    if (k < 0.0) {
        return vec3f(0.0);
    }
    return eta * i - (eta * n_dot_i + sqrt(k)) * n;
}

fn glass_double_refraction(n: vec3f, ior: f32) -> vec3f {
    let incident = -VIEW_DIR;
    if (abs(ior - 1.0) <= EPSILON) {
        return incident;
    }
    let into = glass_refract(incident, n, 1.0 / ior);
    let exit_normal = vec3f(-n.x, -n.y, n.z);
    let exit_ray = glass_refract(into, exit_normal, ior);
    if (dot(exit_ray, exit_ray) <= EPSILON * EPSILON) {
        return into;
    }
    return exit_ray;
}

fn glass_depth_falloff(d: f32) -> f32 {
    let band = max(params.shaping.w, EPSILON);
    let proximity = clamp(-d / band, 0.0, 1.0);
    if (proximity <= 0.0) {
        return 1.0;
    }
    return 1.0 - pow(proximity, params.shaping.y);
}

fn glass_inset_gate(d: f32) -> f32 {
    return smoothstep(0.0, max(params.shaping.z, EPSILON), -d);
}

fn glass_shadow_mask(d: f32) -> f32 {
    return 1.0 - smoothstep(0.0, max(params.extra.x, EPSILON), -d);
}

fn glass_chromatic_dir(base: vec2f) -> vec2f {
    if (length(base) < EPSILON) {
        return vec2f(0.0);
    }
    return normalize(base);
}

fn glass_sample(position: vec2f) -> vec4f {
    return textureSampleLevel(background_tex, background_samp, position / params.viewport.xy, 0.0);
}

fn glass_blur(frag: vec2f, offset: vec2f) -> vec4f {
    let center = frag + offset;
    let radius = params.post.x;
    if (radius <= EPSILON) {
        return glass_sample(center);
    }
    let spacing = radius * 0.5;
    let reach = i32(BLUR_TAPS_PER_AXIS / 2u);
    var sum = vec4f(0.0);
    var weight: f32 = 0.0;
    for (var j = -reach; j <= reach; j = j + 1) {
        for (var i = -reach; i <= reach; i = i + 1) {
            let tap = center + vec2f(f32(i), f32(j)) * spacing;
            let w = glass_opacity(glass_distance(glass_local(tap)), params.extra.y);
            sum = sum + glass_sample(tap) * w;
            weight = weight + w;
        }
    }
    if (weight <= EPSILON) {
        return glass_sample(center);
    }
    return sum / weight;
}

fn glass_highlight(n: vec3f, d: f32, reflectance: f32) -> f32 {
    let ring = 1.0 - smoothstep(0.0, params.post.w, abs(d));
    var directional: f32 = 0.0;
    if (length(n.xy) >= EPSILON) {
        directional = abs(dot(normalize(n.xy), LIGHT_DIR));
    }
    return clamp(ring * directional * reflectance, 0.0, 1.0);
}

@fragment
fn fs_main(in: VSOut) -> @location(0) vec4f {
    let frag = in.position.xy;
    let local = glass_local(frag);
    let d = glass_distance(local);
    let opacity = glass_opacity(d, params.extra.y);
    if (opacity < DISCARD_THRESHOLD) {
        discard;
    }

    let n = glass_normal(glass_gradient(local), params.optics.z);
    if (params.extra.z > 0.5) {
        return vec4f(n * 0.5 + 0.5, opacity);
    }

    let reflectance = glass_fresnel(n, VIEW_DIR, params.optics.x);
    let falloff = glass_depth_falloff(d);
    let exit_ray = glass_double_refraction(n, params.optics.x);
    let base = exit_ray.xy * params.optics.y * params.optics.w * falloff * glass_inset_gate(d);
    let spread = glass_chromatic_dir(base) * (params.post.y * CHROMATIC_PIXEL_SCALE * falloff);

    let red = glass_blur(frag, base - spread).r;
    let green = glass_blur(frag, base).g;
    let blue = glass_blur(frag, base + spread).b;

    var rgb = vec3f(red, green, blue) * params.post.z;
    rgb = mix(rgb, params.shadow_color.rgb, glass_shadow_mask(d) * params.shadow_color.a);
    let tint = clamp(glass_height(d) * MAX_TINT * params.overlay_color.a, 0.0, 1.0);
    rgb = mix(rgb, params.overlay_color.rgb, tint);
    rgb = mix(rgb, vec3f(1.0), glass_highlight(n, d, reflectance));

    return vec4f(clamp(rgb, vec3f(0.0), vec3f(1.0)), opacity);
}
"#;

/// The complete glass program: vertex and fragment entry points in one module.
pub fn glass_fragment_wgsl() -> String {
    let mut src = constants_prelude();
    src.push_str(GLASS_PROGRAM_BODY);
    src
}
