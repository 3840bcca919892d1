//! WGSL validation using the naga library.

use anyhow::{Context, Result, anyhow};

/// Parse and validate WGSL source code with naga.
///
/// # Returns
/// The parsed naga Module on success, or an error with the numbered source on failure.
///
/// # Example
/// ```ignore
/// let wgsl = "fn main() -> vec4f { return vec4f(1.0); }";
/// match validate_wgsl(wgsl) {
///     Ok(module) => println!("Valid WGSL"),
///     Err(e) => eprintln!("Invalid WGSL: {}", e),
/// }
/// ```
pub fn validate_wgsl(source: &str) -> Result<naga::Module> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| anyhow!("WGSL parse failed:\n{}", format_naga_error(source, &e)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| {
        anyhow!(
            "WGSL module failed validation: {e:?}\n{}",
            numbered_source(source)
        )
    })?;

    Ok(module)
}

/// Validate WGSL and name the program that produced it in the error.
pub fn validate_wgsl_with_context(source: &str, context: &str) -> Result<naga::Module> {
    validate_wgsl(source).with_context(|| format!("{} generated invalid WGSL", context))
}

fn numbered_source(source: &str) -> String {
    let mut output = String::new();
    output.push_str("\nGenerated WGSL:\n");
    output.push_str("---\n");
    for (line_num, line) in source.lines().enumerate() {
        output.push_str(&format!("{:4} | {}\n", line_num + 1, line));
    }
    output.push_str("---\n");
    output
}

/// Format a naga parse error with source context for better error messages.
fn format_naga_error(source: &str, error: &naga::front::wgsl::ParseError) -> String {
    let mut output = String::new();
    output.push_str(&format!("  {}\n", error));
    output.push_str(&numbered_source(source));
    output
}
