//! Authoring-time skeleton synthesis.
//!
//! A fragment's stored body is a complete function definition: decorator,
//! header, and the author's code indented one level. Authors may supply the
//! body verbatim, or just the code snippet and let this module build the
//! rest, including the `async def` header for async tools.

use capforge_core::fragment::{FragmentKind, Param};

use crate::signature::render_signature;

/// Inputs for synthesizing a fragment body.
pub struct SkeletonSpec<'a> {
    pub kind: FragmentKind,
    pub name: &'a str,
    pub params: &'a [Param],
    /// The author's code, without decorator or header.
    pub snippet: &'a str,
    pub is_async: bool,
    /// Resource URI for the `@mcp.resource(...)` decorator. Defaults to
    /// `data://<name>` when absent. Ignored for other kinds.
    pub resource_uri: Option<&'a str>,
}

/// Render a stored fragment body from its parts.
pub fn render_skeleton(spec: &SkeletonSpec<'_>) -> String {
    let decorator = match spec.kind {
        FragmentKind::Tool => "@mcp.tool()".to_string(),
        FragmentKind::Prompt => "@mcp.prompt()".to_string(),
        FragmentKind::Resource => {
            let fallback = format!("data://{}", spec.name);
            format!("@mcp.resource(\"{}\")", spec.resource_uri.unwrap_or(&fallback))
        }
    };
    let def = if spec.is_async { "async def" } else { "def" };
    let signature = render_signature(spec.params);

    let mut body = format!("{decorator}\n{def} {}({signature}) -> str:\n", spec.name);
    for line in spec.snippet.trim().lines() {
        if line.is_empty() {
            body.push('\n');
        } else {
            body.push_str("    ");
            body.push_str(line);
            body.push('\n');
        }
    }
    body
}
