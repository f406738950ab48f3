//! Whole-worker source assembly.
//!
//! Sections are emitted in a fixed order: header comment, custom imports,
//! the FastMCP import, global bindings, server initialization, resources,
//! tools, prompts, and the stdio entrypoint. Fragments within a kind keep
//! the store's insertion order.

use capforge_core::error::{AssemblyError, Result};
use capforge_core::fragment::{Fragment, FragmentKind};
use capforge_core::store::FragmentStore;
use capforge_core::target::BuildTarget;
use tracing::debug;

use crate::header::substitute_params;
use crate::signature::{render_binding, render_signature};

/// Linked fragments grouped by kind, each group in insertion order.
#[derive(Debug, Clone, Default)]
pub struct FragmentsByKind {
    pub resources: Vec<Fragment>,
    pub tools: Vec<Fragment>,
    pub prompts: Vec<Fragment>,
}

fn render_group(fragments: &[Fragment]) -> Result<String> {
    let rendered = fragments.iter().map(render_fragment).collect::<Result<Vec<_>>>()?;
    Ok(rendered.join("\n\n"))
}

/// Assemble a complete worker source for the target.
///
/// Pure and deterministic: identical inputs yield byte-identical output.
/// Either a complete source text is produced or no output is produced.
pub fn assemble(target: &BuildTarget, fragments: &FragmentsByKind) -> Result<String> {
    let imports = target.imports.join("\n");
    let globals = target
        .globals
        .iter()
        .map(|(name, value)| render_binding(name, value))
        .collect::<Vec<_>>()
        .join("\n");

    let resources_code = render_group(&fragments.resources)?;
    let tools_code = render_group(&fragments.tools)?;
    let prompts_code = render_group(&fragments.prompts)?;

    debug!(target_id = %target.id, name = %target.name, "Assembled worker source");

    Ok(format!(
        "# Auto-generated MCP worker\n\
         {imports}\n\
         \n\
         from mcp.server.fastmcp import FastMCP\n\
         \n\
         {globals}\n\
         \n\
         mcp = FastMCP(\"{name}\")\n\
         \n\
         # Resources\n\
         {resources_code}\n\
         \n\
         # Tools\n\
         {tools_code}\n\
         \n\
         # Prompts\n\
         {prompts_code}\n\
         \n\
         if __name__ == \"__main__\":\n\
         \x20   mcp.run(transport=\"stdio\")\n",
        name = target.name,
    ))
}

/// Pull the target and its linked fragments from the store and assemble.
///
/// Side-effect-free except for the read of current fragment state.
pub async fn assemble_target(store: &dyn FragmentStore, target_id: &str) -> Result<String> {
    let target = store.get_target(target_id).await?;
    let fragments = FragmentsByKind {
        resources: store.fetch_linked(target_id, FragmentKind::Resource).await?,
        tools: store.fetch_linked(target_id, FragmentKind::Tool).await?,
        prompts: store.fetch_linked(target_id, FragmentKind::Prompt).await?,
    };
    assemble(&target, &fragments)
}

/// Re-render one fragment: splice the current parameter list into its stored
/// body, leaving the function name and code untouched.
fn render_fragment(fragment: &Fragment) -> Result<String> {
    let signature = render_signature(&fragment.params);
    substitute_params(&fragment.body, &signature)
        .map(|code| code.trim_end().to_string())
        .ok_or_else(|| {
            AssemblyError::MalformedFragment { fragment_id: fragment.id.clone() }.into()
        })
}
