//! Parameter-list rendering.
//!
//! Each declared parameter becomes `name: type = default` when a default
//! exists, else `name: type`. Declared order is preserved exactly; fragment
//! authors control call-site compatibility.

use capforge_core::fragment::Param;

/// Render an ordered parameter list into signature text.
///
/// Defaults must read as Python: booleans and null map to `True`/`False`/
/// `None`, strings are re-quoted, numbers pass through.
pub fn render_signature(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| match &p.default {
            Some(value) => format!("{}: {} = {}", p.name, p.ty, render_default(value)),
            None => format!("{}: {}", p.name, p.ty),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render a global binding line: `name = <literal>`, JSON-serialized.
pub fn render_binding(name: &str, value: &serde_json::Value) -> String {
    format!("{name} = {}", render_literal(value))
}

/// Default values land in a Python signature, so the keyword literals get
/// the Python spelling. Everything else shares the JSON rendering.
fn render_default(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "None".into(),
        serde_json::Value::Bool(true) => "True".into(),
        serde_json::Value::Bool(false) => "False".into(),
        other => render_literal(other),
    }
}

fn render_literal(value: &serde_json::Value) -> String {
    // serde_json's canonical form; strings come back quoted.
    serde_json::to_string(value).unwrap_or_else(|_| "null".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ordered_mixed_defaults() {
        let params = vec![
            Param::with_default("a", "int", json!(1)),
            Param::new("b", "str"),
        ];
        assert_eq!(render_signature(&params), "a: int = 1, b: str");
    }

    #[test]
    fn string_defaults_are_requoted() {
        let params = vec![Param::with_default("unit", "str", json!("celsius"))];
        assert_eq!(render_signature(&params), "unit: str = \"celsius\"");
    }

    #[test]
    fn declared_order_is_preserved() {
        let params = vec![
            Param::new("zulu", "int"),
            Param::new("alpha", "int"),
            Param::new("mike", "int"),
        ];
        assert_eq!(render_signature(&params), "zulu: int, alpha: int, mike: int");
    }

    #[test]
    fn bool_defaults_use_python_keywords() {
        let params = vec![Param::with_default("excited", "bool", json!(false))];
        assert_eq!(render_signature(&params), "excited: bool = False");

        let params = vec![Param::with_default("loud", "bool", json!(true))];
        assert_eq!(render_signature(&params), "loud: bool = True");
    }

    #[test]
    fn null_default_renders_none() {
        let params = vec![Param::with_default("extra", "str", json!(null))];
        assert_eq!(render_signature(&params), "extra: str = None");
    }

    #[test]
    fn empty_list_renders_empty() {
        assert_eq!(render_signature(&[]), "");
    }

    #[test]
    fn binding_renders_json_literals() {
        assert_eq!(render_binding("BASE_URL", &json!("https://api")), "BASE_URL = \"https://api\"");
        assert_eq!(render_binding("RETRIES", &json!(3)), "RETRIES = 3");
    }
}
