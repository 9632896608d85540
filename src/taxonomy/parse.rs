use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawNode {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub children: Option<Vec<RawNode>>,
}

impl RawNode {
    #[cfg(test)]
    pub fn leaf(name: &str, value: f64) -> Self {
        Self {
            name: Some(name.to_owned()),
            value: Some(value),
            description: None,
            children: None,
        }
    }

    #[cfg(test)]
    pub fn branch(name: &str, children: Vec<RawNode>) -> Self {
        Self {
            name: Some(name.to_owned()),
            value: None,
            description: None,
            children: Some(children),
        }
    }

    #[cfg(test)]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }
}

// Flattens the subtree so dropping a deep chain does not recurse.
impl Drop for RawNode {
    fn drop(&mut self) {
        let mut pending = self.children.take().unwrap_or_default();
        while let Some(mut node) = pending.pop() {
            if let Some(children) = node.children.take() {
                pending.extend(children);
            }
        }
    }
}

pub(super) fn parse_raw_tree(raw: &str) -> Result<RawNode> {
    if !raw.trim_start().starts_with('{') {
        return Err(anyhow!("taxonomy root must be a JSON object"));
    }

    let mut json = serde_json::Deserializer::from_str(raw);
    json.disable_recursion_limit();
    let tree = RawNode::deserialize(serde_stacker::Deserializer::new(&mut json))
        .context("invalid taxonomy JSON")?;
    json.end().context("trailing characters after the taxonomy JSON")?;

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_document_with_optional_fields() {
        let raw = r#"{
            "name": "root",
            "children": [
                {"name": "A", "description": "Chapter A", "children": [{"name": "A1", "value": 4}]},
                {"name": "B", "value": 20}
            ]
        }"#;

        let mut tree = parse_raw_tree(raw).unwrap();
        assert_eq!(tree.name.as_deref(), Some("root"));
        assert_eq!(tree.value, None);

        let children = tree.children.take().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].description.as_deref(), Some("Chapter A"));
        assert_eq!(children[1].value, Some(20.0));
        assert!(children[1].children.is_none());
    }

    #[test]
    fn rejects_non_object_root() {
        let error = parse_raw_tree("[1, 2, 3]").unwrap_err();
        assert!(error.to_string().contains("JSON object"));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(parse_raw_tree("{\"name\": ").is_err());
        assert!(parse_raw_tree("{\"name\": \"root\", \"value\": 1} trailing").is_err());
    }

    #[test]
    fn nesting_depth_is_unbounded() {
        let depth = 2000;
        let mut raw = String::new();
        for level in 0..depth {
            raw.push_str(&format!("{{\"name\":\"L{level}\",\"children\":["));
        }
        raw.push_str("{\"name\":\"leaf\",\"value\":1}");
        raw.push_str(&"]}".repeat(depth));

        let mut node = parse_raw_tree(&raw).unwrap();
        let mut levels = 0;
        while let Some(mut children) = node.children.take() {
            node = children.pop().unwrap();
            levels += 1;
        }
        assert_eq!(levels, depth);
        assert_eq!(node.name.as_deref(), Some("leaf"));
    }
}
