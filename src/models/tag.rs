// Tag tree node, built from `/`-separated tag paths

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TagNode>,
}

impl TagNode {
    pub fn leaf(name: &str) -> Self {
        Self {
            name: name.to_string(),
            children: Vec::new(),
        }
    }

    pub fn child(&self, name: &str) -> Option<&TagNode> {
        self.children.iter().find(|c| c.name == name)
    }
}
