//! Render output produced by block designs.
//!
//! Designs build a small virtual tree; the preview host turns it into whatever
//! its surface needs. `Placeholder` stands in for blocks that cannot be drawn.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RenderNode {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        styles: BTreeMap<String, String>,
        children: Vec<RenderNode>,
    },

    Text { content: String },

    /// Shown instead of a block whose design is unknown or whose renderer failed
    Placeholder {
        #[serde(rename = "blockId")]
        block_id: String,
        #[serde(rename = "designId", skip_serializing_if = "Option::is_none")]
        design_id: Option<String>,
        message: String,
    },
}

impl RenderNode {
    pub fn element(tag: impl Into<String>) -> Self {
        RenderNode::Element {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        RenderNode::Text {
            content: content.into(),
        }
    }

    pub fn placeholder(
        block_id: impl Into<String>,
        design_id: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        RenderNode::Placeholder {
            block_id: block_id.into(),
            design_id,
            message: message.into(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let RenderNode::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(key.into(), value.into());
        }
        self
    }

    /// Set a style property. `None` leaves the node untouched, so optional
    /// theme tokens can be passed straight through.
    pub fn with_style(mut self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        if let (RenderNode::Element { styles, .. }, Some(value)) = (&mut self, value) {
            styles.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_child(mut self, child: RenderNode) -> Self {
        if let RenderNode::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    /// Append a child only when there is one
    pub fn with_optional_child(self, child: Option<RenderNode>) -> Self {
        match child {
            Some(child) => self.with_child(child),
            None => self,
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            RenderNode::Element { attributes, .. } => attributes.get(key).map(String::as_str),
            _ => None,
        }
    }

    pub fn style(&self, key: &str) -> Option<&str> {
        match self {
            RenderNode::Element { styles, .. } => styles.get(key).map(String::as_str),
            _ => None,
        }
    }

    pub fn children(&self) -> &[RenderNode] {
        match self {
            RenderNode::Element { children, .. } => children,
            _ => &[],
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, RenderNode::Placeholder { .. })
    }

    /// Concatenated text of this subtree
    pub fn text_content(&self) -> String {
        match self {
            RenderNode::Text { content } => content.clone(),
            RenderNode::Element { children, .. } => {
                children.iter().map(RenderNode::text_content).collect()
            }
            RenderNode::Placeholder { .. } => String::new(),
        }
    }
}
