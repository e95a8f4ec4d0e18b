// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Document tags for substituted modules.
//!
//! Tags use the same shape as html-webpack-plugin asset tags
//! (`tagName`, `voidTag`, `meta`, `attributes`) so hosts can merge them with
//! their own lists directly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::policy::ModuleKind;
use crate::registry::SubstitutionRegistry;

/// Value of `meta.plugin` on generated tags.
pub const TAG_PLUGIN: &str = "cdnext";

/// Tag metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMeta {
    /// Producer of the tag
    pub plugin: String,
}

/// One HTML tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlTag {
    pub tag_name: String,
    pub void_tag: bool,
    pub meta: TagMeta,
    /// Attributes; absent optional attributes are simply not present
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl HtmlTag {
    pub fn new(tag_name: impl Into<String>, void_tag: bool) -> Self {
        Self {
            tag_name: tag_name.into(),
            void_tag,
            meta: TagMeta {
                plugin: TAG_PLUGIN.to_string(),
            },
            attributes: BTreeMap::new(),
        }
    }

    /// Deferred script: `{defer: "defer", src}`.
    pub fn script(src: impl Into<String>) -> Self {
        Self::new("script", false)
            .attribute("defer", "defer")
            .attribute("src", src)
    }

    /// Stylesheet link: `{href, rel: "stylesheet"}`.
    pub fn stylesheet(href: impl Into<String>) -> Self {
        Self::new("link", true)
            .attribute("href", href)
            .attribute("rel", "stylesheet")
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

impl fmt::Display for HtmlTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag_name)?;
        for (name, value) in &self.attributes {
            write!(f, " {}=\"{}\"", name, escape_attribute(value))?;
        }
        if self.void_tag {
            write!(f, ">")
        } else {
            write!(f, "></{}>", self.tag_name)
        }
    }
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Script and style tag lists handed through the document hook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTags {
    #[serde(default)]
    pub scripts: Vec<HtmlTag>,
    #[serde(default)]
    pub styles: Vec<HtmlTag>,
}

impl AssetTags {
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty() && self.styles.is_empty()
    }

    /// `self` followed by `host`, per list.
    pub fn prepend_to(self, host: AssetTags) -> AssetTags {
        let AssetTags {
            mut scripts,
            mut styles,
        } = self;
        scripts.extend(host.scripts);
        styles.extend(host.styles);
        AssetTags { scripts, styles }
    }

    /// Styles then scripts, one tag per line.
    pub fn to_html(&self) -> String {
        self.styles
            .iter()
            .chain(self.scripts.iter())
            .map(|tag| tag.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Insert the tags before `</head>`, or at the top of a document without
    /// one.
    pub fn inject_into(&self, html: &str) -> String {
        if self.is_empty() {
            return html.to_string();
        }
        let rendered = self.to_html();
        match html.to_ascii_lowercase().find("</head>") {
            Some(pos) => format!("{}{}\n{}", &html[..pos], rendered, &html[pos..]),
            None => format!("{}\n{}", rendered, html),
        }
    }
}

/// Project the registry into tags, in registry order.
pub fn emit_markup(registry: &SubstitutionRegistry) -> AssetTags {
    AssetTags {
        scripts: registry
            .of_kind(ModuleKind::Js)
            .map(|d| HtmlTag::script(&d.url))
            .collect(),
        styles: registry
            .of_kind(ModuleKind::Css)
            .map(|d| HtmlTag::stylesheet(&d.url))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::SubstitutionDescriptor;

    fn descriptor(name: &str, url: &str, kind: ModuleKind) -> SubstitutionDescriptor {
        SubstitutionDescriptor {
            name: name.into(),
            exported_identifier: name.into(),
            url: url.into(),
            version: "1.0.0".into(),
            kind,
        }
    }

    #[test]
    fn test_script_tag() {
        let tag = HtmlTag::script("https://cdn/react.js");
        assert_eq!(tag.get("defer"), Some("defer"));
        assert_eq!(tag.get("src"), Some("https://cdn/react.js"));
        assert_eq!(tag.get("type"), None);
        assert_eq!(
            tag.to_string(),
            r#"<script defer="defer" src="https://cdn/react.js"></script>"#
        );
    }

    #[test]
    fn test_stylesheet_tag() {
        let tag = HtmlTag::stylesheet("https://cdn/a.css?x=1&y=\"2\"");
        assert!(tag.void_tag);
        assert_eq!(
            tag.to_string(),
            r#"<link href="https://cdn/a.css?x=1&amp;y=&quot;2&quot;" rel="stylesheet">"#
        );
    }

    #[test]
    fn test_emit_partitions_by_kind() {
        let mut registry = SubstitutionRegistry::new();
        registry.insert("react", descriptor("react", "https://cdn/react.js", ModuleKind::Js));
        registry.insert(
            "antd.css",
            descriptor("antd.css", "https://cdn/antd.css", ModuleKind::Css),
        );
        registry.insert("antd", descriptor("antd", "https://cdn/antd.js", ModuleKind::Js));

        let tags = emit_markup(&registry);
        let srcs: Vec<_> = tags.scripts.iter().filter_map(|t| t.get("src")).collect();
        assert_eq!(srcs, ["https://cdn/react.js", "https://cdn/antd.js"]);
        assert_eq!(tags.styles.len(), 1);
        assert_eq!(tags.styles[0].get("href"), Some("https://cdn/antd.css"));

        // read-only projection
        assert_eq!(emit_markup(&registry), tags);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_prepend_keeps_host_order() {
        let generated = AssetTags {
            scripts: vec![HtmlTag::script("https://cdn/react.js")],
            styles: vec![],
        };
        let host = AssetTags {
            scripts: vec![HtmlTag::script("/main.js"), HtmlTag::script("/vendor.js")],
            styles: vec![HtmlTag::stylesheet("/main.css")],
        };

        let merged = generated.prepend_to(host);
        let srcs: Vec<_> = merged.scripts.iter().filter_map(|t| t.get("src")).collect();
        assert_eq!(srcs, ["https://cdn/react.js", "/main.js", "/vendor.js"]);
        assert_eq!(merged.styles.len(), 1);
    }

    #[test]
    fn test_inject_into_head() {
        let tags = AssetTags {
            scripts: vec![HtmlTag::script("https://cdn/react.js")],
            styles: vec![HtmlTag::stylesheet("https://cdn/antd.css")],
        };

        let html = "<html><HEAD><title>x</title></HEAD><body></body></html>";
        assert_eq!(
            tags.inject_into(html),
            "<html><HEAD><title>x</title>\
             <link href=\"https://cdn/antd.css\" rel=\"stylesheet\">\n\
             <script defer=\"defer\" src=\"https://cdn/react.js\"></script>\n\
             </HEAD><body></body></html>"
        );

        assert!(tags.inject_into("<p>fragment</p>").ends_with("\n<p>fragment</p>"));
        assert_eq!(AssetTags::default().inject_into(html), html);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(HtmlTag::stylesheet("https://cdn/a.css")).unwrap();
        assert_eq!(json["tagName"], "link");
        assert_eq!(json["voidTag"], true);
        assert_eq!(json["meta"]["plugin"], TAG_PLUGIN);
        assert_eq!(json["attributes"]["rel"], "stylesheet");
    }
}
