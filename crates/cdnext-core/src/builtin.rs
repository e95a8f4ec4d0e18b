// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Built-in module table: UMD builds published to unpkg.

use crate::policy::{ModuleEntry, ModuleKind, ModuleTable, VersionUrls};

/// Base URL for the built-in table.
pub const UNPKG: &str = "https://unpkg.com";

fn unpkg(package: &str, file: &str) -> String {
    format!("{}/{}@[version]/{}", UNPKG, package, file)
}

fn urls(range: &str, package: &str, development: &str, production: &str) -> VersionUrls {
    VersionUrls::new(range)
        .development(unpkg(package, development))
        .production(unpkg(package, production))
}

/// The table consulted before any project-supplied resolvers.
pub fn builtin_table() -> ModuleTable {
    ModuleTable::new()
        .labeled("built-in")
        .with_module(
            ModuleEntry::new("react", "React")
                .range(urls("^15.0.0", "react", "dist/react.js", "dist/react.min.js"))
                .range(urls(
                    ">=16.0.0 <19.0.0",
                    "react",
                    "umd/react.development.js",
                    "umd/react.production.min.js",
                )),
        )
        .with_module(
            ModuleEntry::new("react-dom", "ReactDOM")
                .range(urls(
                    "^15.0.0",
                    "react-dom",
                    "dist/react-dom.js",
                    "dist/react-dom.min.js",
                ))
                .range(urls(
                    ">=16.0.0 <19.0.0",
                    "react-dom",
                    "umd/react-dom.development.js",
                    "umd/react-dom.production.min.js",
                )),
        )
        .with_module(
            ModuleEntry::new("prop-types", "PropTypes").range(urls(
                "^15.0.0",
                "prop-types",
                "prop-types.js",
                "prop-types.min.js",
            )),
        )
        .with_module(
            ModuleEntry::new("vue", "Vue")
                .range(urls("^2.0.0", "vue", "dist/vue.js", "dist/vue.min.js"))
                .range(urls(
                    "^3.0.0",
                    "vue",
                    "dist/vue.global.js",
                    "dist/vue.global.prod.js",
                )),
        )
        .with_module(
            ModuleEntry::new("lodash", "_").range(urls(
                "^4.0.0",
                "lodash",
                "lodash.js",
                "lodash.min.js",
            )),
        )
        .with_module(
            ModuleEntry::new("moment", "moment").range(urls(
                "*",
                "moment",
                "moment.js",
                "min/moment.min.js",
            )),
        )
        .with_module(
            ModuleEntry::new("antd", "antd").range(urls(
                "*",
                "antd",
                "dist/antd.js",
                "dist/antd.min.js",
            )),
        )
        .with_module(
            ModuleEntry::new(
                "antd/dist/antd.variable.min.css",
                "antd/dist/antd.variable.min.css",
            )
            .kind(ModuleKind::Css)
            .range(urls(
                "*",
                "antd",
                "dist/antd.variable.css",
                "dist/antd.variable.min.css",
            )),
        )
        .with_module(
            ModuleEntry::new("antd/dist/antd.variable.css", "antd/dist/antd.variable.css")
                .kind(ModuleKind::Css)
                .range(urls(
                    "*",
                    "antd",
                    "dist/antd.variable.css",
                    "dist/antd.variable.min.css",
                )),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::policy::CdnResolver;

    #[test]
    fn test_builtin_table_is_valid() {
        let table = builtin_table();
        table.validate().unwrap();
        assert!(table.get("react").is_some());
        assert!(table.get("left-pad").is_none());
    }

    #[test]
    fn test_react_umd_builds() {
        let table = builtin_table();
        let react = table
            .resolve("react", "18.2.0", Environment::Development)
            .unwrap()
            .unwrap();
        assert_eq!(
            react.url,
            "https://unpkg.com/react@18.2.0/umd/react.development.js"
        );
        assert_eq!(react.exported_identifier, "React");

        // React 19 stopped publishing UMD builds
        assert!(table
            .resolve("react", "19.0.0", Environment::Production)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_antd_stylesheet() {
        let table = builtin_table();
        let css = table
            .resolve("antd/dist/antd.variable.css", "4.20.0", Environment::Production)
            .unwrap()
            .unwrap();
        assert_eq!(css.kind, ModuleKind::Css);
        assert!(css.url.ends_with("antd.variable.min.css"));
    }
}
