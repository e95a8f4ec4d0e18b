//! Coordinator integration tests
//!
//! Drives the coordinator the way a bundler host would: one call per module
//! request, then one document tag hook call.

use cdnext_core::{
    AssetTags, CdnError, CdnResolver, Coordinator, Environment, ExternalReference,
    FactorizeOutcome, FnResolver, HtmlTag, ModuleEntry, ModuleKind, ModuleTable,
    NodeModulesMetadata, PackageMetadata, PluginOptions, Rejection, StaticMetadata,
    SubstitutionDescriptor, VersionUrls, builtin_table,
};
use std::fs;
use std::path::Path;

const CTX: &str = "/project/src";

fn ctx() -> &'static Path {
    Path::new(CTX)
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn react_metadata() -> StaticMetadata {
    StaticMetadata::new()
        .with_package("react", PackageMetadata::new("18.2.0"))
        .with_package(
            "react-dom",
            PackageMetadata::new("18.2.0").with_peer("react", "^18.2.0"),
        )
        .with_package("antd", PackageMetadata::new("4.20.0"))
        .with_package("lodash", PackageMetadata::new("4.17.21"))
}

fn build(options: PluginOptions, metadata: StaticMetadata) -> Coordinator {
    Coordinator::builder(options)
        .metadata(metadata)
        .build()
        .unwrap()
}

fn script_srcs(tags: &AssetTags) -> Vec<&str> {
    tags.scripts.iter().filter_map(|t| t.get("src")).collect()
}

#[test]
fn test_antd_production_url() {
    let descriptor = builtin_table()
        .resolve("antd", "4.2.0", Environment::Production)
        .unwrap()
        .unwrap();

    assert!(descriptor.url.ends_with("antd.min.js"));
    assert_eq!(descriptor.exported_identifier, "antd");
}

#[test]
fn test_unknown_modules_never_resolve() {
    let table = builtin_table();
    for version in ["0.0.1", "1.0.0", "99.0.0"] {
        for env in [Environment::Development, Environment::Production] {
            assert!(table.resolve("left-pad", version, env).unwrap().is_none());
        }
    }
}

#[test]
fn test_stylesheet_is_registered_but_not_externalized() {
    let mut coordinator = build(PluginOptions::default(), react_metadata());

    let outcome = coordinator.handle_module_request(ctx(), "antd/dist/antd.variable.css");
    assert_eq!(outcome, FactorizeOutcome::Default);

    let registered = coordinator
        .registry()
        .get("antd/dist/antd.variable.css")
        .unwrap();
    assert_eq!(registered.kind, ModuleKind::Css);

    let tags = coordinator.alter_asset_tags(AssetTags::default());
    assert!(tags.scripts.is_empty());
    assert_eq!(tags.styles.len(), 1);
    assert_eq!(
        tags.styles[0].get("href"),
        Some("https://unpkg.com/antd@4.20.0/dist/antd.variable.min.css")
    );
}

#[test]
fn test_stylesheet_and_script_of_one_package_coexist() {
    let mut coordinator = build(PluginOptions::default(), react_metadata());

    assert!(coordinator.handle_module_request(ctx(), "antd").is_external());
    coordinator.handle_module_request(ctx(), "antd/dist/antd.variable.css");

    let tags = coordinator.markup();
    assert_eq!(script_srcs(&tags), ["https://unpkg.com/antd@4.20.0/dist/antd.min.js"]);
    assert_eq!(tags.styles.len(), 1);
}

#[test]
fn test_excluded_module_is_rejected() {
    let options = PluginOptions {
        exclude: names(&["antd"]),
        ..Default::default()
    };
    let mut coordinator = build(options, react_metadata());

    assert_eq!(
        coordinator.add_module(ctx(), "antd"),
        Err(Rejection::Excluded("antd".into()))
    );
    assert!(coordinator.registry().is_empty());
}

#[test]
fn test_exclude_and_only_fail_construction() {
    let options = PluginOptions {
        exclude: names(&["antd"]),
        only: Some(names(&["react"])),
        ..Default::default()
    };
    let result = Coordinator::builder(options).metadata(react_metadata()).build();
    assert!(matches!(result, Err(CdnError::Config(_))));
}

#[test]
fn test_only_list() {
    let options = PluginOptions {
        only: Some(names(&["lodash"])),
        ..Default::default()
    };
    let mut coordinator = build(options, react_metadata());

    assert!(coordinator.add_module(ctx(), "lodash").is_ok());
    assert_eq!(
        coordinator.add_module(ctx(), "antd"),
        Err(Rejection::NotInOnlyList("antd".into()))
    );
}

#[test]
fn test_repeat_request_uses_cached_descriptor() {
    let mut coordinator = build(PluginOptions::default(), react_metadata());

    let first = coordinator.add_module(ctx(), "lodash").unwrap();
    let second = coordinator.add_module(Path::new("/project/src/deep"), "lodash").unwrap();

    assert_eq!(first, second);
    assert_eq!(coordinator.registry().len(), 1);
}

#[test]
fn test_version_conflict_keeps_first_entry() {
    let tmp = tempfile::tempdir().unwrap();
    for (app, version) in [("app-a", "4.17.21"), ("app-b", "4.17.20")] {
        let dir = tmp.path().join(app).join("node_modules").join("lodash");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("package.json"),
            format!(r#"{{"name": "lodash", "version": "{}"}}"#, version),
        )
        .unwrap();
    }

    let mut coordinator = Coordinator::builder(PluginOptions::default())
        .metadata(NodeModulesMetadata::new())
        .build()
        .unwrap();

    let first = coordinator
        .add_module(&tmp.path().join("app-a"), "lodash")
        .unwrap();
    let conflict = coordinator
        .add_module(&tmp.path().join("app-b"), "lodash")
        .unwrap_err();

    assert_eq!(
        conflict,
        Rejection::VersionConflict {
            name: "lodash".into(),
            registered: "4.17.21".into(),
            requested: "4.17.20".into(),
        }
    );
    assert_eq!(coordinator.registry().len(), 1);
    assert_eq!(coordinator.registry().get("lodash"), Some(&first));
    assert_eq!(
        coordinator.handle_module_request(&tmp.path().join("app-b"), "lodash"),
        FactorizeOutcome::Default
    );
}

#[test]
fn test_conflict_is_keyed_by_request_not_resolver_name() {
    let tmp = tempfile::tempdir().unwrap();
    for (app, version) in [("app-a", "3.7.1"), ("app-b", "2.2.4")] {
        let dir = tmp.path().join(app).join("node_modules").join("jquery");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("package.json"),
            format!(r#"{{"name": "jquery", "version": "{}"}}"#, version),
        )
        .unwrap();
    }

    // Reports a display name that differs from the request path
    let jquery = FnResolver::new("jquery", |module: &str, version: &str, _env: Environment| {
        (module == "jquery").then(|| SubstitutionDescriptor {
            name: "jQuery".into(),
            exported_identifier: "jQuery".into(),
            url: format!("https://cdn/jquery-{}.js", version),
            version: version.into(),
            kind: ModuleKind::Js,
        })
    });
    let mut coordinator = Coordinator::builder(PluginOptions::default())
        .metadata(NodeModulesMetadata::new())
        .resolver(jquery)
        .build()
        .unwrap();

    let first = coordinator
        .add_module(&tmp.path().join("app-a"), "jquery")
        .unwrap();
    assert_eq!(first.version, "3.7.1");

    let again = coordinator
        .add_module(&tmp.path().join("app-a"), "jquery")
        .unwrap();
    assert_eq!(again, first);

    let conflict = coordinator
        .add_module(&tmp.path().join("app-b"), "jquery")
        .unwrap_err();
    assert_eq!(
        conflict,
        Rejection::VersionConflict {
            name: "jquery".into(),
            registered: "3.7.1".into(),
            requested: "2.2.4".into(),
        }
    );

    assert_eq!(coordinator.registry().len(), 1);
    assert_eq!(coordinator.registry().get("jquery"), Some(&first));
    assert_eq!(
        script_srcs(&coordinator.markup()),
        ["https://cdn/jquery-3.7.1.js"]
    );
}

#[test]
fn test_peer_closure_is_registered_first() {
    let mut coordinator = build(PluginOptions::default(), react_metadata());

    let outcome = coordinator.handle_module_request(ctx(), "react-dom");
    assert_eq!(
        outcome,
        FactorizeOutcome::External(ExternalReference {
            identifier: "ReactDOM".into(),
            request: "react-dom".into(),
        })
    );

    let tags = coordinator.markup();
    assert_eq!(
        script_srcs(&tags),
        [
            "https://unpkg.com/react@18.2.0/umd/react.production.min.js",
            "https://unpkg.com/react-dom@18.2.0/umd/react-dom.production.min.js",
        ]
    );

    // react is now cached; a direct request does not add a second tag
    assert!(coordinator.handle_module_request(ctx(), "react").is_external());
    assert_eq!(coordinator.registry().len(), 2);
}

#[test]
fn test_unsubstitutable_peer_rejects_requester() {
    let options = PluginOptions {
        exclude: names(&["react"]),
        ..Default::default()
    };
    let mut coordinator = build(options, react_metadata());

    let rejection = coordinator.add_module(ctx(), "react-dom").unwrap_err();
    assert_eq!(rejection.code(), "peer-rejected");
    assert_eq!(rejection.root_cause(), &Rejection::Excluded("react".into()));
    assert!(coordinator.registry().is_empty());
}

#[test]
fn test_failed_closure_rolls_back_accepted_peers() {
    let table = ModuleTable::new()
        .with_module(
            ModuleEntry::new("chart-kit", "ChartKit")
                .range(VersionUrls::new("*").production("https://cdn/chart-kit.js")),
        )
        .with_module(
            ModuleEntry::new("aaa-helpers", "AaaHelpers")
                .range(VersionUrls::new("*").production("https://cdn/aaa-helpers.js")),
        );
    let metadata = StaticMetadata::new()
        .with_package(
            "chart-kit",
            PackageMetadata::new("2.0.0")
                .with_peer("aaa-helpers", "*")
                .with_peer("zzz-unknown", "*"),
        )
        .with_package("aaa-helpers", PackageMetadata::new("1.0.0"))
        .with_package("zzz-unknown", PackageMetadata::new("1.0.0"));

    let mut coordinator = Coordinator::builder(PluginOptions::default())
        .metadata(metadata)
        .resolver(table)
        .build()
        .unwrap();

    let rejection = coordinator.add_module(ctx(), "chart-kit").unwrap_err();
    assert!(matches!(
        rejection.root_cause(),
        Rejection::NoCdnMatch { name, .. } if name == "zzz-unknown"
    ));
    assert!(coordinator.registry().is_empty());
}

#[test]
fn test_peer_cycle_is_a_closure_failure() {
    let table = ModuleTable::new()
        .with_module(
            ModuleEntry::new("ping", "Ping")
                .range(VersionUrls::new("*").production("https://cdn/ping.js")),
        )
        .with_module(
            ModuleEntry::new("pong", "Pong")
                .range(VersionUrls::new("*").production("https://cdn/pong.js")),
        );
    let metadata = StaticMetadata::new()
        .with_package("ping", PackageMetadata::new("1.0.0").with_peer("pong", "*"))
        .with_package("pong", PackageMetadata::new("1.0.0").with_peer("ping", "*"));

    let mut coordinator = Coordinator::builder(PluginOptions::default())
        .metadata(metadata)
        .resolver(table)
        .build()
        .unwrap();

    let rejection = coordinator.add_module(ctx(), "ping").unwrap_err();
    assert_eq!(rejection.root_cause(), &Rejection::PeerCycle("ping".into()));
    assert!(coordinator.registry().is_empty());
}

#[test]
fn test_peer_ranges_are_checked_only_when_enabled() {
    let metadata = || {
        StaticMetadata::new()
            .with_package("react", PackageMetadata::new("17.0.2"))
            .with_package(
                "react-dom",
                PackageMetadata::new("18.2.0").with_peer("react", "^18.2.0"),
            )
    };

    let mut lenient = build(PluginOptions::default(), metadata());
    assert!(lenient.add_module(ctx(), "react-dom").is_ok());

    let mut strict = build(
        PluginOptions {
            check_peer_ranges: true,
            ..Default::default()
        },
        metadata(),
    );
    assert_eq!(
        strict.add_module(ctx(), "react-dom"),
        Err(Rejection::PeerRangeMismatch {
            peer: "react".into(),
            version: "17.0.2".into(),
            range: "^18.2.0".into(),
        })
    );
    assert!(strict.registry().is_empty());
}

#[test]
fn test_environment_follows_build_mode() {
    let mut coordinator = Coordinator::builder(PluginOptions::default())
        .build_mode("development")
        .metadata(react_metadata())
        .build()
        .unwrap();
    assert_eq!(coordinator.environment(), Environment::Development);

    let descriptor = coordinator.add_module(ctx(), "lodash").unwrap();
    assert_eq!(descriptor.url, "https://unpkg.com/lodash@4.17.21/lodash.js");
}

#[test]
fn test_generated_tags_go_before_host_tags() {
    let mut coordinator = build(PluginOptions::default(), react_metadata());
    coordinator.handle_module_request(ctx(), "lodash");
    coordinator.handle_module_request(ctx(), "./local-module");

    let host = AssetTags {
        scripts: vec![HtmlTag::script("/static/js/main.js")],
        styles: vec![HtmlTag::stylesheet("/static/css/main.css")],
    };
    let tags = coordinator.alter_asset_tags(host.clone());
    assert_eq!(
        script_srcs(&tags),
        [
            "https://unpkg.com/lodash@4.17.21/lodash.min.js",
            "/static/js/main.js"
        ]
    );
    assert_eq!(tags.styles, host.styles);

    // the hook is a pure projection
    assert_eq!(coordinator.alter_asset_tags(host), tags);
}

#[test]
fn test_configured_table_extends_builtin() {
    let tmp = tempfile::tempdir().unwrap();
    let table_path = tmp.path().join("cdn.toml");
    fs::write(
        &table_path,
        r#"
        [[modules]]
        name = "dayjs"
        var = "dayjs"

        [[modules.versions]]
        range = "^1.0.0"
        production = "https://cdn.jsdelivr.net/npm/dayjs@[version]/dayjs.min.js"
        "#,
    )
    .unwrap();

    let options = PluginOptions {
        tables: vec![table_path],
        ..Default::default()
    };
    let metadata = react_metadata().with_package("dayjs", PackageMetadata::new("1.11.10"));
    let mut coordinator = build(options, metadata);

    let descriptor = coordinator.add_module(ctx(), "dayjs").unwrap();
    assert_eq!(
        descriptor.url,
        "https://cdn.jsdelivr.net/npm/dayjs@1.11.10/dayjs.min.js"
    );
    assert!(coordinator.add_module(ctx(), "lodash").is_ok());
}

#[test]
fn test_missing_table_file_fails_construction() {
    let options = PluginOptions {
        tables: vec!["/nonexistent/cdnext-table.toml".into()],
        ..Default::default()
    };
    assert!(Coordinator::builder(options).build().is_err());
}
