//! Engine integration tests: whole-pipeline compilations.

use sable_core::{Engine, ImportEntry, Options, OutputStyle};

fn options_with_style(style: OutputStyle) -> Options {
    Options {
        style,
        ..Default::default()
    }
}

#[test]
fn test_nested_rules_through_pipeline() {
    let options = options_with_style(OutputStyle::Expanded);
    let out = Engine::new(&options)
        .compile_data("nav { ul { margin: 0; li { display: inline-block } } }")
        .unwrap();

    assert!(out.css.contains("nav ul {\n  margin: 0;\n}"));
    assert!(out.css.contains("nav ul li {\n  display: inline-block;\n}"));
}

#[test]
fn test_media_query_preserved_around_imports() {
    let options = Options::default();
    let mut hook = |spec: &str, _parent: &str| {
        Some(vec![ImportEntry::literal(
            spec,
            "p { margin: 0 }",
        )])
    };
    let out = Engine::with_importer(&options, &mut hook)
        .compile_data("@media print { @import \"reset\"; a { color: black } }")
        .unwrap();

    assert!(out.css.contains("@media print {"));
    assert!(out.css.contains("margin: 0;"));
    assert!(out.css.contains("color: black;"));
}

#[test]
fn test_import_chain_order_and_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("_base.scss"), "b { x: 1 }").unwrap();
    std::fs::write(
        dir.path().join("_theme.scss"),
        "@import \"base\";\nt { x: 2 }",
    )
    .unwrap();
    let options = Options {
        include_paths: vec![dir.path().to_path_buf()],
        ..Default::default()
    };
    let out = Engine::new(&options)
        .compile_data("@import \"theme\";\ne { x: 3 }")
        .unwrap();

    let base = out.css.find("x: 1").unwrap();
    let theme = out.css.find("x: 2").unwrap();
    let entry = out.css.find("x: 3").unwrap();
    assert!(base < theme && theme < entry);

    assert_eq!(out.included_files.len(), 2);
    assert!(out.included_files[0].ends_with("_theme.scss"));
    assert!(out.included_files[1].ends_with("_base.scss"));
}

#[test]
fn test_each_style_compiles_same_input() {
    let source = "a { b: 1.5 } c d { e: f }";
    for style in [
        OutputStyle::Nested,
        OutputStyle::Expanded,
        OutputStyle::Compact,
        OutputStyle::Compressed,
    ] {
        let options = options_with_style(style);
        let out = Engine::new(&options).compile_data(source).unwrap();
        assert!(out.css.contains("1.5"), "style {style:?} lost a value");
    }
}

#[test]
fn test_error_position_in_imported_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("_broken.scss"), "ok { fine: 1 }\nbad {").unwrap();
    let options = Options {
        include_paths: vec![dir.path().to_path_buf()],
        ..Default::default()
    };
    let err = Engine::new(&options)
        .compile_data("@import \"broken\";")
        .unwrap_err();

    assert!(err.file.ends_with("_broken.scss"));
    assert_eq!(err.line, 2);
}

#[test]
fn test_indented_entry_with_braced_import() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("_mixins.scss"), "m { n: 1 }").unwrap();
    let options = Options {
        indented_syntax: true,
        include_paths: vec![dir.path().to_path_buf()],
        ..Default::default()
    };
    // the indented flag applies to the entry only; imported files are
    // braced as usual
    let out = Engine::new(&options)
        .compile_data("@import \"mixins\"\nbody\n  margin: 0\n")
        .unwrap();

    assert!(out.css.contains("n: 1;"));
    assert!(out.css.contains("margin: 0;"));
}

#[test]
fn test_source_map_lists_imports() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("_dep.scss"), "d { e: 1 }").unwrap();
    let options = Options {
        source_map_file: Some("app.css.map".to_string()),
        source_map_contents: true,
        include_paths: vec![dir.path().to_path_buf()],
        ..Default::default()
    };
    let out = Engine::new(&options)
        .compile_data("@import \"dep\";")
        .unwrap();

    let map: serde_json::Value = serde_json::from_str(out.source_map.as_deref().unwrap()).unwrap();
    assert_eq!(map["sources"][0], "stdin");
    assert!(map["sources"][1]
        .as_str()
        .unwrap()
        .ends_with("_dep.scss"));
    assert_eq!(map["sourcesContent"][1], "d { e: 1 }");
}
