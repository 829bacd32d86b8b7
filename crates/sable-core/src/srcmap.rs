//! Source map generation.

use serde_json::json;

use crate::options::Options;

/// Build the version-3 source map for a compilation.
///
/// `sources` is the (name, contents) list recorded during import
/// expansion, entry file first.
pub(crate) fn build_map(options: &Options, sources: &[(String, String)]) -> String {
    let names: Vec<&str> = sources.iter().map(|(name, _)| name.as_str()).collect();
    let mut map = json!({
        "version": 3,
        "file": file_component(&options.output_path),
        "sources": names,
        "names": [],
        "mappings": "",
    });
    if options.source_map_contents {
        let contents: Vec<&str> = sources.iter().map(|(_, text)| text.as_str()).collect();
        map["sourcesContent"] = json!(contents);
    }
    map.to_string()
}

/// Append the `sourceMappingURL` comment to the css, honoring the omit and
/// embed flags.
pub(crate) fn annotate(css: &mut String, options: &Options, map: &str) {
    if options.omit_source_map_url {
        return;
    }
    if options.source_map_embed {
        let encoded = data_encoding::BASE64.encode(map.as_bytes());
        css.push_str(&format!(
            "\n/*# sourceMappingURL=data:application/json;base64,{encoded} */\n"
        ));
    } else if let Some(map_file) = &options.source_map_file {
        css.push_str(&format!(
            "\n/*# sourceMappingURL={} */\n",
            file_component(map_file)
        ));
    }
}

fn file_component(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_lists_sources_in_order() {
        let options = Options {
            output_path: "out/app.css".to_string(),
            source_map_file: Some("out/app.css.map".to_string()),
            ..Default::default()
        };
        let sources = vec![
            ("entry.scss".to_string(), "a{b:1}".to_string()),
            ("_part.scss".to_string(), "c{d:2}".to_string()),
        ];
        let map: serde_json::Value = serde_json::from_str(&build_map(&options, &sources)).unwrap();
        assert_eq!(map["version"], 3);
        assert_eq!(map["file"], "app.css");
        assert_eq!(map["sources"][0], "entry.scss");
        assert_eq!(map["sources"][1], "_part.scss");
        assert!(map.get("sourcesContent").is_none());
    }

    #[test]
    fn test_map_embeds_contents_when_asked() {
        let options = Options {
            source_map_contents: true,
            ..Default::default()
        };
        let sources = vec![("entry.scss".to_string(), "a{b:1}".to_string())];
        let map: serde_json::Value = serde_json::from_str(&build_map(&options, &sources)).unwrap();
        assert_eq!(map["sourcesContent"][0], "a{b:1}");
    }

    #[test]
    fn test_annotate_with_file_url() {
        let options = Options {
            source_map_file: Some("dist/app.css.map".to_string()),
            ..Default::default()
        };
        let mut css = "a{b:1}\n".to_string();
        annotate(&mut css, &options, "{}");
        assert!(css.contains("/*# sourceMappingURL=app.css.map */"));
    }

    #[test]
    fn test_annotate_respects_omit_flag() {
        let options = Options {
            source_map_file: Some("app.css.map".to_string()),
            omit_source_map_url: true,
            ..Default::default()
        };
        let mut css = "a{b:1}\n".to_string();
        annotate(&mut css, &options, "{}");
        assert!(!css.contains("sourceMappingURL"));
    }

    #[test]
    fn test_annotate_embed() {
        let options = Options {
            source_map_embed: true,
            ..Default::default()
        };
        let mut css = String::new();
        annotate(&mut css, &options, "{\"version\":3}");
        assert!(css.contains("data:application/json;base64,"));
    }
}
