// tests/filter_document_test.rs

use gml_filter::{filter_document, filter_file, Error, FilterOptions, LocationPath};

use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

fn paths(exprs: &[&str]) -> Vec<LocationPath> {
    exprs.iter().map(|e| e.parse().unwrap()).collect()
}

fn filter(xml: &str, exprs: &[&str]) -> String {
    let mut output = Vec::new();
    filter_document(
        xml.as_bytes(),
        &mut output,
        paths(exprs),
        &FilterOptions::default(),
    )
    .unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn test_sibling_outside_path_is_dropped() {
    assert_eq!(
        filter("<a><b>X</b><c>Y</c></a>", &["/a/b"]),
        "<a><b>X</b></a>"
    );
}

#[test]
fn test_target_below_dropped_ancestor_is_not_reached() {
    assert_eq!(filter("<a><c><b>X</b></c></a>", &["/a/b"]), "<a></a>");
}

#[test]
fn test_no_paths_drop_everything() {
    assert_eq!(filter("<a/>", &[]), "");
}

#[test]
fn test_comments_around_dropped_root_are_kept() {
    assert_eq!(
        filter("<!--head--><a><!--inside--></a><!--tail-->", &[]),
        "<!--head--><!--tail-->"
    );
}

#[test]
fn test_single_step_path_matches_at_any_depth() {
    assert_eq!(
        filter("<b><x><b>1</b></x></b>", &["/b"]),
        "<b><x><b>1</b></x></b>"
    );
}

#[test]
fn test_anchored_path_matches_last_step_below_other_root() {
    // the root `b` lines up with the last step, its children do not
    assert_eq!(filter("<b><a/><b>1</b><c/></b>", &["/a/b"]), "<b></b>");
}

#[test]
fn test_attributes_and_text_of_matched_element_are_kept() {
    assert_eq!(
        filter(r#"<a attr="v">text</a>"#, &["/a"]),
        r#"<a attr="v">text</a>"#
    );
}

#[test]
fn test_descendants_of_target_are_kept() {
    assert_eq!(
        filter("<a><b><x>1</x><y/></b><c/></a>", &["/a/b"]),
        "<a><b><x>1</x><y/></b></a>"
    );
}

#[test]
fn test_any_of_several_paths() {
    assert_eq!(
        filter("<a><b/><c/><d/></a>", &["/a/b", "/a/d"]),
        "<a><b/><d/></a>"
    );
}

#[test]
fn test_anywhere_path() {
    assert_eq!(filter("<b><b/><c/></b>", &["//b"]), "<b><b/></b>");
    assert_eq!(filter("<a><b/></a>", &["//b"]), "");
}

#[test]
fn test_prolog_is_kept() {
    assert_eq!(
        filter(
            r#"<?xml version="1.0" encoding="UTF-8"?><!--head--><a><b/><c/></a>"#,
            &["/a/b"]
        ),
        r#"<?xml version="1.0" encoding="UTF-8"?><!--head--><a><b/></a>"#
    );
}

#[test]
fn test_gml_feature_collection_projection() {
    let xml = r#"<wfs:FeatureCollection xmlns:wfs="http://www.opengis.net/wfs/2.0" xmlns:gml="http://www.opengis.net/gml/3.2" xmlns:app="urn:app">
<wfs:boundedBy><gml:Envelope><gml:lowerCorner>0 0</gml:lowerCorner><gml:upperCorner>1 1</gml:upperCorner></gml:Envelope></wfs:boundedBy>
<wfs:member><app:Road gml:id="r1"><app:name>Main</app:name><app:geometry><gml:LineString><gml:posList>0 0 1 1</gml:posList></gml:LineString></app:geometry></app:Road></wfs:member>
<wfs:member><app:Road gml:id="r2"><app:name>Side</app:name><app:lanes>2</app:lanes></app:Road></wfs:member>
</wfs:FeatureCollection>"#;

    let bindings = HashMap::from([
        (
            "wfs".to_string(),
            "http://www.opengis.net/wfs/2.0".to_string(),
        ),
        ("app".to_string(), "urn:app".to_string()),
    ]);
    let paths = vec![
        LocationPath::parse("/wfs:FeatureCollection/wfs:member/app:Road/app:name", &bindings)
            .unwrap(),
    ];

    let mut output = Vec::new();
    let options = FilterOptions {
        indent: None,
        trim_text: true,
    };
    let summary = filter_document(xml.as_bytes(), &mut output, paths, &options).unwrap();
    let output = String::from_utf8(output).unwrap();

    assert_eq!(
        output,
        concat!(
            r#"<wfs:FeatureCollection xmlns:wfs="http://www.opengis.net/wfs/2.0" xmlns:gml="http://www.opengis.net/gml/3.2" xmlns:app="urn:app">"#,
            r#"<wfs:member><app:Road gml:id="r1"><app:name>Main</app:name></app:Road></wfs:member>"#,
            r#"<wfs:member><app:Road gml:id="r2"><app:name>Side</app:name></app:Road></wfs:member>"#,
            r#"</wfs:FeatureCollection>"#
        )
    );
    assert_eq!(summary.elements_written, 7);
    assert_eq!(summary.elements_dropped(), summary.elements_seen - 7);
}

#[test]
fn test_unprefixed_path_matches_any_namespace() {
    let xml = r#"<r xmlns="urn:x"><keep>1</keep><drop>2</drop></r>"#;
    assert_eq!(
        filter(xml, &["/r/keep"]),
        r#"<r xmlns="urn:x"><keep>1</keep></r>"#
    );
}

#[test]
fn test_filter_file() {
    let temp_dir = TempDir::new().unwrap();
    let input_path = temp_dir.path().join("input.gml");
    let output_path = temp_dir.path().join("output.gml");
    fs::write(&input_path, "<a><b>X</b><c>Y</c></a>").unwrap();

    let summary = filter_file(
        &input_path,
        &output_path,
        paths(&["/a/b"]),
        &FilterOptions::default(),
    )
    .unwrap();

    assert_eq!(summary.elements_seen, 3);
    assert_eq!(summary.elements_written, 2);
    assert_eq!(
        fs::read_to_string(&output_path).unwrap(),
        "<a><b>X</b></a>"
    );
}

#[test]
fn test_filter_file_missing_input() {
    let temp_dir = TempDir::new().unwrap();
    let result = filter_file(
        &temp_dir.path().join("missing.gml"),
        &temp_dir.path().join("out.gml"),
        paths(&["/a"]),
        &FilterOptions::default(),
    );
    assert!(matches!(result, Err(Error::Io(_))));
}
