use anserial::printer::{render_string, render_to};
use anserial::prelude::*;
use termcolor::Buffer;

fn sample_stream(with_symtab: bool) -> Vec<u8> {
    let mut ser = Serializer::new();
    let data = ser.default_layout().unwrap();
    ser.add_literal(data, &literal!["results", ["i-19937", 19937u32]])
        .unwrap();
    if with_symtab {
        ser.add_symtab(0).unwrap();
    }
    ser.into_bytes()
}

#[test]
fn envelope_is_located_and_printed() {
    let doc = Document::decode(&sample_stream(true)).unwrap();

    assert_eq!(doc.version(), Some(FORMAT_VERSION));
    assert_eq!(doc.pretty_string(80), "((results (i-19937 19937)))");

    let version = doc.pretty_doc(doc.version_node().unwrap());
    assert_eq!(render_string(&version, 80), "(map major 0 minor 1 patch 0)");
}

#[test]
fn lookup_goes_through_symtab() {
    let doc = Document::decode(&sample_stream(true)).unwrap();
    assert_eq!(doc.lookup("results"), Some("results"));
    assert_eq!(doc.lookup(hash_symbol("i-19937")), Some("i-19937"));
    assert_eq!(doc.lookup("never-emitted"), None);
    assert_eq!(doc.symtab().unwrap().kind(), EntityType::Map);
}

#[test]
fn unresolved_symbols_print_as_hashes() {
    let doc = Document::decode(&sample_stream(false)).unwrap();
    assert!(doc.symtab().is_none());
    assert_eq!(doc.lookup("results"), None);

    let text = doc.pretty_string(80);
    assert!(text.contains("#<symbol:#x0979f273>"), "got {text}");
    assert!(text.contains("19937"));
}

#[test]
fn streaming_ingest_refreshes_the_envelope() {
    let bytes = sample_stream(true);
    let mut doc = Document::default();
    assert!(doc.root().is_none());
    assert!(doc.data().is_none());

    // Root map, `::version` key and the version map: no `::data` yet.
    doc.ingest(&bytes[..3 * 8]).unwrap();
    assert_eq!(doc.data().unwrap().id(), NodeId::ROOT);

    for chunk in bytes[3 * 8..].chunks(5) {
        doc.ingest(chunk).unwrap();
    }
    assert_ne!(doc.data().unwrap().id(), NodeId::ROOT);
    assert_eq!(doc.version(), Some(FORMAT_VERSION));
    assert_eq!(doc.lookup("results"), Some("results"));
}

#[test]
fn parsed_trees_resolve_their_own_names() {
    let doc = Document::new(parse("(hello (world 1))").unwrap());
    assert_eq!(doc.lookup("world"), Some("world"));
    assert_eq!(doc.pretty_string(80), "(hello (world 1))");
    assert_eq!(
        doc.tree().root().unwrap().pretty_string(),
        "(hello (world 1))"
    );
}

#[test]
fn colored_rendering_writes_plain_text_without_colors() {
    let doc = Document::decode(&sample_stream(true)).unwrap();
    let mut out = Buffer::no_color();
    doc.pretty_render_to(1000, &mut out).unwrap();

    let text = String::from_utf8(out.into_inner()).unwrap();
    assert!(text.starts_with("(map ::version (map major 0 minor 1 patch 0) ::data"));
    assert!(text.contains("::symtab (map"));
    assert!(text.ends_with('\n'));

    let mut node = Buffer::no_color();
    render_to(&doc.pretty_doc(doc.data().unwrap()), 80, &mut node).unwrap();
    assert_eq!(node.as_slice(), b"((results (i-19937 19937)))");
}
