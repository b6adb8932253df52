use anserial::destructure::Captured;
use anserial::prelude::*;

fn results_document(entries: u32) -> Document {
    let mut ser = Serializer::new();
    let data = ser.default_layout().unwrap();
    let results = ser.add_container(data).unwrap();
    for i in 0..entries {
        ser.add_literal(
            results,
            &literal![
                "results",
                ["i-19937", (i * 19937)],
                ["i-2048", (i * 2048)]
            ],
        )
        .unwrap();
    }
    ser.add_symtab(0).unwrap();
    Document::decode(ser.as_bytes()).unwrap()
}

#[test]
fn results_entries_are_captured() {
    let doc = results_document(4);
    let tree = doc.tree();

    let mut captures = Captures::new();
    let container = captures.node();
    assert!(destructure(doc.data(), &pattern![container], &mut captures).unwrap());
    let container = tree.get(captures.get_node(container).unwrap()).unwrap();
    assert_eq!(container.children().len(), 4);

    let (a, b) = (captures.integer(), captures.integer());
    let entry = pattern!["results", ["i-19937", a], ["i-2048", b]];
    for (i, node) in container.children().enumerate() {
        assert!(destructure(Some(node), &entry, &mut captures).unwrap());
        assert_eq!(captures.get_integer(a), Some(i as u32 * 19937));
        assert_eq!(captures.get_integer(b), Some(i as u32 * 2048));
    }
}

#[test]
fn mismatches_return_false() {
    let doc = results_document(1);
    let entry = doc.data().unwrap().get_by_index(0).unwrap().get_by_index(0).unwrap();
    let mut captures = Captures::new();

    let wrong_symbol = pattern!["result", ["i-19937", 0u32]];
    assert!(!destructure(Some(entry), &wrong_symbol, &mut captures).unwrap());

    let wrong_value = pattern!["results", ["i-19937", 1u32]];
    assert!(!destructure(Some(entry), &wrong_value, &mut captures).unwrap());

    // The container holds three children, the pattern asks for four.
    let too_long = pattern!["results", ["i-19937", 0u32], ["i-2048", 0u32], "extra"];
    assert!(!destructure(Some(entry), &too_long, &mut captures).unwrap());

    // A prefix of the children is enough.
    let prefix = pattern!["results"];
    assert!(destructure(Some(entry), &prefix, &mut captures).unwrap());

    // A leaf pattern against a container.
    assert!(!destructure(Some(entry), &Pattern::Integer(0), &mut captures).unwrap());
}

#[test]
fn version_map_is_matched_by_key() {
    let doc = results_document(0);
    let mut captures = Captures::new();
    let (major, minor) = (captures.integer(), captures.integer());

    let pattern = pattern![{ "minor": minor, "major": major }];
    // The pattern above is a one-element list wrapping the map pattern.
    let Pattern::List(items) = &pattern else {
        unreachable!()
    };
    assert!(destructure(doc.version_node(), &items[0], &mut captures).unwrap());
    assert_eq!(captures.get_integer(major), Some(FORMAT_VERSION.major as u32));
    assert_eq!(captures.get_integer(minor), Some(FORMAT_VERSION.minor as u32));
}

#[test]
fn version_literals_and_bindings() {
    let doc = results_document(0);
    let version = doc.version_node();
    let mut captures = Captures::new();

    let exact = Pattern::map([
        ("major", Pattern::Integer(0)),
        ("minor", Pattern::Integer(1)),
        ("patch", Pattern::Integer(0)),
    ]);
    assert!(destructure(version, &exact, &mut captures).unwrap());

    let minor = captures.integer();
    let bound = Pattern::map([
        ("major", Pattern::Integer(0)),
        ("minor", Pattern::Capture(minor)),
        ("patch", Pattern::Integer(0)),
    ]);
    assert!(destructure(version, &bound, &mut captures).unwrap());
    assert_eq!(captures.get_integer(minor), Some(1));

    let wrong_major = Pattern::map([
        ("major", Pattern::Integer(1)),
        ("minor", Pattern::Integer(1)),
        ("patch", Pattern::Integer(0)),
    ]);
    assert!(!destructure(version, &wrong_major, &mut captures).unwrap());
}

#[test]
fn map_patterns_require_every_key() {
    let doc = results_document(0);
    let version = doc.version_node();
    let mut captures = Captures::new();
    let slot = captures.integer();

    let missing = Pattern::map([
        ("major", Pattern::Capture(slot)),
        ("epoch", Pattern::Capture(slot)),
    ]);
    assert!(!destructure(version, &missing, &mut captures).unwrap());

    let odd = Pattern::list([Pattern::symbol("major")]);
    assert!(!destructure(version, &odd, &mut captures).unwrap());

    let non_symbol_key = Pattern::list([Pattern::Integer(0), Pattern::Integer(0)]);
    assert!(!destructure(version, &non_symbol_key, &mut captures).unwrap());
}

#[test]
fn capture_rules() {
    let tree = parse("(7 \"text\" sym)").unwrap();
    let root = tree.root().unwrap();
    let mut captures = Captures::new();
    let (int, string, node) = (captures.integer(), captures.string(), captures.node());

    // Type mismatch fails an integer or string capture.
    let swapped = Pattern::list([Pattern::Capture(string), Pattern::Capture(int)]);
    assert!(!destructure(Some(root), &swapped, &mut captures).unwrap());

    let pattern = Pattern::list([Pattern::from(int), Pattern::from(string), Pattern::from(node)]);
    assert!(destructure(Some(root), &pattern, &mut captures).unwrap());
    assert_eq!(captures.get_integer(int), Some(7));
    assert_eq!(captures.get_string(string), Some("text"));
    assert_eq!(
        captures.get(node),
        Some(&Captured::Node(root.get_by_index(2).unwrap().id()))
    );

    // A capture against a missing node succeeds without writing anything.
    captures.clear();
    assert!(destructure(None, &Pattern::Capture(int), &mut captures).unwrap());
    assert_eq!(captures.get_integer(int), None);

    // Any other pattern against a missing node fails.
    assert!(!destructure(None, &Pattern::symbol("sym"), &mut captures).unwrap());
}

#[test]
fn strings_and_symbols_match_exactly() {
    let tree = parse("(\"hello\" world)").unwrap();
    let root = tree.root().unwrap();
    let mut captures = Captures::new();

    let good = Pattern::list([Pattern::string("hello"), Pattern::symbol("world")]);
    assert!(destructure(Some(root), &good, &mut captures).unwrap());

    // A symbol pattern does not match a string node with the same text.
    let confused = Pattern::list([Pattern::symbol("hello")]);
    assert!(!destructure(Some(root), &confused, &mut captures).unwrap());
}

struct Sum(u32);

impl CaptureSink for Sum {
    fn write_integer(&mut self, _slot: usize, value: u32) {
        self.0 += value;
    }
    fn write_string(&mut self, _slot: usize, _value: &str) {}
    fn write_node(&mut self, _slot: usize, _node: NodeId) {}
}

#[test]
fn custom_sinks_receive_captures() {
    let tree = parse("(1 2 3)").unwrap();
    let mut sum = Sum(0);
    let all = Capture::Integer(0);
    let pattern = pattern![all, all, all];
    assert!(destructure(tree.root(), &pattern, &mut sum).unwrap());
    assert_eq!(sum.0, 6);
}
