//! RcDoc-based pretty-printer with termcolor annotations for trees.
//!
//! Containers print as parenthesized lists, maps as `(map key value ...)`, strings quoted,
//! integers in decimal and symbols by name when a resolver knows it, `#<symbol:#x...>`
//! otherwise. Inert nodes print as `#<kind>`. Non-empty lists and maps below [`MAX_DEPTH`]
//! print as `(...)`.
use std::io::{self, Write};

use pretty::{FmtWrite, RcDoc, RenderAnnotated};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::entity::EntityType;
use crate::node::NodeRef;
use crate::tree::MAX_DEPTH;

/// Styles used to annotate parts of the pretty-printed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Parentheses are colored by nesting depth so matching pairs share a color.
    Paren(u8),
    Keyword, // map
    Symbol,
    Integer,
    String,
    Opaque, // unresolved symbols and inert nodes
}

impl Style {
    fn to_color_spec(self) -> ColorSpec {
        let mut s = ColorSpec::new();
        match self {
            Style::Paren(depth) => {
                let fg = match depth % 6 {
                    0 => Color::Blue,
                    1 => Color::Green,
                    2 => Color::White,
                    3 => Color::Yellow,
                    4 => Color::Red,
                    _ => Color::Magenta,
                };
                s.set_fg(Some(fg)).set_dimmed(true);
            }
            Style::Keyword => {
                s.set_fg(Some(Color::Cyan)).set_bold(true);
            }
            Style::Symbol => {
                s.set_fg(Some(Color::Green)).set_bold(true);
            }
            Style::Integer => {
                s.set_fg(Some(Color::Yellow));
            }
            Style::String => {
                s.set_fg(Some(Color::Magenta));
            }
            Style::Opaque => {
                s.set_dimmed(true);
            }
        }
        s
    }
}

/// Symbol name resolver used while building documents.
pub type Names<'n> = dyn Fn(u32) -> Option<String> + 'n;

fn styled(style: Style, s: String) -> RcDoc<'static, Style> {
    RcDoc::as_string(s).annotate(style)
}

fn list(
    depth: usize,
    head: Option<RcDoc<'static, Style>>,
    items: Vec<RcDoc<'static, Style>>,
) -> RcDoc<'static, Style> {
    let indent = if head.is_some() { 2 } else { 1 };
    let mut first = head.is_none();
    let mut body = head.unwrap_or_else(RcDoc::nil);
    for item in items {
        if !first {
            body = body.append(RcDoc::line());
        }
        body = body.append(item);
        first = false;
    }

    let paren = Style::Paren((depth % 6) as u8);
    RcDoc::as_string("(")
        .annotate(paren)
        .append(body.nest(indent))
        .append(RcDoc::as_string(")").annotate(paren))
        .group()
}

fn to_doc_with_depth(
    node: NodeRef<'_>,
    names: &Names<'_>,
    depth: usize,
) -> RcDoc<'static, Style> {
    let nested = matches!(node.kind(), EntityType::Container | EntityType::Map);
    if nested && depth >= MAX_DEPTH && node.child_ids().len() + node.key_ids().len() > 0 {
        // Elided below the depth limit.
        return styled(Style::Opaque, "(...)".to_string());
    }

    match node.kind() {
        EntityType::Container => list(
            depth,
            None,
            node.children()
                .map(|child| to_doc_with_depth(child, names, depth + 1))
                .collect(),
        ),
        EntityType::Map => {
            // Pairs in stream order; a key still waiting for its value prints alone.
            let mut values = node.children();
            let items = node
                .keys()
                .map(|key| {
                    let key_doc = to_doc_with_depth(key, names, depth + 1);
                    match values.next() {
                        Some(value) => key_doc
                            .append(RcDoc::space())
                            .append(to_doc_with_depth(value, names, depth + 1)),
                        None => key_doc,
                    }
                })
                .collect();
            list(
                depth,
                Some(styled(Style::Keyword, "map".to_string())),
                items,
            )
        }
        EntityType::String => styled(
            Style::String,
            format!("\"{}\"", node.as_string().unwrap_or_default()),
        ),
        EntityType::Integer => styled(Style::Integer, node.payload().to_string()),
        EntityType::Symbol => match names(node.payload()) {
            Some(name) => styled(Style::Symbol, name),
            None => styled(Style::Opaque, format!("#<symbol:#x{:08x}>", node.payload())),
        },
        kind @ (EntityType::Set | EntityType::Null | EntityType::Reserved) => {
            styled(Style::Opaque, format!("#<{kind}>"))
        }
    }
}

/// Build the annotated document of `node`.
pub fn to_doc(node: NodeRef<'_>, names: &Names<'_>) -> RcDoc<'static, Style> {
    to_doc_with_depth(node, names, 0)
}

// A writer that maps Style annotations to termcolor ColorSpec on a WriteColor sink.
struct ColorWriter<'w, W: WriteColor + Write> {
    out: &'w mut W,
}

impl<'a, W: WriteColor + Write> RenderAnnotated<'a, Style> for ColorWriter<'_, W> {
    fn push_annotation(&mut self, ann: &'a Style) -> io::Result<()> {
        self.out.set_color(&ann.to_color_spec())
    }
    fn pop_annotation(&mut self) -> io::Result<()> {
        self.out.reset()
    }
}

impl<W: WriteColor + Write> pretty::Render for ColorWriter<'_, W> {
    type Error = io::Error;
    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        self.out.write_all(s.as_bytes())?;
        Ok(s.len())
    }
    fn write_str_all(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(s.as_bytes())
    }
    fn fail_doc(&self) -> Self::Error {
        io::Error::other("render failed")
    }
}

/// Render a document to a `termcolor::WriteColor` with width-aware layout.
pub fn render_to<W: WriteColor + Write>(
    doc: &RcDoc<'_, Style>,
    width: usize,
    out: &mut W,
) -> io::Result<()> {
    let mut cw = ColorWriter { out };
    doc.render_raw(width, &mut cw)
}

/// Render a document without colors.
pub fn render_string(doc: &RcDoc<'_, Style>, width: usize) -> String {
    let mut buf = String::new();
    // Writing into a String never fails.
    let _ = doc.render_fmt(width, &mut buf);
    buf
}

/// Width of the terminal, or 80 if it cannot be determined.
pub fn terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Pretty-printing conveniences for nodes. Symbol names come from the names the owning tree
/// recorded while parsing text; use [`Document`](crate::document::Document) to resolve them
/// through `::symtab`.
pub trait PrettyNode {
    fn pretty_doc(&self) -> RcDoc<'static, Style>;

    fn pretty_render_to<W: WriteColor + Write>(&self, width: usize, out: &mut W) -> io::Result<()>;

    /// Print to stdout with colors (TTY-aware), at the terminal width.
    fn pretty_print(&self) -> io::Result<()>;

    fn pretty_string(&self) -> String;
}

impl PrettyNode for NodeRef<'_> {
    fn pretty_doc(&self) -> RcDoc<'static, Style> {
        let symbols = self.tree().symbols();
        to_doc(*self, &|hash| symbols.get(hash).map(str::to_string))
    }

    fn pretty_render_to<W: WriteColor + Write>(&self, width: usize, out: &mut W) -> io::Result<()> {
        render_to(&self.pretty_doc(), width, out)
    }

    fn pretty_print(&self) -> io::Result<()> {
        let stdout = StandardStream::stdout(ColorChoice::Auto);
        let mut stdout = stdout.lock();
        self.pretty_render_to(terminal_width(), &mut stdout)?;
        writeln!(stdout)
    }

    fn pretty_string(&self) -> String {
        render_string(&self.pretty_doc(), 80)
    }
}

impl std::fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut w = FmtWrite::new(f);
        self.pretty_doc().render_raw(80, &mut w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deserializer::Deserializer;
    use crate::parser::parse;
    use crate::serializer::Serializer;

    #[test]
    fn short_lists_stay_on_one_line() {
        let tree = parse("(a 1 \"x\" (b))").unwrap();
        assert_eq!(tree.root().unwrap().pretty_string(), "(a 1 \"x\" (b))");
    }

    #[test]
    fn long_lists_break() {
        let tree = parse("(alpha beta gamma)").unwrap();
        let doc = tree.root().unwrap().pretty_doc();
        assert_eq!(render_string(&doc, 8), "(alpha\n beta\n gamma)");
    }

    #[test]
    fn deep_lists_are_elided() {
        let mut ser = Serializer::new();
        let mut parent = ser.add_container(0).unwrap();
        for _ in 0..MAX_DEPTH {
            parent = ser.add_container(parent).unwrap();
        }
        ser.add_integer(parent, 7).unwrap();

        let tree = Deserializer::decode(ser.as_bytes()).unwrap();
        let printed = tree.root().unwrap().pretty_string();
        let closing = ")".repeat(MAX_DEPTH);
        assert!(printed.ends_with(&format!("(...){closing}")), "got {printed}");
        assert_eq!(printed.matches('(').count(), MAX_DEPTH + 1);
        assert!(!printed.contains('7'));
    }

    #[test]
    fn unknown_symbols_print_their_hash() {
        let tree = parse("(results)").unwrap();
        let root = tree.root().unwrap();
        assert_eq!(render_string(&to_doc(root, &|_| None), 80), "(#<symbol:#x0979f273>)");
    }
}
