//! Plain-text encoding of freeform node graphs.
//!
//! ```text
//! nfgraph 1
//! [nodes]
//! d DiffuseBsdf color=tex:12:maps/wood.png roughness=0.5
//! out Output
//! [links]
//! d.bsdf -> out.surface
//! ```
//!
//! Node declarations come first, connections second. Blank lines and lines
//! starting with `#` are ignored. Values:
//! `0.5` float, `i:3` int, `true`/`false`, `rgb:r,g,b`, `vec:x,y,z`,
//! `str:text` and `tex:<id>:<path>`. Text and paths escape `%`, space,
//! tab and newline as `%25`, `%20`, `%09` and `%0A`.
//!
//! The empty string means "no graph" and is never handed to [`parse_graph`].

use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result, anyhow, bail};

use crate::{graph::topo_sort, host::TextureHandle, renderer::SocketValue};

pub const FORMAT_TAG: &str = "nfgraph";
pub const FORMAT_VERSION: u32 = 1;

const NODES_SECTION: &str = "[nodes]";
const LINKS_SECTION: &str = "[links]";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedGraph {
    pub nodes: Vec<NodeDecl>,
    pub links: Vec<LinkDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeDecl {
    pub id: String,
    pub node_type: String,
    pub params: BTreeMap<String, DeclValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclValue {
    Socket(SocketValue),
    Texture(TextureHandle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub node_id: String,
    pub socket: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDecl {
    pub from: Endpoint,
    pub to: Endpoint,
}

impl EncodedGraph {
    pub fn find_node(&self, id: &str) -> Option<&NodeDecl> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn incoming_link(&self, to_node_id: &str, to_socket: &str) -> Option<&LinkDecl> {
        self.links
            .iter()
            .find(|l| l.to.node_id == to_node_id && l.to.socket == to_socket)
    }

    fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.links
            .iter()
            .map(|l| (l.from.node_id.as_str(), l.to.node_id.as_str()))
    }

    /// Node ids in dependency order. Fails on cycles or dangling links.
    pub fn topo_order(&self) -> Result<Vec<String>> {
        topo_sort(self.nodes.iter().map(|n| n.id.as_str()), self.edges())
    }

    /// Drop nodes that cannot reach `output_id`, mirroring how editors leave
    /// disconnected leftovers behind.
    pub fn treeshake(&self, output_id: &str) -> EncodedGraph {
        let keep = crate::graph::upstream_reachable(output_id, self.edges());
        EncodedGraph {
            nodes: self
                .nodes
                .iter()
                .filter(|n| keep.contains(&n.id))
                .cloned()
                .collect(),
            links: self
                .links
                .iter()
                .filter(|l| keep.contains(&l.from.node_id) && keep.contains(&l.to.node_id))
                .cloned()
                .collect(),
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Header,
    Preamble,
    Nodes,
    Links,
}

pub fn parse_graph(text: &str) -> Result<EncodedGraph> {
    let mut graph = EncodedGraph::default();
    let mut section = Section::Header;
    let mut ids: HashSet<String> = HashSet::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if section == Section::Header {
            parse_header(line).with_context(|| format!("line {line_no}"))?;
            section = Section::Preamble;
            continue;
        }

        match line {
            NODES_SECTION => {
                if section != Section::Preamble {
                    bail!("line {line_no}: unexpected {NODES_SECTION} section");
                }
                section = Section::Nodes;
                continue;
            }
            LINKS_SECTION => {
                if section == Section::Links {
                    bail!("line {line_no}: duplicate {LINKS_SECTION} section");
                }
                section = Section::Links;
                continue;
            }
            _ => {}
        }

        match section {
            Section::Nodes => {
                let decl = parse_node_line(line).with_context(|| format!("line {line_no}"))?;
                if !ids.insert(decl.id.clone()) {
                    bail!("line {line_no}: duplicate node id: {}", decl.id);
                }
                graph.nodes.push(decl);
            }
            Section::Links => {
                let link = parse_link_line(line).with_context(|| format!("line {line_no}"))?;
                graph.links.push(link);
            }
            Section::Header | Section::Preamble => {
                bail!("line {line_no}: record outside of a section: {line}");
            }
        }
    }

    if section == Section::Header {
        bail!("missing '{FORMAT_TAG}' header");
    }

    graph.topo_order()?;
    Ok(graph)
}

fn parse_header(line: &str) -> Result<()> {
    let mut parts = line.split_whitespace();
    let tag = parts.next().unwrap_or("");
    if tag != FORMAT_TAG {
        bail!("expected '{FORMAT_TAG}' header, got '{tag}'");
    }
    let version: u32 = parts
        .next()
        .ok_or_else(|| anyhow!("missing format version"))?
        .parse()
        .context("invalid format version")?;
    if version == 0 || version > FORMAT_VERSION {
        bail!("unsupported graph format version {version} (supported: 1..={FORMAT_VERSION})");
    }
    Ok(())
}

fn parse_node_line(line: &str) -> Result<NodeDecl> {
    let mut parts = line.split_whitespace();
    let id = parts.next().ok_or_else(|| anyhow!("missing node id"))?;
    let node_type = parts
        .next()
        .ok_or_else(|| anyhow!("missing node type for {id}"))?;

    let mut params = BTreeMap::new();
    for token in parts {
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got '{token}'"))?;
        if key.is_empty() {
            bail!("empty parameter name in '{token}'");
        }
        let value = parse_value(value).with_context(|| format!("{id}.{key}"))?;
        params.insert(key.to_string(), value);
    }

    Ok(NodeDecl {
        id: id.to_string(),
        node_type: node_type.to_string(),
        params,
    })
}

fn parse_endpoint(s: &str) -> Result<Endpoint> {
    let (node_id, socket) = s
        .rsplit_once('.')
        .ok_or_else(|| anyhow!("expected <node>.<socket>, got '{s}'"))?;
    if node_id.is_empty() || socket.is_empty() {
        bail!("expected <node>.<socket>, got '{s}'");
    }
    Ok(Endpoint {
        node_id: node_id.to_string(),
        socket: socket.to_string(),
    })
}

fn parse_link_line(line: &str) -> Result<LinkDecl> {
    let (from, to) = line
        .split_once("->")
        .ok_or_else(|| anyhow!("expected '<from> -> <to>', got '{line}'"))?;
    Ok(LinkDecl {
        from: parse_endpoint(from.trim())?,
        to: parse_endpoint(to.trim())?,
    })
}

fn parse_triple(s: &str) -> Result<[f32; 3]> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        bail!("expected 3 components, got {}", parts.len());
    }
    let mut out = [0.0f32; 3];
    for (slot, p) in out.iter_mut().zip(parts) {
        *slot = p
            .trim()
            .parse()
            .with_context(|| format!("invalid component '{p}'"))?;
    }
    Ok(out)
}

fn parse_value(s: &str) -> Result<DeclValue> {
    let socket = |v: SocketValue| -> Result<DeclValue> { Ok(DeclValue::Socket(v)) };
    match s {
        "true" => return socket(SocketValue::Bool(true)),
        "false" => return socket(SocketValue::Bool(false)),
        _ => {}
    }
    if let Some(rest) = s.strip_prefix("i:") {
        return socket(SocketValue::Int(
            rest.parse().with_context(|| format!("invalid int '{rest}'"))?,
        ));
    }
    if let Some(rest) = s.strip_prefix("rgb:") {
        return socket(SocketValue::Color(parse_triple(rest)?));
    }
    if let Some(rest) = s.strip_prefix("vec:") {
        return socket(SocketValue::Vector(parse_triple(rest)?));
    }
    if let Some(rest) = s.strip_prefix("str:") {
        return socket(SocketValue::Text(unescape_token(rest)?));
    }
    if let Some(rest) = s.strip_prefix("tex:") {
        let (id, path) = rest
            .split_once(':')
            .ok_or_else(|| anyhow!("expected tex:<id>:<path>, got '{s}'"))?;
        let id: u64 = id
            .parse()
            .with_context(|| format!("invalid texture id '{id}'"))?;
        return Ok(DeclValue::Texture(TextureHandle::new(
            id,
            unescape_token(path)?,
        )));
    }
    let v: f32 = s
        .parse()
        .map_err(|_| anyhow!("unrecognized value '{s}'"))?;
    socket(SocketValue::Float(v))
}

fn escape_token(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '\t' => out.push_str("%09"),
            '\n' => out.push_str("%0A"),
            '\r' => out.push_str("%0D"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_token(s: &str) -> Result<String> {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let code = rest
            .get(pos + 1..pos + 3)
            .ok_or_else(|| anyhow!("truncated escape in '{s}'"))?;
        let ch = match code {
            "25" => '%',
            "20" => ' ',
            "09" => '\t',
            "0A" => '\n',
            "0D" => '\r',
            other => bail!("unknown escape %{other} in '{s}'"),
        };
        out.push(ch);
        rest = &rest[pos + 3..];
    }
    out.push_str(rest);
    Ok(out)
}

fn encode_triple(v: &[f32; 3]) -> String {
    format!("{},{},{}", v[0], v[1], v[2])
}

fn encode_value(v: &DeclValue) -> String {
    match v {
        DeclValue::Socket(SocketValue::Float(f)) => format!("{f}"),
        DeclValue::Socket(SocketValue::Int(i)) => format!("i:{i}"),
        DeclValue::Socket(SocketValue::Bool(b)) => b.to_string(),
        DeclValue::Socket(SocketValue::Color(c)) => format!("rgb:{}", encode_triple(c)),
        DeclValue::Socket(SocketValue::Vector(c)) => format!("vec:{}", encode_triple(c)),
        DeclValue::Socket(SocketValue::Text(t)) => format!("str:{}", escape_token(t)),
        DeclValue::Texture(t) => format!("tex:{}:{}", t.id, escape_token(&t.path)),
    }
}

pub fn encode_graph(graph: &EncodedGraph) -> String {
    let mut out = format!("{FORMAT_TAG} {FORMAT_VERSION}\n{NODES_SECTION}\n");
    for n in &graph.nodes {
        out.push_str(&n.id);
        out.push(' ');
        out.push_str(&n.node_type);
        for (k, v) in &n.params {
            out.push(' ');
            out.push_str(k);
            out.push('=');
            out.push_str(&encode_value(v));
        }
        out.push('\n');
    }
    out.push_str(LINKS_SECTION);
    out.push('\n');
    for l in &graph.links {
        out.push_str(&format!(
            "{}.{} -> {}.{}\n",
            l.from.node_id, l.from.socket, l.to.node_id, l.to.socket
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
nfgraph 1
# a diffuse with a wood map
[nodes]
d DiffuseBsdf color=tex:12:maps/old%20wood.png roughness=0.5
out Output
[links]
d.bsdf -> out.surface
";

    #[test]
    fn parses_sample_graph() {
        let g = parse_graph(SAMPLE).unwrap();
        assert_eq!(g.nodes.len(), 2);
        let d = g.find_node("d").unwrap();
        assert_eq!(d.node_type, "DiffuseBsdf");
        assert_eq!(
            d.params.get("color"),
            Some(&DeclValue::Texture(TextureHandle::new(12, "maps/old wood.png")))
        );
        assert_eq!(
            d.params.get("roughness"),
            Some(&DeclValue::Socket(SocketValue::Float(0.5)))
        );
        let link = g.incoming_link("out", "surface").unwrap();
        assert_eq!(link.from.node_id, "d");
        assert_eq!(link.from.socket, "bsdf");
    }

    #[test]
    fn encode_then_parse_preserves_graph() {
        let g = parse_graph(SAMPLE).unwrap();
        let again = parse_graph(&encode_graph(&g)).unwrap();
        assert_eq!(g, again);
    }

    #[test]
    fn rejects_bad_headers_and_versions() {
        assert!(parse_graph("graph 1\n[nodes]\n").is_err());
        assert!(parse_graph("nfgraph 2\n[nodes]\n").is_err());
        assert!(parse_graph("# only a comment\n").is_err());
    }

    #[test]
    fn rejects_links_before_nodes_section_and_duplicates() {
        assert!(parse_graph("nfgraph 1\n[links]\n[nodes]\n").is_err());
        assert!(parse_graph("nfgraph 1\n[nodes]\na Value\na Value\n").is_err());
    }

    #[test]
    fn rejects_dangling_links_and_cycles() {
        let dangling = "nfgraph 1\n[nodes]\na Value\n[links]\na.value -> b.fac\n";
        assert!(parse_graph(dangling).is_err());

        let cyclic = "nfgraph 1\n[nodes]\na Math\nb Math\n[links]\na.value -> b.a\nb.value -> a.a\n";
        let err = parse_graph(cyclic).unwrap_err();
        assert!(format!("{err:#}").contains("cycle"));
    }

    #[test]
    fn rejects_unrecognized_values() {
        let err = parse_graph("nfgraph 1\n[nodes]\na Value value=banana\n").unwrap_err();
        assert!(format!("{err:#}").contains("unrecognized value"));
    }

    #[test]
    fn treeshake_drops_disconnected_nodes() {
        let text = "nfgraph 1\n[nodes]\nd DiffuseBsdf\nstray Value\nout Output\n[links]\nd.bsdf -> out.surface\n";
        let g = parse_graph(text).unwrap().treeshake("out");
        assert!(g.find_node("stray").is_none());
        assert_eq!(g.nodes.len(), 2);
    }

    #[test]
    fn escape_round_trip() {
        let s = "a b%c\td";
        assert_eq!(unescape_token(&escape_token(s)).unwrap(), s);
        assert!(unescape_token("bad%2").is_err());
    }
}
