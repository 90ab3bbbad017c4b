use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered list of segments addressing a node inside a document.
///
/// Built from a dotted string (`"profile.address.city"`), a string with
/// bracket indices (`"items[0].name"`), or an explicit segment list. The empty
/// string is the root path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Path(Vec<String>);

impl Path {
    /// The path addressing the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Self::root();
        }
        let mut segments = Vec::new();
        for piece in path.split('.') {
            push_piece(piece, &mut segments);
        }
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn into_segments(self) -> Vec<String> {
        self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Dot-joined form, as recorded in patch history.
    pub fn joined(&self) -> String {
        self.0.join(".")
    }
}

fn push_piece(piece: &str, out: &mut Vec<String>) {
    let Some(open) = piece.find('[') else {
        out.push(piece.to_owned());
        return;
    };
    if open > 0 {
        out.push(piece[..open].to_owned());
    }
    let mut rest = &piece[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            // Unterminated bracket is kept literally.
            out.push(rest.to_owned());
            return;
        };
        out.push(unquote(&inner[..close]).to_owned());
        rest = &inner[close + 1..];
    }
    if !rest.is_empty() {
        out.push(rest.to_owned());
    }
}

fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            return inner;
        }
    }
    s
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl From<&str> for Path {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for Path {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl From<&String> for Path {
    fn from(path: &String) -> Self {
        Self::parse(path)
    }
}

impl From<Vec<String>> for Path {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<&[String]> for Path {
    fn from(segments: &[String]) -> Self {
        Self(segments.to_vec())
    }
}

impl From<Vec<&str>> for Path {
    fn from(segments: Vec<&str>) -> Self {
        Self(segments.into_iter().map(str::to_owned).collect())
    }
}

impl From<&[&str]> for Path {
    fn from(segments: &[&str]) -> Self {
        Self(segments.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Path {
    fn from(segments: [&str; N]) -> Self {
        Self(segments.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl From<&Path> for Path {
    fn from(path: &Path) -> Self {
        path.clone()
    }
}
