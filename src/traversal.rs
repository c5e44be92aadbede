use std::fmt;
use std::str::FromStr;

use crate::document::Document;
use crate::error::EncoderError;

/// One hop from a document to its nested documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Chunks,
    Matches,
}

/// Parsed traversal path such as `"r"`, `"c"`, `"cc"` or `"r,m"`.
///
/// Each comma separated entry selects one level of the document tree:
/// `r` the roots, `c` chunks, `m` matches, letters read from the root down.
/// Entries are visited in the order given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalPath {
    raw: String,
    /// empty step list == roots
    paths: Vec<Vec<Step>>,
}

impl FromStr for TraversalPath {
    type Err = EncoderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| EncoderError::InvalidTraversalPath {
            path: s.to_string(),
            reason,
        };
        let mut paths: Vec<Vec<Step>> = Vec::new();
        for entry in s.split(',').map(str::trim) {
            let steps = match entry {
                "" => return Err(invalid("empty path entry".to_string())),
                "r" => Vec::new(),
                _ => entry
                    .chars()
                    .map(|c| match c {
                        'c' => Ok(Step::Chunks),
                        'm' => Ok(Step::Matches),
                        'r' => Err(invalid(format!("`r` must stand alone, found in `{entry}`"))),
                        other => Err(invalid(format!("unknown step `{other}`"))),
                    })
                    .collect::<Result<Vec<Step>, _>>()?,
            };
            if paths.contains(&steps) {
                return Err(invalid(format!("`{entry}` selected more than once")));
            }
            paths.push(steps);
        }
        Ok(Self {
            raw: s.to_string(),
            paths,
        })
    }
}

impl fmt::Display for TraversalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Position of a document inside a root slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocAddress {
    root: usize,
    steps: Vec<(Step, usize)>,
}

impl DocAddress {
    fn root(root: usize) -> Self {
        Self {
            root,
            steps: Vec::new(),
        }
    }

    fn child(&self, step: Step, index: usize) -> Self {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend_from_slice(&self.steps);
        steps.push((step, index));
        Self {
            root: self.root,
            steps,
        }
    }

    /// nesting depth, 0 for a root
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    pub fn resolve<'a>(&self, docs: &'a [Document]) -> Option<&'a Document> {
        let mut doc = docs.get(self.root)?;
        for (step, i) in &self.steps {
            doc = match step {
                Step::Chunks => doc.chunks.get(*i)?,
                Step::Matches => doc.matches.get(*i)?,
            };
        }
        Some(doc)
    }

    pub fn resolve_mut<'a>(&self, docs: &'a mut [Document]) -> Option<&'a mut Document> {
        let mut doc = docs.get_mut(self.root)?;
        for (step, i) in &self.steps {
            doc = match step {
                Step::Chunks => doc.chunks.get_mut(*i)?,
                Step::Matches => doc.matches.get_mut(*i)?,
            };
        }
        Some(doc)
    }
}

impl TraversalPath {
    /// Addresses of every selected document, in path order, then document order.
    pub fn addresses(&self, docs: &[Document]) -> Vec<DocAddress> {
        let mut out = Vec::new();
        for steps in &self.paths {
            for (i, doc) in docs.iter().enumerate() {
                collect(doc, DocAddress::root(i), steps, &mut out);
            }
        }
        out
    }

    /// Selected documents flattened into one list.
    pub fn traverse_flat<'a>(&self, docs: &'a [Document]) -> Vec<&'a Document> {
        self.addresses(docs)
            .iter()
            .filter_map(|addr| addr.resolve(docs))
            .collect()
    }
}

fn collect(doc: &Document, addr: DocAddress, steps: &[Step], out: &mut Vec<DocAddress>) {
    match steps.split_first() {
        None => out.push(addr),
        Some((step, rest)) => {
            let children = match step {
                Step::Chunks => &doc.chunks,
                Step::Matches => &doc.matches,
            };
            for (i, child) in children.iter().enumerate() {
                collect(child, addr.child(*step, i), rest, out);
            }
        }
    }
}
