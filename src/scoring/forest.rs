//! Decision-tree ensemble read from the XGBoost text dump format.
//!
//! ```text
//! booster[0]:
//! 0:[f0<0.5] yes=1,no=2,missing=1
//! 	1:leaf=0.25
//! 	2:leaf=-0.5
//! booster[1]:
//! 0:leaf=0.1
//! ```
//!
//! A split `[name<threshold]` sends the input to `yes` when
//! `x < threshold`, to `no` otherwise and to `missing` when `x` is NaN.
//! Trailing statistics (`gain=`, `cover=`) are ignored.

use super::types::Model;
use crate::error::ModelError;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f32,
        yes: usize,
        no: usize,
        missing: usize,
    },
    Leaf(f32),
}

/// One regression tree; node 0 is the root.
#[derive(Debug, Clone, PartialEq)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn predict(&self, input: &[f32]) -> f32 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                    missing,
                } => {
                    let x = input[feature];
                    idx = if x.is_nan() {
                        missing
                    } else if x < threshold {
                        yes
                    } else {
                        no
                    };
                }
            }
        }
    }
}

/// Additive ensemble of regression trees.
///
/// The raw score is `base_score + Σ tree(input)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Forest {
    n_features: usize,
    trees: Vec<Tree>,
}

impl Forest {
    /// A forest without trees; it scores every input as `base_score`.
    pub fn empty(n_features: usize) -> Self {
        Self {
            n_features,
            trees: Vec::new(),
        }
    }

    /// Number of trees in the ensemble.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Reads a text dump from disk.
    ///
    /// `feature_names[j]` is the name the dump uses for input `j`.
    pub fn load_txt(path: impl AsRef<Path>, feature_names: &[String]) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_txt(&text, feature_names)
    }

    /// Parses a text dump.
    pub fn parse_txt(text: &str, feature_names: &[String]) -> Result<Self, ModelError> {
        let features: HashMap<&str, usize> = feature_names
            .iter()
            .enumerate()
            .map(|(j, name)| (name.as_str(), j))
            .collect();

        let mut trees = Vec::new();
        let mut current: Option<TreeBuilder> = None;

        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with("booster[") {
                if let Some(builder) = current.take() {
                    trees.push(builder.finish(trees.len())?);
                }
                current = Some(TreeBuilder::default());
                continue;
            }

            let Some(builder) = current.as_mut() else {
                return Err(ModelError::Parse {
                    line: line_no,
                    message: "node defined before any booster header".into(),
                });
            };
            let (id, node) = parse_node(line, line_no, &features)?;
            builder.insert(id, node, line_no)?;
        }

        if let Some(builder) = current.take() {
            trees.push(builder.finish(trees.len())?);
        }

        Ok(Self {
            n_features: feature_names.len(),
            trees,
        })
    }
}

impl Model for Forest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn score(&self, input: &[f32], base_score: f32) -> f32 {
        self.trees
            .iter()
            .fold(base_score, |acc, tree| acc + tree.predict(input))
    }
}

/// Collects the nodes of one booster, keyed by their dump id.
///
/// Ids are sparse keys; no storage is sized from them.
#[derive(Default)]
struct TreeBuilder {
    nodes: BTreeMap<usize, (Node, usize)>,
}

impl TreeBuilder {
    fn insert(&mut self, id: usize, node: Node, line: usize) -> Result<(), ModelError> {
        if let Node::Split { yes, no, missing, .. } = node {
            if [yes, no, missing].iter().any(|&child| child <= id) {
                return Err(ModelError::Parse {
                    line,
                    message: format!("node {id} has a child id not greater than its own"),
                });
            }
        }
        if self.nodes.insert(id, (node, line)).is_some() {
            return Err(ModelError::Parse {
                line,
                message: format!("node {id} defined twice"),
            });
        }
        Ok(())
    }

    /// Compacts dump ids into dense indices and checks every child exists.
    fn finish(self, tree: usize) -> Result<Tree, ModelError> {
        if !self.nodes.contains_key(&0) {
            return Err(ModelError::MissingNode { tree, node: 0 });
        }

        let dense: HashMap<usize, usize> = self
            .nodes
            .keys()
            .enumerate()
            .map(|(idx, &id)| (id, idx))
            .collect();

        let resolve = |child: usize| -> Result<usize, ModelError> {
            dense
                .get(&child)
                .copied()
                .ok_or(ModelError::MissingNode { tree, node: child })
        };

        let mut nodes = Vec::with_capacity(self.nodes.len());
        for (node, _line) in self.nodes.into_values() {
            nodes.push(match node {
                Node::Leaf(value) => Node::Leaf(value),
                Node::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                    missing,
                } => Node::Split {
                    feature,
                    threshold,
                    yes: resolve(yes)?,
                    no: resolve(no)?,
                    missing: resolve(missing)?,
                },
            });
        }

        Ok(Tree { nodes })
    }
}

fn parse_node(
    line: &str,
    line_no: usize,
    features: &HashMap<&str, usize>,
) -> Result<(usize, Node), ModelError> {
    let parse_err = |message: String| ModelError::Parse {
        line: line_no,
        message,
    };

    let (id, rest) = line
        .split_once(':')
        .ok_or_else(|| parse_err(format!("expected `<id>:` in {line:?}")))?;
    let id: usize = id
        .trim()
        .parse()
        .map_err(|_| parse_err(format!("bad node id {id:?}")))?;
    let rest = rest.trim();

    if let Some(value) = rest.strip_prefix("leaf=") {
        let value = value.split(',').next().unwrap_or_default().trim();
        let value: f32 = value
            .parse()
            .map_err(|_| parse_err(format!("bad leaf value {value:?}")))?;
        return Ok((id, Node::Leaf(value)));
    }

    let Some(cond) = rest.strip_prefix('[') else {
        return Err(parse_err(format!("expected leaf or split in {rest:?}")));
    };
    let (cond, branches) = cond
        .split_once(']')
        .ok_or_else(|| parse_err("unterminated split condition".into()))?;
    let (name, threshold) = cond
        .split_once('<')
        .ok_or_else(|| parse_err(format!("expected `name<threshold` in {cond:?}")))?;
    let feature = *features
        .get(name.trim())
        .ok_or_else(|| ModelError::UnknownFeature {
            line: line_no,
            name: name.trim().to_string(),
        })?;
    let threshold: f32 = threshold
        .trim()
        .parse()
        .map_err(|_| parse_err(format!("bad threshold {threshold:?}")))?;

    let mut yes = None;
    let mut no = None;
    let mut missing = None;
    for pair in branches.trim().split(',') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let target = match key.trim() {
            "yes" => &mut yes,
            "no" => &mut no,
            "missing" => &mut missing,
            _ => continue,
        };
        let child: usize = value
            .trim()
            .parse()
            .map_err(|_| parse_err(format!("bad child id {value:?}")))?;
        *target = Some(child);
    }

    let yes = yes.ok_or_else(|| parse_err("split without `yes` branch".into()))?;
    let no = no.ok_or_else(|| parse_err("split without `no` branch".into()))?;

    Ok((
        id,
        Node::Split {
            feature,
            threshold,
            yes,
            no,
            missing: missing.unwrap_or(yes),
        },
    ))
}
