//! Shortcut compaction of redirect graphs.
//!
//! Given raw redirect pairs (possibly containing chains and cycles), rewrite
//! every surviving edge so it points directly at a terminal URL: one that has
//! no outgoing redirect of its own. Following a compacted redirect therefore
//! always terminates in one step.
//!
//! ## Algorithm
//!
//! 1. Build `edge: key(from) -> pair`. A later pair with the same case-folded
//!    source replaces an earlier one.
//! 2. For each source in key order, walk `s -> edge[s] -> ...` with an
//!    explicit path list (no recursion, so long chains cannot overflow the
//!    stack):
//!    - reaching a node with no outgoing edge: that node's URL is the
//!      terminal, and **every** node on the path is rewritten to it
//!    - reaching a node resolved by an earlier walk: reuse its terminal
//!    - revisiting a node on the current path: a cycle. Every node on the
//!      path is excluded from the output (or, in [`CycleMode::Strict`], the
//!      whole compaction fails)
//!    - reaching a node already excluded: the path leads into a cycle and is
//!      excluded too
//! 3. Sort the result by (from, to).
//!
//! ## Invariants
//!
//! - No output `to` is also an output `from` (compared case-insensitively)
//! - `compact(compact(p)) == compact(p)`
//! - The output depends only on the input set (plus last-wins for duplicate
//!   sources), not on its order

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::types::{RedirectPair, RedirectTarget};

/// How cycles are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CycleMode {
    /// Log a warning and drop the cyclic entries.
    #[default]
    Warn,
    /// Fail on the first cycle.
    Strict,
}

/// Error type for strict compaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompactError {
    /// A redirect chain loops back on itself.
    #[error("redirect cycle [{}] → {closing}", .path.join(", "))]
    Cycle {
        /// Sources visited before the loop closed, in walk order.
        path: Vec<String>,
        /// The URL that closed the loop.
        closing: String,
    },
}

/// Result of a compaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compaction {
    /// Flattened pairs, sorted by (from, to).
    pub pairs: Vec<RedirectPair>,
    /// Each cycle found, as the sources forming the loop.
    pub cycles: Vec<Vec<String>>,
    /// Sources dropped because they were on or led into a cycle.
    pub excluded: Vec<RedirectPair>,
}

impl Compaction {
    /// Whether any cycle was found.
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }
}

enum Walk {
    Terminal(RedirectTarget),
    Cycle(usize),
    IntoCycle,
}

/// Flatten redirect chains so every source points at a terminal URL.
pub fn compact<I>(pairs: I, mode: CycleMode) -> Result<Compaction, CompactError>
where
    I: IntoIterator<Item = RedirectPair>,
{
    let mut edges: BTreeMap<String, RedirectPair> = BTreeMap::new();
    for pair in pairs {
        edges.insert(pair.key(), pair);
    }

    let mut resolved: HashMap<String, RedirectTarget> = HashMap::with_capacity(edges.len());
    let mut doomed: HashSet<String> = HashSet::new();
    let mut cycles: Vec<Vec<String>> = Vec::new();

    for start in edges.keys() {
        if resolved.contains_key(start) || doomed.contains(start) {
            continue;
        }

        let mut path: Vec<&str> = Vec::new();
        let mut on_path: HashMap<&str, usize> = HashMap::new();
        let mut cursor: &str = start;

        let walk = loop {
            on_path.insert(cursor, path.len());
            path.push(cursor);

            let target = &edges[cursor].to;
            let next = target.key();

            if let Some(terminal) = resolved.get(&next) {
                break Walk::Terminal(terminal.clone());
            }
            if doomed.contains(&next) {
                break Walk::IntoCycle;
            }
            if let Some(&index) = on_path.get(next.as_str()) {
                break Walk::Cycle(index);
            }
            match edges.get_key_value(&next) {
                Some((key, _)) => cursor = key.as_str(),
                None => break Walk::Terminal(target.clone()),
            }
        };

        match walk {
            Walk::Terminal(terminal) => {
                for key in path {
                    resolved.insert(key.to_string(), terminal.clone());
                }
            }
            Walk::Cycle(index) => {
                let sources: Vec<String> = path
                    .iter()
                    .map(|key| edges[*key].from.as_str().to_string())
                    .collect();
                let closing = sources[index].clone();
                if mode == CycleMode::Strict {
                    return Err(CompactError::Cycle {
                        path: sources,
                        closing,
                    });
                }
                tracing::warn!(
                    cycle = %sources.join(", "),
                    closing = %closing,
                    "redirect cycle detected, excluding entries"
                );
                cycles.push(sources[index..].to_vec());
                doomed.extend(path.into_iter().map(str::to_string));
            }
            Walk::IntoCycle => {
                tracing::warn!(
                    from = %edges[start].from,
                    "redirect chain leads into a cycle, excluding entries"
                );
                doomed.extend(path.into_iter().map(str::to_string));
            }
        }
    }

    let mut flattened = Vec::with_capacity(resolved.len());
    let mut excluded = Vec::with_capacity(doomed.len());
    for (key, pair) in edges {
        match resolved.remove(&key) {
            Some(terminal) => flattened.push(RedirectPair::new(pair.from, terminal)),
            None => excluded.push(pair),
        }
    }
    flattened.sort();
    excluded.sort();

    Ok(Compaction {
        pairs: flattened,
        cycles,
        excluded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(from: &str, to: &str) -> RedirectPair {
        RedirectPair::parse(&format!("/en-US/docs/{}", from), &format!("/en-US/docs/{}", to))
            .unwrap()
    }

    fn rows(compaction: &Compaction) -> Vec<(String, String)> {
        compaction
            .pairs
            .iter()
            .map(|p| (p.from.slug().to_string(), p.to.as_str().rsplit('/').next().unwrap().to_string()))
            .collect()
    }

    fn row(from: &str, to: &str) -> (String, String) {
        (from.to_string(), to.to_string())
    }

    #[test]
    fn test_chain_flattening() {
        let result = compact(
            vec![pair("A", "B"), pair("B", "C"), pair("C", "D")],
            CycleMode::Warn,
        )
        .unwrap();

        assert_eq!(rows(&result), vec![row("A", "D"), row("B", "D"), row("C", "D")]);
        assert!(!result.has_cycles());
    }

    #[test]
    fn test_two_node_cycle_dropped() {
        let result = compact(vec![pair("A", "B"), pair("B", "A")], CycleMode::Warn).unwrap();
        assert!(result.pairs.is_empty());
        assert_eq!(result.cycles.len(), 1);
        assert_eq!(result.excluded.len(), 2);
    }

    #[test]
    fn test_cycle_strict_fails() {
        let err = compact(vec![pair("A", "B"), pair("B", "A")], CycleMode::Strict).unwrap_err();
        let CompactError::Cycle { path, closing } = err;
        assert_eq!(path, vec!["/en-US/docs/A", "/en-US/docs/B"]);
        assert_eq!(closing, "/en-US/docs/A");
    }

    #[test]
    fn test_self_loop() {
        let result = compact(vec![pair("A", "A"), pair("B", "C")], CycleMode::Warn).unwrap();
        assert_eq!(rows(&result), vec![row("B", "C")]);
        assert_eq!(result.cycles, vec![vec!["/en-US/docs/A".to_string()]]);
    }

    #[test]
    fn test_lead_in_to_cycle_excluded_regardless_of_order() {
        let forward = compact(
            vec![pair("X", "A"), pair("A", "B"), pair("B", "A"), pair("Y", "Z")],
            CycleMode::Warn,
        )
        .unwrap();
        let backward = compact(
            vec![pair("Y", "Z"), pair("B", "A"), pair("A", "B"), pair("X", "A")],
            CycleMode::Warn,
        )
        .unwrap();

        assert_eq!(rows(&forward), vec![row("Y", "Z")]);
        assert_eq!(forward.pairs, backward.pairs);
        assert_eq!(forward.excluded.len(), 3);
    }

    #[test]
    fn test_chain_matching_ignores_case() {
        let a = RedirectPair::parse("/en-US/docs/A", "/en-us/docs/b").unwrap();
        let b = RedirectPair::parse("/en-US/docs/B", "/en-US/docs/C").unwrap();
        let result = compact(vec![a, b], CycleMode::Warn).unwrap();

        assert_eq!(result.pairs.len(), 2);
        assert!(result.pairs.iter().all(|p| p.to.as_str() == "/en-US/docs/C"));
    }

    #[test]
    fn test_external_terminal() {
        let a = pair("A", "B");
        let b = RedirectPair::parse("/en-US/docs/B", "https://example.com/B").unwrap();
        let result = compact(vec![a, b], CycleMode::Warn).unwrap();

        assert!(result
            .pairs
            .iter()
            .all(|p| p.to.as_str() == "https://example.com/B"));
    }

    #[test]
    fn test_duplicate_source_last_wins() {
        let result = compact(vec![pair("A", "B"), pair("A", "C")], CycleMode::Warn).unwrap();
        assert_eq!(rows(&result), vec![row("A", "C")]);
    }

    #[test]
    fn test_idempotent() {
        let once = compact(
            vec![pair("A", "B"), pair("B", "C"), pair("D", "B"), pair("E", "E")],
            CycleMode::Warn,
        )
        .unwrap();
        let twice = compact(once.pairs.clone(), CycleMode::Strict).unwrap();
        assert_eq!(once.pairs, twice.pairs);
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let pairs: Vec<_> = (0..20_000)
            .map(|i| pair(&format!("N{}", i), &format!("N{}", i + 1)))
            .collect();
        let result = compact(pairs, CycleMode::Strict).unwrap();
        assert_eq!(result.pairs.len(), 20_000);
        assert!(result
            .pairs
            .iter()
            .all(|p| p.to.as_str() == "/en-US/docs/N20000"));
    }
}
