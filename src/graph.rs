use std::collections::{HashMap, HashSet, VecDeque};

use anyhow::{Result, bail};

/// Topologically order `ids` along `edges` (`from -> to`).
///
/// Ties keep the order in which `ids` were given, so the result is stable
/// for a stable input.
pub fn topo_sort<'a>(
    ids: impl IntoIterator<Item = &'a str>,
    edges: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<Vec<String>> {
    let ids: Vec<&str> = ids.into_iter().collect();
    let mut indeg: HashMap<&str, usize> = ids.iter().map(|id| (*id, 0usize)).collect();

    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    for (from, to) in edges {
        if !indeg.contains_key(from) || !indeg.contains_key(to) {
            bail!("connection references missing node: {from} -> {to}");
        }
        if let Some(d) = indeg.get_mut(to) {
            *d += 1;
        }
        outgoing.entry(from).or_default().push(to);
    }

    let mut q: VecDeque<&str> = ids
        .iter()
        .copied()
        .filter(|id| indeg.get(id) == Some(&0))
        .collect();
    let mut order: Vec<String> = Vec::with_capacity(ids.len());

    while let Some(n) = q.pop_front() {
        order.push(n.to_string());
        if let Some(nexts) = outgoing.get(n) {
            for m in nexts {
                if let Some(entry) = indeg.get_mut(m) {
                    *entry -= 1;
                    if *entry == 0 {
                        q.push_back(m);
                    }
                }
            }
        }
    }

    if order.len() != indeg.len() {
        bail!("cycle detected in graph (cannot topologically sort)");
    }
    Ok(order)
}

/// Every node that can reach `start` along `edges`, `start` included.
pub fn upstream_reachable<'a>(
    start: &'a str,
    edges: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> HashSet<String> {
    let mut incoming: HashMap<&str, Vec<&str>> = HashMap::new();
    for (from, to) in edges {
        incoming.entry(to).or_default().push(from);
    }

    let mut visited: HashSet<String> = HashSet::new();
    let mut stack: Vec<&str> = vec![start];
    while let Some(n) = stack.pop() {
        if !visited.insert(n.to_string()) {
            continue;
        }
        if let Some(prevs) = incoming.get(n) {
            for p in prevs {
                stack.push(p);
            }
        }
    }
    visited
}
