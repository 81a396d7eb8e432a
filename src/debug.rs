//! Debug utilities for trie troubleshooting.

use std::fmt::Write;

use crate::alloc::SegmentAlloc;
use crate::node::{interior_terminator, Ptr};
use crate::RadixTrie;

impl<A: SegmentAlloc> RadixTrie<A> {
    /// Render the node structure, one node per line, children indented under
    /// their parent.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        if self.root.is_null() {
            out.push_str("(empty)\n");
            return out;
        }

        let mut stack = vec![(self.root, 0usize)];
        while let Some((ptr, depth)) = stack.pop() {
            let node = &self.nodes[ptr];
            let shown = if node.is_terminal() {
                &node.segment[..node.len() - 1]
            } else {
                &node.segment[..]
            };
            let _ = writeln!(
                out,
                "{:indent$}\"{}\"{}",
                "",
                shown.escape_ascii(),
                if node.is_terminal() { " $" } else { "" },
                indent = depth * 2
            );
            if !node.sibling.is_null() {
                stack.push((node.sibling, depth));
            }
            if !node.child.is_null() {
                stack.push((node.child, depth + 1));
            }
        }
        out
    }

    /// Number of nodes with exactly one child, i.e. merges that a failed
    /// fusion left undone.
    pub fn fragmentation(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self.root];
        while let Some(mut ptr) = stack.pop() {
            while !ptr.is_null() {
                let node = &self.nodes[ptr];
                if !node.child.is_null() {
                    if self.nodes[node.child].sibling.is_null() {
                        count += 1;
                    }
                    stack.push(node.child);
                }
                ptr = node.sibling;
            }
        }
        count
    }

    /// Verify tree integrity - returns list of issues found.
    pub fn verify_integrity(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let mut reached = 0usize;
        let mut members = 0usize;

        let mut stack: Vec<(Ptr, Vec<u8>)> = vec![(self.root, Vec::new())];
        while let Some((head, path)) = stack.pop() {
            let mut prev: Option<u8> = None;
            let mut ptr = head;
            while !ptr.is_null() {
                reached += 1;
                if reached > self.nodes.live() {
                    issues.push("more reachable nodes than live slots (cycle?)".to_string());
                    return issues;
                }

                let node = &self.nodes[ptr];
                if node.segment.is_empty() {
                    issues.push(format!("empty segment below {:?}", path.escape_ascii().to_string()));
                    ptr = node.sibling;
                    continue;
                }

                let lead = node.lead();
                if let Some(prev) = prev {
                    if lead <= prev {
                        issues.push(format!(
                            "chain below {:?} not strictly ascending: {prev:#04x} then {lead:#04x}",
                            path.escape_ascii().to_string()
                        ));
                    }
                }
                prev = Some(lead);

                let mut full = path.clone();
                full.extend_from_slice(&node.segment);
                let body = &node.segment[..node.len() - 1];
                if let Some(pos) = interior_terminator(body) {
                    issues.push(format!(
                        "terminator inside segment of {:?} at {pos}",
                        full.escape_ascii().to_string()
                    ));
                }

                if node.is_terminal() {
                    members += 1;
                    if !node.child.is_null() {
                        issues.push(format!(
                            "terminal node {:?} has children",
                            full.escape_ascii().to_string()
                        ));
                    }
                } else if node.child.is_null() {
                    issues.push(format!(
                        "internal node {:?} has no children",
                        full.escape_ascii().to_string()
                    ));
                } else {
                    stack.push((node.child, full));
                }
                ptr = node.sibling;
            }
        }

        if members != self.len {
            issues.push(format!("{members} terminal nodes but len() is {}", self.len));
        }
        if reached != self.nodes.live() {
            issues.push(format!(
                "{reached} reachable nodes but {} live slots",
                self.nodes.live()
            ));
        }
        let free = self.nodes.count_free_list();
        if free != self.nodes.free_len() {
            issues.push(format!(
                "free list holds {free} slots but {} are counted",
                self.nodes.free_len()
            ));
        }
        issues
    }
}
