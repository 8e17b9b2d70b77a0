//! Mutable Merkle-Patricia Trie

use crate::nibbles::{bytes_to_nibbles, common_prefix_len};
use crate::node::Node;
use strata_primitives::H256;
use tracing::trace;

/// In-memory Merkle-Patricia Trie.
///
/// The tree is kept in canonical shape after every mutation, so [`Trie::root`]
/// depends only on the current key/value mapping and never on the order the
/// mapping was built in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trie {
    root: Node,
}

impl Trie {
    /// Create an empty trie
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the trie holds no entries
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Root node
    pub fn root_node(&self) -> &Node {
        &self.root
    }

    /// Look up `key`
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let path = bytes_to_nibbles(key);
        get_at(&self.root, &path)
    }

    /// Insert or replace `key`. An empty value deletes the key.
    pub fn put(&mut self, key: &[u8], value: Vec<u8>) {
        if value.is_empty() {
            self.delete(key);
            return;
        }
        let path = bytes_to_nibbles(key);
        let root = std::mem::take(&mut self.root);
        self.root = insert_at(root, &path, value);
    }

    /// Remove `key` if present
    pub fn delete(&mut self, key: &[u8]) {
        let path = bytes_to_nibbles(key);
        let root = std::mem::take(&mut self.root);
        self.root = delete_at(root, &path);
    }

    /// Root commitment
    pub fn root(&self) -> H256 {
        self.root.root_hash()
    }
}

impl<K: AsRef<[u8]>> FromIterator<(K, Vec<u8>)> for Trie {
    fn from_iter<I: IntoIterator<Item = (K, Vec<u8>)>>(iter: I) -> Self {
        let mut trie = Trie::new();
        for (key, value) in iter {
            trie.put(key.as_ref(), value);
        }
        trie
    }
}

fn get_at<'a>(node: &'a Node, path: &[u8]) -> Option<&'a [u8]> {
    match node {
        Node::Empty => None,
        Node::Leaf { path: leaf_path, value } => {
            (leaf_path.as_slice() == path).then_some(value.as_slice())
        }
        Node::Extension { path: ext_path, child } => path
            .strip_prefix(ext_path.as_slice())
            .and_then(|rest| get_at(child, rest)),
        Node::Branch { children, value } => match path.split_first() {
            None => value.as_deref(),
            Some((nibble, rest)) => get_at(&children[*nibble as usize], rest),
        },
    }
}

/// Put `value` into a branch at the position described by `path`.
fn place_in_branch(children: &mut [Node; 16], branch_value: &mut Option<Vec<u8>>, path: &[u8], value: Vec<u8>) {
    match path.split_first() {
        None => *branch_value = Some(value),
        Some((nibble, rest)) => {
            children[*nibble as usize] = Node::Leaf {
                path: rest.to_vec(),
                value,
            }
        }
    }
}

/// Wrap `node` under a shared `prefix`, omitting the extension when empty.
fn with_prefix(prefix: &[u8], node: Node) -> Node {
    if prefix.is_empty() {
        node
    } else {
        Node::Extension {
            path: prefix.to_vec(),
            child: Box::new(node),
        }
    }
}

fn insert_at(node: Node, path: &[u8], value: Vec<u8>) -> Node {
    match node {
        Node::Empty => Node::Leaf {
            path: path.to_vec(),
            value,
        },
        Node::Leaf {
            path: leaf_path,
            value: leaf_value,
        } => {
            if leaf_path == path {
                return Node::Leaf {
                    path: leaf_path,
                    value,
                };
            }
            let common = common_prefix_len(&leaf_path, path);
            let mut children: [Node; 16] = Default::default();
            let mut branch_value = None;
            place_in_branch(&mut children, &mut branch_value, &leaf_path[common..], leaf_value);
            place_in_branch(&mut children, &mut branch_value, &path[common..], value);
            let branch = Node::Branch {
                children: Box::new(children),
                value: branch_value,
            };
            with_prefix(&path[..common], branch)
        }
        Node::Extension {
            path: ext_path,
            child,
        } => {
            let common = common_prefix_len(&ext_path, path);
            if common == ext_path.len() {
                let child = insert_at(*child, &path[common..], value);
                return Node::Extension {
                    path: ext_path,
                    child: Box::new(child),
                };
            }

            // Split the extension at the first diverging nibble
            let mut children: [Node; 16] = Default::default();
            let mut branch_value = None;
            let ext_nibble = ext_path[common] as usize;
            children[ext_nibble] = with_prefix(&ext_path[common + 1..], *child);
            place_in_branch(&mut children, &mut branch_value, &path[common..], value);
            let branch = Node::Branch {
                children: Box::new(children),
                value: branch_value,
            };
            with_prefix(&path[..common], branch)
        }
        Node::Branch {
            mut children,
            value: branch_value,
        } => match path.split_first() {
            None => Node::Branch {
                children,
                value: Some(value),
            },
            Some((nibble, rest)) => {
                let slot = std::mem::take(&mut children[*nibble as usize]);
                children[*nibble as usize] = insert_at(slot, rest, value);
                Node::Branch {
                    children,
                    value: branch_value,
                }
            }
        },
    }
}

fn delete_at(node: Node, path: &[u8]) -> Node {
    match node {
        Node::Empty => Node::Empty,
        Node::Leaf {
            path: leaf_path,
            value,
        } => {
            if leaf_path == path {
                trace!("Deleted leaf");
                Node::Empty
            } else {
                Node::Leaf {
                    path: leaf_path,
                    value,
                }
            }
        }
        Node::Extension {
            path: ext_path,
            child,
        } => match path.strip_prefix(ext_path.as_slice()) {
            None => Node::Extension {
                path: ext_path,
                child,
            },
            Some(rest) => {
                let child = delete_at(*child, rest);
                merge_prefix(ext_path, child)
            }
        },
        Node::Branch {
            mut children,
            value,
        } => {
            let value = match path.split_first() {
                None => None,
                Some((nibble, rest)) => {
                    let slot = std::mem::take(&mut children[*nibble as usize]);
                    children[*nibble as usize] = delete_at(slot, rest);
                    value
                }
            };
            collapse_branch(children, value)
        }
    }
}

/// Re-attach `prefix` above a child that may have changed shape.
fn merge_prefix(mut prefix: Vec<u8>, child: Node) -> Node {
    match child {
        Node::Empty => Node::Empty,
        Node::Leaf { path, value } => {
            prefix.extend_from_slice(&path);
            Node::Leaf {
                path: prefix,
                value,
            }
        }
        Node::Extension { path, child } => {
            prefix.extend_from_slice(&path);
            Node::Extension {
                path: prefix,
                child,
            }
        }
        branch @ Node::Branch { .. } => Node::Extension {
            path: prefix,
            child: Box::new(branch),
        },
    }
}

/// Collapse a branch left with fewer than two entries.
fn collapse_branch(mut children: Box<[Node; 16]>, value: Option<Vec<u8>>) -> Node {
    let mut occupied = children
        .iter()
        .enumerate()
        .filter(|(_, child)| !child.is_empty())
        .map(|(i, _)| i);
    let first = occupied.next();
    let more = occupied.next().is_some();

    match (first, more, value) {
        (_, true, value) => Node::Branch { children, value },
        (Some(_), false, Some(value)) => Node::Branch {
            children,
            value: Some(value),
        },
        (None, _, Some(value)) => {
            trace!("Collapsed branch into leaf");
            Node::Leaf {
                path: Vec::new(),
                value,
            }
        }
        (None, _, None) => Node::Empty,
        (Some(index), false, None) => {
            trace!("Collapsed branch with single child {:x}", index);
            let child = std::mem::take(&mut children[index]);
            merge_prefix(vec![index as u8], child)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn trie_of(entries: &[(&str, &str)]) -> Trie {
        entries
            .iter()
            .map(|(k, v)| (k.as_bytes(), v.as_bytes().to_vec()))
            .collect()
    }

    // ==================== Reference roots ====================

    #[test]
    fn test_empty_root() {
        assert_eq!(
            Trie::new().root().to_hex(),
            "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
        );
    }

    #[test]
    fn test_dogs_root() {
        let trie = trie_of(&[
            ("doe", "reindeer"),
            ("dog", "puppy"),
            ("dogglesworth", "cat"),
        ]);
        assert_eq!(
            trie.root().to_hex(),
            "0x8aad789dff2f538bca5d8ea56e8abe10f4c7ba3a5dea95fea4cd6e7c3a1168d3"
        );
    }

    #[test]
    fn test_foo_food_root() {
        let trie = trie_of(&[("foo", "bar"), ("food", "bass")]);
        assert_eq!(
            trie.root().to_hex(),
            "0x17beaa1648bafa633cda809c90c04af50fc8aed3cb40d16efbddee6fdf63c4c3"
        );
    }

    #[test]
    fn test_empty_values_delete_and_collapse() {
        let mut trie = Trie::new();
        let ops: [(&str, Option<&str>); 8] = [
            ("do", Some("verb")),
            ("ether", Some("wookiedoo")),
            ("horse", Some("stallion")),
            ("shaman", Some("horse")),
            ("doge", Some("coin")),
            ("ether", None),
            ("dog", Some("puppy")),
            ("shaman", None),
        ];
        for (key, value) in ops {
            match value {
                Some(v) => trie.put(key.as_bytes(), v.as_bytes().to_vec()),
                None => trie.delete(key.as_bytes()),
            }
        }
        assert_eq!(
            trie.root().to_hex(),
            "0x5991bb8c6514148a29db676a14ac506cd2cd5775ace63c30a4fe457715e9ac84"
        );
    }

    // ==================== Read-your-writes ====================

    #[test]
    fn test_get_observes_pending_mutations() {
        let mut trie = trie_of(&[("do", "verb"), ("dog", "puppy")]);
        assert_eq!(trie.get(b"dog"), Some(&b"puppy"[..]));
        assert_eq!(trie.get(b"d"), None);

        trie.put(b"dog", b"hound".to_vec());
        assert_eq!(trie.get(b"dog"), Some(&b"hound"[..]));

        trie.delete(b"do");
        assert_eq!(trie.get(b"do"), None);
        assert_eq!(trie.get(b"dog"), Some(&b"hound"[..]));
    }

    #[test]
    fn test_empty_value_is_delete() {
        let mut trie = trie_of(&[("a", "1")]);
        trie.put(b"a", Vec::new());
        assert!(trie.is_empty());
    }

    // ==================== Collapse ====================

    #[test]
    fn test_delete_last_sibling_collapses_to_leaf() {
        let mut trie = trie_of(&[("abc", "1"), ("abd", "2")]);
        trie.delete(b"abd");
        assert_eq!(trie, trie_of(&[("abc", "1")]));
        assert!(matches!(trie.root_node(), Node::Leaf { .. }));
    }

    #[test]
    fn test_delete_branch_value_collapses_into_extension() {
        let mut trie = trie_of(&[("ab", "1"), ("abcd", "2"), ("abce", "3")]);
        trie.delete(b"ab");
        assert_eq!(trie, trie_of(&[("abcd", "2"), ("abce", "3")]));
        assert!(matches!(trie.root_node(), Node::Extension { .. }));
    }

    #[test]
    fn test_delete_everything() {
        let mut trie = trie_of(&[("x", "1"), ("xy", "2"), ("z", "3")]);
        for key in ["xy", "z", "x"] {
            trie.delete(key.as_bytes());
        }
        assert!(trie.is_empty());
        assert_eq!(trie.root(), Trie::new().root());
    }

    #[test]
    fn test_delete_missing_key_is_noop() {
        let mut trie = trie_of(&[("abc", "1"), ("abd", "2")]);
        let before = trie.clone();
        trie.delete(b"abe");
        trie.delete(b"zz");
        assert_eq!(trie, before);
    }

    // ==================== Order independence ====================

    proptest! {
        #[test]
        fn prop_root_independent_of_history(
            entries in proptest::collection::vec(
                (proptest::collection::vec(0u8..4, 1..5), proptest::collection::vec(1u8..=255, 1..40)),
                1..40,
            ),
            removals in proptest::collection::vec(any::<prop::sample::Index>(), 0..10),
        ) {
            let mut forward = Trie::new();
            let mut expected = BTreeMap::new();
            for (k, v) in &entries {
                forward.put(k, v.clone());
                expected.insert(k.clone(), v.clone());
            }
            for idx in &removals {
                let (k, _) = idx.get(&entries);
                forward.delete(k);
                expected.remove(k);
            }

            let rebuilt: Trie = expected.iter().rev().map(|(k, v)| (k.clone(), v.clone())).collect();
            prop_assert_eq!(forward.root(), rebuilt.root());
            prop_assert_eq!(&forward, &rebuilt);
            for (k, v) in &expected {
                prop_assert_eq!(forward.get(k), Some(v.as_slice()));
            }
        }
    }
}
