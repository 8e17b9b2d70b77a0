//! Trie nodes and their canonical encoding

use crate::nibbles::hex_prefix_encode;
use strata_crypto::keccak256;
use strata_primitives::H256;
use strata_rlp::RlpStream;

/// A node of the Merkle-Patricia Trie. Paths are nibble sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Node {
    /// No entries
    #[default]
    Empty,
    /// Remaining path and the stored value
    Leaf {
        /// Remaining key nibbles
        path: Vec<u8>,
        /// Stored value (already serialized)
        value: Vec<u8>,
    },
    /// Shared path segment above a branch
    Extension {
        /// Shared nibbles (never empty)
        path: Vec<u8>,
        /// Child node (always a branch)
        child: Box<Node>,
    },
    /// 16-way fan-out plus an optional value terminating here
    Branch {
        /// One child per nibble
        children: Box<[Node; 16]>,
        /// Value whose key ends at this branch
        value: Option<Vec<u8>>,
    },
}

/// Reference to a child inside its parent's encoding
enum NodeRef {
    /// Encoding shorter than 32 bytes, embedded as-is
    Inline(Vec<u8>),
    /// keccak of the encoding
    Hash(H256),
}

impl Node {
    /// An empty branch
    pub fn empty_branch() -> Node {
        Node::Branch {
            children: Box::new(Default::default()),
            value: None,
        }
    }

    /// Whether this is [`Node::Empty`]
    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }

    /// Canonical RLP encoding of this node
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Node::Empty => vec![0x80],
            Node::Leaf { path, value } => {
                let mut stream = RlpStream::new_list(2);
                stream.append(&hex_prefix_encode(path, true));
                stream.append(value);
                stream.out().to_vec()
            }
            Node::Extension { path, child } => {
                let mut stream = RlpStream::new_list(2);
                stream.append(&hex_prefix_encode(path, false));
                append_child(&mut stream, child);
                stream.out().to_vec()
            }
            Node::Branch { children, value } => {
                let mut stream = RlpStream::new_list(17);
                for child in children.iter() {
                    append_child(&mut stream, child);
                }
                match value {
                    Some(v) => stream.append(v),
                    None => stream.append_empty_data(),
                };
                stream.out().to_vec()
            }
        }
    }

    fn reference(&self) -> NodeRef {
        let encoded = self.encode();
        if encoded.len() < 32 {
            NodeRef::Inline(encoded)
        } else {
            NodeRef::Hash(keccak256(&encoded))
        }
    }

    /// Hash of this node as a trie root (always hashed, even when short)
    pub fn root_hash(&self) -> H256 {
        keccak256(&self.encode())
    }
}

fn append_child(stream: &mut RlpStream, child: &Node) {
    if child.is_empty() {
        stream.append_empty_data();
        return;
    }
    match child.reference() {
        NodeRef::Inline(raw) => {
            stream.append_raw(&raw, 1);
        }
        NodeRef::Hash(hash) => {
            stream.append(&hash);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_node_encoding() {
        assert_eq!(Node::Empty.encode(), vec![0x80]);
        assert_eq!(
            Node::Empty.root_hash().to_hex(),
            "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421"
        );
    }

    #[test]
    fn test_short_leaf_is_inlined() {
        let leaf = Node::Leaf {
            path: vec![1, 2],
            value: b"v".to_vec(),
        };
        // [0x20 0x12, 'v'] -> c4 82 20 12 76
        assert_eq!(leaf.encode(), vec![0xc4, 0x82, 0x20, 0x12, 0x76]);

        let mut children: [Node; 16] = Default::default();
        children[3] = leaf.clone();
        let branch = Node::Branch {
            children: Box::new(children),
            value: None,
        };
        let encoded = branch.encode();
        // 3 empty slots, the embedded leaf list, then 13 empty slots + empty value
        assert_eq!(&encoded[1..4], &[0x80, 0x80, 0x80]);
        assert_eq!(&encoded[4..9], &leaf.encode()[..]);
    }

    #[test]
    fn test_long_child_is_hashed() {
        let leaf = Node::Leaf {
            path: vec![1, 2],
            value: vec![0xaa; 40],
        };
        let ext = Node::Extension {
            path: vec![5],
            child: Box::new(leaf.clone()),
        };
        let encoded = ext.encode();
        // list header + 1-byte path + 0xa0 + 32-byte hash
        assert_eq!(encoded.len(), 1 + 1 + 33);
        assert_eq!(&encoded[3..], leaf.root_hash().as_bytes());
    }
}
