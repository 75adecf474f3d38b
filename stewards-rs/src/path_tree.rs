use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug)]
struct NodeId(usize);

#[derive(Default)]
struct Node {
    children: BTreeMap<String, NodeId>,
}

/// A tree of `/`-separated paths, one node per path segment. Used to find
/// every directory that contains at least one of the inserted paths.
pub struct PathTree {
    nodes: Vec<Node>,
}

impl PathTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    fn root_id() -> NodeId {
        NodeId(0)
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn insert(&mut self, path: &str) {
        let mut current_node = Self::root_id();
        for segment in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
            let child = self.nodes[current_node.0].children.get(segment);
            if let Some(&node_id) = child {
                current_node = node_id;
            } else {
                let node_id = NodeId(self.nodes.len());
                self.nodes.push(Node::default());
                self.nodes[current_node.0]
                    .children
                    .insert(segment.to_owned(), node_id);
                current_node = node_id;
            }
        }
    }

    /// All directories containing an inserted path, in depth-first order
    /// starting with the root (the empty string). Every ancestor of every
    /// inserted path appears exactly once.
    pub fn directories(&self) -> Vec<String> {
        let mut directories = Vec::new();
        let mut stack = vec![(Self::root_id(), String::new())];
        while let Some((node_id, dir)) = stack.pop() {
            let node = self.node(node_id);
            if node.children.is_empty() {
                continue;
            }

            // Push in reverse so children come off the stack in sorted order
            for (segment, &child_id) in node.children.iter().rev() {
                let child_dir = if dir.is_empty() {
                    segment.clone()
                } else {
                    format!("{}/{}", dir, segment)
                };
                stack.push((child_id, child_dir));
            }
            directories.push(dir);
        }
        directories
    }
}

impl Default for PathTree {
    fn default() -> Self {
        Self::new()
    }
}
