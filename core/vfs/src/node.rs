use rustc_hash::FxHashMap;

/// A node in the virtual filesystem tree.
///
/// Directory children are kept in an [`indexmap`]-free [`FxHashMap`] plus an
/// insertion-ordered key list so `readdir` returns entries in creation order,
/// which is what most bundlers and `fs.readdir` callers expect in practice.
#[derive(Debug, Clone)]
pub enum FileNode {
    File { bytes: Vec<u8>, mtime: u64 },
    Directory(Directory),
}

#[derive(Debug, Clone, Default)]
pub struct Directory {
    order: Vec<String>,
    children: FxHashMap<String, FileNode>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FileNode> {
        self.children.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FileNode> {
        self.children.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    pub fn insert(&mut self, name: String, node: FileNode) {
        if !self.children.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.children.insert(name, node);
    }

    pub fn remove(&mut self, name: &str) -> Option<FileNode> {
        self.order.retain(|n| n != name);
        self.children.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Entry names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl FileNode {
    pub fn new_root() -> Self {
        FileNode::Directory(Directory::new())
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, FileNode::Directory(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, FileNode::File { .. })
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match self {
            FileNode::Directory(d) => Some(d),
            FileNode::File { .. } => None,
        }
    }

    pub fn as_directory_mut(&mut self) -> Option<&mut Directory> {
        match self {
            FileNode::Directory(d) => Some(d),
            FileNode::File { .. } => None,
        }
    }

    pub fn as_file(&self) -> Option<(&[u8], u64)> {
        match self {
            FileNode::File { bytes, mtime } => Some((bytes, *mtime)),
            FileNode::Directory(_) => None,
        }
    }
}
