//! An in-memory, synchronous filesystem used as the single source of truth
//! for source files across the module runtime, the dev servers, and the
//! host page. All paths are POSIX-style absolute paths rooted at `/`.

mod clock;
mod error;
mod node;
pub mod path;
mod watch;

use std::cell::RefCell;
use std::rc::Rc;

pub use clock::{Clock, FixedClock, LogicalClock};
pub use error::{VfsError, VfsResult};
pub use node::{Directory, FileNode};
pub use watch::{WatchCallback, WatchEvent, WatchEventKind, WatchHandle};

use watch::WatchRegistry;

/// Metadata returned by [`Vfs::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub is_file: bool,
    pub is_directory: bool,
    pub size: u64,
    pub mtime: u64,
}

/// Options accepted by [`Vfs::mkdir`] and [`Vfs::rmdir`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DirOptions {
    pub recursive: bool,
}

/// The in-memory, single-root filesystem.
///
/// Cheap to clone: internally it's a pair of `Rc<RefCell<_>>` handles, so
/// every clone observes the same tree and the same watchers.
#[derive(Clone)]
pub struct Vfs {
    root: Rc<RefCell<FileNode>>,
    watchers: Rc<RefCell<WatchRegistry>>,
    clock: Rc<dyn Clock>,
}

impl Vfs {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            root: Rc::new(RefCell::new(FileNode::new_root())),
            watchers: Rc::new(RefCell::new(WatchRegistry::new())),
            clock,
        }
    }

    /// Reads raw bytes at `path`.
    pub fn read(&self, path: &str) -> VfsResult<Vec<u8>> {
        let path = path::normalize(path);
        let root = self.root.borrow();
        match navigate(&root, &path)? {
            FileNode::File { bytes, .. } => Ok(bytes.clone()),
            FileNode::Directory(_) => Err(VfsError::IsDirectory(path)),
        }
    }

    /// Reads `path` decoded as UTF-8.
    pub fn read_to_string(&self, path: &str) -> VfsResult<String> {
        let path = path::normalize(path);
        let bytes = self.read(&path)?;
        String::from_utf8(bytes).map_err(|_| VfsError::InvalidEncoding(path))
    }

    /// Writes `data` at `path`, creating any missing parent directories
    /// (the virtual filesystem has no concept of a pre-provisioned mount,
    /// so unlike a real `fs.writeFile` this never fails on a missing
    /// ancestor directory -- only on an ancestor that is already a file).
    pub fn write(&self, path: &str, data: impl Into<Vec<u8>>) -> VfsResult<()> {
        let path = path::normalize(path);
        if path == "/" {
            return Err(VfsError::IsDirectory(path));
        }
        let mtime = self.clock.now_ms();
        {
            let mut root = self.root.borrow_mut();
            let (parent, name) = split_parent(&path);
            let dir = navigate_mut_as_dir(&mut root, &parent, true)?;
            if let Some(existing) = dir.get(name) {
                if existing.is_directory() {
                    return Err(VfsError::IsDirectory(path));
                }
            }
            dir.insert(
                name.to_string(),
                FileNode::File {
                    bytes: data.into(),
                    mtime,
                },
            );
        }
        self.watchers
            .borrow()
            .emit(&path, WatchEventKind::Change);
        Ok(())
    }

    pub fn mkdir(&self, path: &str, options: DirOptions) -> VfsResult<()> {
        let path = path::normalize(path);
        if path == "/" {
            return Ok(());
        }
        {
            let mut root = self.root.borrow_mut();
            let (parent, name) = split_parent(&path);
            let dir = navigate_mut_as_dir(&mut root, &parent, options.recursive)?;
            match dir.get(name) {
                Some(node) if node.is_directory() => return Ok(()),
                Some(_) => return Err(VfsError::NotDirectory(path)),
                None => dir.insert(name.to_string(), FileNode::new_root()),
            }
        }
        self.watchers.borrow().emit(&path, WatchEventKind::Change);
        Ok(())
    }

    pub fn readdir(&self, path: &str) -> VfsResult<Vec<String>> {
        let path = path::normalize(path);
        let root = self.root.borrow();
        match navigate(&root, &path)? {
            FileNode::Directory(dir) => Ok(dir.names().map(str::to_string).collect()),
            FileNode::File { .. } => Err(VfsError::NotDirectory(path)),
        }
    }

    pub fn stat(&self, path: &str) -> VfsResult<Stat> {
        let path = path::normalize(path);
        let root = self.root.borrow();
        let node = navigate(&root, &path)?;
        Ok(match node {
            FileNode::File { bytes, mtime } => Stat {
                is_file: true,
                is_directory: false,
                size: bytes.len() as u64,
                mtime: *mtime,
            },
            FileNode::Directory(_) => Stat {
                is_file: false,
                is_directory: true,
                size: 0,
                mtime: 0,
            },
        })
    }

    pub fn exists(&self, path: &str) -> bool {
        let path = path::normalize(path);
        navigate(&self.root.borrow(), &path).is_ok()
    }

    pub fn unlink(&self, path: &str) -> VfsResult<()> {
        let path = path::normalize(path);
        {
            let mut root = self.root.borrow_mut();
            let (parent, name) = split_parent(&path);
            let dir = navigate_mut_as_dir(&mut root, &parent, false)?;
            match dir.get(name) {
                None => return Err(VfsError::NotFound(path)),
                Some(node) if node.is_directory() => return Err(VfsError::IsDirectory(path)),
                Some(_) => {
                    dir.remove(name);
                }
            }
        }
        self.watchers.borrow().emit(&path, WatchEventKind::Delete);
        Ok(())
    }

    pub fn rmdir(&self, path: &str, options: DirOptions) -> VfsResult<()> {
        let path = path::normalize(path);
        {
            let mut root = self.root.borrow_mut();
            let (parent, name) = split_parent(&path);
            let dir = navigate_mut_as_dir(&mut root, &parent, false)?;
            match dir.get(name) {
                None => return Err(VfsError::NotFound(path)),
                Some(node) if !node.is_directory() => {
                    return Err(VfsError::NotDirectory(path));
                }
                Some(node) => {
                    let child_dir = node.as_directory().expect("checked is_directory");
                    if !child_dir.is_empty() && !options.recursive {
                        return Err(VfsError::NotEmpty(path));
                    }
                    dir.remove(name);
                }
            }
        }
        self.watchers.borrow().emit(&path, WatchEventKind::Delete);
        Ok(())
    }

    pub fn rename(&self, from: &str, to: &str) -> VfsResult<()> {
        let from = path::normalize(from);
        let to = path::normalize(to);
        {
            let mut root = self.root.borrow_mut();
            let (from_parent, from_name) = split_parent(&from);
            let node = {
                let dir = navigate_mut_as_dir(&mut root, &from_parent, false)?;
                dir.remove(from_name).ok_or_else(|| VfsError::NotFound(from.clone()))?
            };
            let (to_parent, to_name) = split_parent(&to);
            let dir = navigate_mut_as_dir(&mut root, &to_parent, true)?;
            dir.insert(to_name.to_string(), node);
        }
        self.watchers.borrow().emit(&from, WatchEventKind::Delete);
        self.watchers.borrow().emit(&to, WatchEventKind::Change);
        Ok(())
    }

    /// Subscribes a callback to mutations under `path`. When `recursive` is
    /// set, descendants at any depth are observed.
    pub fn watch(&self, path: &str, recursive: bool, callback: WatchCallback) -> WatchHandle {
        WatchRegistry::subscribe(&self.watchers, path, recursive, callback)
    }
}

fn split_parent(path: &str) -> (String, &str) {
    let parent = path::dirname(path);
    let name = path::basename(path);
    (parent, name)
}

fn navigate<'a>(root: &'a FileNode, path: &str) -> VfsResult<&'a FileNode> {
    let mut node = root;
    for segment in path::segments(path) {
        let dir = node
            .as_directory()
            .ok_or_else(|| VfsError::NotDirectory(path.to_string()))?;
        node = dir
            .get(segment)
            .ok_or_else(|| VfsError::NotFound(path.to_string()))?;
    }
    Ok(node)
}

/// Navigates to the directory at `path`, optionally creating missing
/// intermediate directories. Errors if any existing ancestor is a file.
fn navigate_mut_as_dir<'a>(
    root: &'a mut FileNode,
    path: &str,
    create_missing: bool,
) -> VfsResult<&'a mut Directory> {
    let mut node = root;
    for segment in path::segments(path) {
        let dir = node
            .as_directory_mut()
            .ok_or_else(|| VfsError::NotDirectory(path.to_string()))?;
        if !dir.contains(segment) {
            if create_missing {
                dir.insert(segment.to_string(), FileNode::new_root());
            } else {
                return Err(VfsError::NotFound(path.to_string()));
            }
        }
        node = dir.get_mut(segment).expect("just inserted or present");
        if !node.is_directory() {
            return Err(VfsError::NotDirectory(path.to_string()));
        }
    }
    node.as_directory_mut()
        .ok_or_else(|| VfsError::NotDirectory(path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vfs() -> Vfs {
        Vfs::new(Rc::new(LogicalClock::new()))
    }

    #[test]
    fn write_then_read_round_trips() {
        let fs = vfs();
        fs.write("/pages/index.jsx", "export default () => null;").unwrap();
        assert_eq!(
            fs.read_to_string("/pages/index.jsx").unwrap(),
            "export default () => null;"
        );
    }

    #[test]
    fn write_auto_creates_parents_but_respects_existing_files() {
        let fs = vfs();
        fs.write("/a/b/c.js", "1").unwrap();
        assert!(fs.stat("/a").unwrap().is_directory);
        assert!(fs.stat("/a/b").unwrap().is_directory);

        fs.write("/x.js", "1").unwrap();
        let err = fs.write("/x.js/y.js", "2").unwrap_err();
        assert_eq!(err, VfsError::NotDirectory("/x.js/y.js".to_string()));
    }

    #[test]
    fn reading_missing_path_fails_not_found() {
        let fs = vfs();
        assert_eq!(
            fs.read("/nope.js").unwrap_err(),
            VfsError::NotFound("/nope.js".to_string())
        );
    }

    #[test]
    fn rmdir_without_recursive_fails_on_non_empty() {
        let fs = vfs();
        fs.write("/a/b.js", "1").unwrap();
        assert_eq!(
            fs.rmdir("/a", DirOptions::default()).unwrap_err(),
            VfsError::NotEmpty("/a".to_string())
        );
        fs.rmdir("/a", DirOptions { recursive: true }).unwrap();
        assert!(!fs.exists("/a"));
    }

    #[test]
    fn watchers_fire_after_mutation_settles() {
        let fs = vfs();
        let observed = Rc::new(RefCell::new(Vec::new()));
        let observed2 = observed.clone();
        let fs2 = fs.clone();
        let _handle = fs.watch(
            "/pages",
            true,
            Rc::new(move |ev| {
                // The write must already be visible when the callback runs.
                observed2
                    .borrow_mut()
                    .push((ev.path.clone(), fs2.exists(&ev.path)));
            }),
        );
        fs.write("/pages/index.jsx", "x").unwrap();
        assert_eq!(
            observed.borrow().as_slice(),
            [("/pages/index.jsx".to_string(), true)]
        );
    }

    #[test]
    fn rename_moves_node_and_notifies_both_paths() {
        let fs = vfs();
        fs.write("/a.js", "1").unwrap();
        fs.rename("/a.js", "/b/a.js").unwrap();
        assert!(!fs.exists("/a.js"));
        assert_eq!(fs.read_to_string("/b/a.js").unwrap(), "1");
    }
}
