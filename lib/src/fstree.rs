use std::fmt;
use std::sync::Arc;
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::error::Result;

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct EntryId(pub(crate) usize);

/// An in-memory snapshot of a directory tree, built once with `jwalk`.
#[derive(Debug)]
pub struct FsTree {
    entries: Vec<Entry>,
    map: FxHashMap<Arc<Path>, EntryId>,
}

#[derive(Debug)]
pub struct Entry {
    pub id: EntryId,
    pub path: Arc<Path>,
    pub file_name: String,
    pub is_dir: bool,
    pub len: u64,
    pub parent: Option<EntryId>,
    pub children: Vec<EntryId>,
    pub depth: usize,
}

#[derive(Default, Debug)]
struct FileLen(Option<u64>);

impl jwalk::ClientState for FileLen {
    type ReadDirState = ();
    type DirEntryState = Self;
}

impl FsTree {
    /// Walks `root` (following links) in sorted order. Errors if `root`
    /// doesn't exist or yields nothing.
    pub fn build<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let walker = jwalk::WalkDirGeneric::<FileLen>::new(root)
            .sort(true)
            .follow_links(true)
            .process_read_dir(|_, _, _, children| {
                children.iter_mut()
                    .filter_map(|e| e.as_mut().ok())
                    .for_each(|e| e.client_state = FileLen(e.metadata().ok().map(|m| m.len())));
            });

        let mut tree = FsTree { entries: vec![], map: FxHashMap::default() };
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            tree.insert(entry);
        }

        if tree.entries.is_empty() {
            return err! {
                "file system tree discovery yielded zero files",
                "search root" => root.display(),
            };
        }

        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn root(&self) -> &Entry {
        &self.entries[0]
    }

    /// Looks up `path` relative to `root`, or to the tree root when `None`.
    pub fn get<R, P>(&self, root: R, path: P) -> Option<&Entry>
        where R: Into<Option<EntryId>>, P: AsRef<Path>
    {
        let base = root.into().map_or_else(|| self.root(), |id| &self[id]);
        let full = base.path.join(path.as_ref());
        self.map.get(&*full).map(|id| &self[*id])
    }

    pub fn get_file<R, P>(&self, root: R, path: P) -> Option<&Entry>
        where R: Into<Option<EntryId>>, P: AsRef<Path>
    {
        self.get(root, path).filter(|e| !e.is_dir)
    }

    pub fn get_dir<R, P>(&self, root: R, path: P) -> Option<&Entry>
        where R: Into<Option<EntryId>>, P: AsRef<Path>
    {
        self.get(root, path).filter(|e| e.is_dir)
    }

    /// Depth-first iterator over the files below `root`. Directories and
    /// files whose name starts with `.` are skipped along with their contents.
    pub fn files(&self, root: EntryId) -> impl Iterator<Item = &Entry> + '_ {
        let mut stack = vec![root];
        std::iter::from_fn(move || {
            while let Some(id) = stack.pop() {
                let entry = &self[id];
                if entry.is_hidden() && id != root {
                    continue;
                }

                if entry.is_dir {
                    stack.extend(entry.children.iter().rev());
                } else {
                    return Some(entry);
                }
            }

            None
        })
    }

    fn insert(&mut self, dent: jwalk::DirEntry<FileLen>) {
        let id = EntryId(self.entries.len());
        let path: Arc<Path> = Arc::from(dent.path().into_boxed_path());
        let parent = match dent.depth {
            0 => None,
            _ => self.map.get(&*dent.parent_path).copied(),
        };

        if let Some(parent) = parent {
            self.entries[parent.0].children.push(id);
        }

        self.map.insert(path.clone(), id);
        self.entries.push(Entry {
            id,
            path,
            parent,
            file_name: dent.file_name.to_string_lossy().into_owned(),
            is_dir: dent.file_type.is_dir(),
            len: dent.client_state.0.unwrap_or(0),
            children: vec![],
            depth: dent.depth,
        });
    }
}

impl Entry {
    /// File name without the last extension.
    pub fn file_stem(&self) -> &str {
        self.file_name.rsplit_once('.').map_or(&*self.file_name, |(stem, _)| stem)
    }

    pub fn file_ext(&self) -> Option<&str> {
        self.file_name.rsplit_once('.').map(|(_, ext)| ext)
    }

    pub fn is_hidden(&self) -> bool {
        self.file_name.starts_with('.')
    }

    /// The path of `self` below `ancestor`, if `ancestor` is one.
    pub fn path_relative_to(&self, ancestor: &Entry) -> Option<&Path> {
        self.path.strip_prefix(&ancestor.path).ok()
    }
}

impl std::ops::Index<EntryId> for FsTree {
    type Output = Entry;

    fn index(&self, index: EntryId) -> &Self::Output {
        &self.entries[index.0]
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::FsTree;

    #[test]
    fn walks_sorted_and_skips_hidden() {
        let dir = std::env::temp_dir().join(format!("guidebook-fstree-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("assets/docs")).unwrap();
        std::fs::create_dir_all(dir.join("assets/.cache")).unwrap();
        std::fs::write(dir.join("assets/b.css"), "b").unwrap();
        std::fs::write(dir.join("assets/docs/a.pdf"), "pdf!").unwrap();
        std::fs::write(dir.join("assets/.cache/x"), "x").unwrap();

        let tree = FsTree::build(&dir).unwrap();
        let assets = tree.get_dir(None, "assets").unwrap();
        let names: Vec<_> = tree.files(assets.id)
            .map(|e| e.path_relative_to(assets).unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, ["b.css", "docs/a.pdf"]);
        assert_eq!(tree.get_file(assets.id, "docs/a.pdf").unwrap().len, 4);
        assert_eq!(tree.get_file(None, "assets/docs/a.pdf").unwrap().file_ext(), Some("pdf"));
        assert!(tree.get_file(None, "assets").is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
