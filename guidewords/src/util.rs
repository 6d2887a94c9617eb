use std::path::Path;

use guidebook::err;
use guidebook::error::Result;
use guidebook::fstree::{EntryId, FsTree};

#[track_caller]
pub fn dircheck<P: AsRef<Path>>(
    tree: &FsTree,
    root: Option<EntryId>,
    path: P,
    must_exist: bool,
) -> Result<Option<EntryId>> {
    let path = path.as_ref();
    match (tree.get(root, path), must_exist) {
        (Some(e), _) if e.is_dir => Ok(Some(e.id)),
        (Some(_) | None, false) => Ok(None),
        (Some(e), true) => err! {
            format!("{} path must point to a directory", e.file_stem()),
            "path is not a directory" => e.path.display(),
        },
        (None, true) => err! {
            format!("{} must point to an existing directory", path.display()),
            "path does not exist" => path.display(),
        },
    }
}
