use std::cell::RefCell;
use std::collections::BTreeMap;

use anyhow::{Result, bail};

use super::{FileSystem, FsResponse};

const HOME: &str = "/home/user";

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(String),
}

/// In-memory filesystem for running without touching the host
/// (`pandora --mock`) and for tests.
#[derive(Debug)]
pub struct MockFileSystem {
    nodes: RefCell<BTreeMap<String, Node>>,
    computer_name: String,
}

impl MockFileSystem {
    /// A small tree rooted at `/` with a populated home directory.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        for dir in ["/", "/home", HOME, "/home/user/documents", "/tmp"] {
            nodes.insert(dir.to_string(), Node::Dir);
        }
        nodes.insert(
            "/home/user/readme.txt".to_string(),
            Node::File("Welcome to pandora.\n".to_string()),
        );
        MockFileSystem {
            nodes: RefCell::new(nodes),
            computer_name: "localhost".to_string(),
        }
    }

    pub fn with_computer_name(mut self, name: impl Into<String>) -> Self {
        self.computer_name = name.into();
        self
    }

    /// Absolute, normalized path for `path` relative to `cwd`.
    fn resolve(cwd: &str, path: &str) -> String {
        let joined = if path == "~" || path.starts_with("~/") {
            format!("{HOME}{}", &path[1..])
        } else if path.starts_with('/') {
            path.to_string()
        } else {
            format!("{cwd}/{path}")
        };

        let mut parts: Vec<&str> = Vec::new();
        for part in joined.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                other => parts.push(other),
            }
        }
        format!("/{}", parts.join("/"))
    }

    fn parent(path: &str) -> &str {
        match path.rfind('/') {
            Some(0) | None => "/",
            Some(i) => &path[..i],
        }
    }

    fn name(path: &str) -> &str {
        path.rsplit('/').next().unwrap_or(path)
    }

    fn is_dir(&self, path: &str) -> bool {
        matches!(self.nodes.borrow().get(path), Some(Node::Dir))
    }

    fn children(&self, dir: &str) -> Vec<String> {
        self.nodes
            .borrow()
            .keys()
            .filter(|p| p.as_str() != dir && Self::parent(p) == dir)
            .map(|p| Self::name(p).to_string())
            .collect()
    }

    /// `dest` itself, or `dest/<name of src>` when `dest` is a directory.
    fn destination(&self, src: &str, dest: &str) -> String {
        if self.is_dir(dest) {
            Self::resolve(dest, Self::name(src))
        } else {
            dest.to_string()
        }
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn pwd(&self, cwd: &str) -> Result<String> {
        let dir = Self::resolve("/", cwd);
        if !self.is_dir(&dir) {
            bail!("pwd: {cwd}: No such file or directory");
        }
        Ok(dir)
    }

    fn ls(&self, cwd: &str, path: Option<&str>) -> Result<Vec<String>> {
        let target = Self::resolve(cwd, path.unwrap_or("."));
        match self.nodes.borrow().get(&target) {
            Some(Node::Dir) => {}
            Some(Node::File(_)) => return Ok(vec![Self::name(&target).to_string()]),
            None => bail!(
                "ls: cannot access '{}': No such file or directory",
                path.unwrap_or(".")
            ),
        }
        Ok(self.children(&target))
    }

    fn cd(&self, cwd: &str, path: &str) -> Result<FsResponse> {
        let target = Self::resolve(cwd, path);
        Ok(match self.nodes.borrow().get(&target) {
            Some(Node::Dir) => FsResponse::with_data(target.clone()),
            Some(Node::File(_)) => FsResponse::failed(format!("cd: not a directory: {path}")),
            None => FsResponse::failed(format!("cd: no such file or directory: {path}")),
        })
    }

    fn cat(&self, cwd: &str, path: &str) -> Result<FsResponse> {
        let target = Self::resolve(cwd, path);
        Ok(match self.nodes.borrow().get(&target) {
            Some(Node::File(content)) => FsResponse::with_data(content.clone()),
            Some(Node::Dir) => FsResponse::failed(format!("cat: {path}: Is a directory")),
            None => FsResponse::failed(format!("cat: {path}: No such file or directory")),
        })
    }

    fn mkdir(&self, cwd: &str, path: &str) -> Result<FsResponse> {
        let target = Self::resolve(cwd, path);
        let mut nodes = self.nodes.borrow_mut();
        let mut current = String::new();
        for part in target.split('/').filter(|p| !p.is_empty()) {
            current.push('/');
            current.push_str(part);
            match nodes.get(&current) {
                Some(Node::File(_)) => {
                    return Ok(FsResponse::failed(format!("mkdir: {path}: Not a directory")));
                }
                Some(Node::Dir) => {}
                None => {
                    nodes.insert(current.clone(), Node::Dir);
                }
            }
        }
        Ok(FsResponse::ok())
    }

    fn touch(&self, cwd: &str, path: &str) -> Result<FsResponse> {
        let target = Self::resolve(cwd, path);
        if !self.is_dir(Self::parent(&target)) {
            return Ok(FsResponse::failed(format!(
                "touch: {path}: No such file or directory"
            )));
        }
        self.nodes
            .borrow_mut()
            .entry(target)
            .or_insert_with(|| Node::File(String::new()));
        Ok(FsResponse::ok())
    }

    fn rm(&self, cwd: &str, path: &str, recursive: bool) -> Result<FsResponse> {
        let target = Self::resolve(cwd, path);
        let mut nodes = self.nodes.borrow_mut();
        match nodes.get(&target) {
            None => Ok(FsResponse::failed(format!(
                "rm: {path}: No such file or directory"
            ))),
            Some(Node::Dir) if !recursive => {
                Ok(FsResponse::failed(format!("rm: {path}: is a directory")))
            }
            Some(_) => {
                let prefix = format!("{target}/");
                nodes.retain(|p, _| *p != target && !p.starts_with(&prefix));
                Ok(FsResponse::ok())
            }
        }
    }

    fn cp(&self, cwd: &str, src: &str, dest: &str) -> Result<FsResponse> {
        let from = Self::resolve(cwd, src);
        let to = self.destination(&from, &Self::resolve(cwd, dest));
        let content = match self.nodes.borrow().get(&from) {
            Some(Node::File(content)) => content.clone(),
            Some(Node::Dir) => {
                return Ok(FsResponse::failed(format!("cp: {src} is a directory")));
            }
            None => {
                return Ok(FsResponse::failed(format!(
                    "cp: {src}: No such file or directory"
                )));
            }
        };
        if !self.is_dir(Self::parent(&to)) {
            return Ok(FsResponse::failed(format!(
                "cp: {dest}: No such file or directory"
            )));
        }
        self.nodes.borrow_mut().insert(to, Node::File(content));
        Ok(FsResponse::ok())
    }

    fn mv(&self, cwd: &str, src: &str, dest: &str) -> Result<FsResponse> {
        let from = Self::resolve(cwd, src);
        let to = self.destination(&from, &Self::resolve(cwd, dest));
        if !self.nodes.borrow().contains_key(&from) {
            return Ok(FsResponse::failed(format!(
                "mv: {src}: No such file or directory"
            )));
        }
        if !self.is_dir(Self::parent(&to)) {
            return Ok(FsResponse::failed(format!(
                "mv: {dest}: No such file or directory"
            )));
        }

        let mut nodes = self.nodes.borrow_mut();
        let prefix = format!("{from}/");
        let moved: Vec<(String, Node)> = nodes
            .iter()
            .filter(|(p, _)| **p == from || p.starts_with(&prefix))
            .map(|(p, n)| (format!("{to}{}", &p[from.len()..]), n.clone()))
            .collect();
        nodes.retain(|p, _| *p != from && !p.starts_with(&prefix));
        nodes.extend(moved);
        Ok(FsResponse::ok())
    }

    fn computer_name(&self) -> Result<String> {
        Ok(self.computer_name.clone())
    }

    fn home_dir(&self) -> String {
        HOME.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_normalizes() {
        assert_eq!(MockFileSystem::resolve("/home/user", ".."), "/home");
        assert_eq!(MockFileSystem::resolve("/home/user", "../../.."), "/");
        assert_eq!(MockFileSystem::resolve("/tmp", "~/documents"), "/home/user/documents");
        assert_eq!(MockFileSystem::resolve("/tmp", "/etc/./x"), "/etc/x");
    }

    #[test]
    fn seeded_home_lists_children() {
        let fs = MockFileSystem::new();
        assert_eq!(
            fs.ls(HOME, None).unwrap(),
            vec!["documents".to_string(), "readme.txt".to_string()]
        );
        assert_eq!(fs.ls("/", None).unwrap(), vec!["home", "tmp"]);
    }

    #[test]
    fn mkdir_touch_and_cat() {
        let fs = MockFileSystem::new();
        assert!(fs.mkdir(HOME, "a/b").unwrap().success);
        assert!(fs.touch(HOME, "a/b/note").unwrap().success);
        assert_eq!(fs.ls(HOME, Some("a/b")).unwrap(), vec!["note"]);
        assert_eq!(fs.cat(HOME, "a/b/note").unwrap().data.as_deref(), Some(""));
        assert!(!fs.touch(HOME, "missing/x").unwrap().success);
    }

    #[test]
    fn cd_checks_node_kind() {
        let fs = MockFileSystem::new();
        assert_eq!(fs.cd(HOME, "documents").unwrap().data.as_deref(), Some("/home/user/documents"));
        assert!(!fs.cd(HOME, "readme.txt").unwrap().success);
        assert!(!fs.cd(HOME, "nowhere").unwrap().success);
    }

    #[test]
    fn rm_mv_cp() {
        let fs = MockFileSystem::new();
        assert!(fs.cp(HOME, "readme.txt", "documents").unwrap().success);
        assert!(fs.mv(HOME, "documents", "docs").unwrap().success);
        assert_eq!(fs.ls(HOME, Some("docs")).unwrap(), vec!["readme.txt"]);

        assert!(!fs.rm(HOME, "docs", false).unwrap().success);
        assert!(fs.rm(HOME, "docs", true).unwrap().success);
        assert_eq!(fs.ls(HOME, None).unwrap(), vec!["readme.txt"]);
    }

    #[test]
    fn missing_directory_listing_is_an_error() {
        let fs = MockFileSystem::new();
        assert!(fs.ls(HOME, Some("ghost")).is_err());
        assert!(fs.pwd("/ghost").is_err());
    }
}
