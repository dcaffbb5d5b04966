use std::path::PathBuf;

/// Well-known locations under the notes root (the working directory).
pub struct NotesPaths {
    pub root: PathBuf,
    pub data: PathBuf,
    pub config: PathBuf,
}

impl NotesPaths {
    pub fn current() -> Self {
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::from_root(root)
    }

    pub fn from_root(root: PathBuf) -> Self {
        Self {
            data: root.join(".notes"),
            config: root.join(".notes/config.yaml"),
            root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let paths = NotesPaths::from_root(PathBuf::from("/home/me"));
        assert_eq!(paths.data, PathBuf::from("/home/me/.notes"));
        assert_eq!(paths.config, PathBuf::from("/home/me/.notes/config.yaml"));
    }
}
