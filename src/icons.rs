//! 按扩展名归类文件图标。

use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IconKind {
    Directory,
    Executable,
    Library,
    System,
    DiskImage,
    Text,
    Image,
    Archive,
    Source,
    Document,
}

const EXTENSION_TABLE: &[(&str, IconKind)] = &[
    ("exe", IconKind::Executable),
    ("bin", IconKind::Executable),
    ("dll", IconKind::Library),
    ("so", IconKind::Library),
    ("dylib", IconKind::Library),
    ("sys", IconKind::System),
    ("iso", IconKind::DiskImage),
    ("img", IconKind::DiskImage),
    ("dmg", IconKind::DiskImage),
    ("txt", IconKind::Text),
    ("md", IconKind::Text),
    ("log", IconKind::Text),
    ("jpg", IconKind::Image),
    ("jpeg", IconKind::Image),
    ("png", IconKind::Image),
    ("gif", IconKind::Image),
    ("webp", IconKind::Image),
    ("svg", IconKind::Image),
    ("zip", IconKind::Archive),
    ("tar", IconKind::Archive),
    ("gz", IconKind::Archive),
    ("rar", IconKind::Archive),
    ("7z", IconKind::Archive),
    ("xz", IconKind::Archive),
    ("go", IconKind::Source),
    ("c", IconKind::Source),
    ("cpp", IconKind::Source),
    ("h", IconKind::Source),
    ("py", IconKind::Source),
    ("js", IconKind::Source),
    ("ts", IconKind::Source),
    ("rs", IconKind::Source),
    ("sh", IconKind::Source),
];

impl IconKind {
    /// 根据文件名与目录标记确定图标类别，目录优先于扩展名。
    pub fn classify(name: &str, is_dir: bool) -> Self {
        if is_dir {
            return IconKind::Directory;
        }
        let Some(ext) = Path::new(name).extension().and_then(|ext| ext.to_str()) else {
            return IconKind::Document;
        };
        EXTENSION_TABLE
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
            .map(|(_, kind)| *kind)
            .unwrap_or(IconKind::Document)
    }

    /// 页面中使用的 CSS 类名。
    pub fn tag(self) -> &'static str {
        match self {
            IconKind::Directory => "directory",
            IconKind::Executable => "executable",
            IconKind::Library => "library",
            IconKind::System => "system",
            IconKind::DiskImage => "disk-image",
            IconKind::Text => "text",
            IconKind::Image => "image",
            IconKind::Archive => "archive",
            IconKind::Source => "source",
            IconKind::Document => "document",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            IconKind::Directory => "📂",
            IconKind::Executable => "💻",
            IconKind::Library => "🧩",
            IconKind::System => "🔒",
            IconKind::DiskImage => "📀",
            IconKind::Text | IconKind::Document => "📄",
            IconKind::Image => "🖼️",
            IconKind::Archive => "📦",
            IconKind::Source => "⚙️",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::IconKind;

    #[test]
    fn classifies_by_extension_case_insensitively() {
        assert_eq!(IconKind::classify("setup.EXE", false), IconKind::Executable);
        assert_eq!(IconKind::classify("libfoo.so", false), IconKind::Library);
        assert_eq!(IconKind::classify("disk.iso", false), IconKind::DiskImage);
        assert_eq!(IconKind::classify("photo.JPeG", false), IconKind::Image);
        assert_eq!(IconKind::classify("backup.tar.gz", false), IconKind::Archive);
        assert_eq!(IconKind::classify("main.rs", false), IconKind::Source);
        assert_eq!(IconKind::classify("notes.md", false), IconKind::Text);
    }

    #[test]
    fn directory_overrides_extension_and_unknown_is_document() {
        assert_eq!(IconKind::classify("archive.zip", true), IconKind::Directory);
        assert_eq!(IconKind::classify("Makefile", false), IconKind::Document);
        assert_eq!(IconKind::classify("report.pdf", false), IconKind::Document);
    }
}
