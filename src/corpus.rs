use std::path::{Path, PathBuf};

use log::info;
use regex::Regex;
use walkdir::WalkDir;

/// 图片库中的一张图片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusItem {
    /// 绝对路径（或相对于当前目录的完整路径），用于读取图片
    pub path: PathBuf,
    /// 相对于图片库根目录的路径，作为图片的唯一标识
    pub relative: String,
    /// 类别标签，即图片所在的子目录
    pub label: String,
}

/// 根据逗号分隔的后缀名构建不区分大小写的正则
pub fn suffix_regex(suffix: &str) -> Result<Regex, regex::Error> {
    let alternatives = suffix.split(',').map(|s| regex::escape(s.trim())).collect::<Vec<_>>();
    Regex::new(&format!("(?i)^({})$", alternatives.join("|")))
}

/// 扫描图片库目录，按相对路径排序返回所有后缀匹配的图片
pub fn list_items(root: impl AsRef<Path>, suffix: &Regex) -> Vec<CorpusItem> {
    let root = root.as_ref();
    info!("开始扫描目录: {}", root.display());
    let items = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry.path().extension().is_some_and(|ext| suffix.is_match(&ext.to_string_lossy()))
        })
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?.to_path_buf();
            let label = relative.parent().map(to_slash).unwrap_or_default();
            Some(CorpusItem {
                path: entry.into_path(),
                relative: to_slash(&relative),
                label,
            })
        })
        .collect::<Vec<_>>();
    info!("扫描完成，共 {} 张图片", items.len());
    items
}

/// 统一使用 `/` 作为分隔符，保证不同平台上生成的标识一致
fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_list_items() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("dog")).unwrap();
        fs::create_dir_all(dir.path().join("cat/small")).unwrap();
        for name in ["dog/b.JPG", "dog/a.png", "cat/small/c.bmp", "root.jpeg", "dog/notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let re = suffix_regex("png,jpg,bmp,jpeg").unwrap();
        let items = list_items(dir.path(), &re);
        let found =
            items.iter().map(|i| (i.relative.as_str(), i.label.as_str())).collect::<Vec<_>>();
        assert_eq!(
            found,
            [
                ("cat/small/c.bmp", "cat/small"),
                ("dog/a.png", "dog"),
                ("dog/b.JPG", "dog"),
                ("root.jpeg", "")
            ]
        );
        assert!(items.iter().all(|i| i.path.starts_with(dir.path())));
    }

    #[test]
    fn test_suffix_regex() {
        let re = suffix_regex("jpg, png").unwrap();
        assert!(re.is_match("JPG"));
        assert!(re.is_match("png"));
        assert!(!re.is_match("jpgx"));
    }
}
