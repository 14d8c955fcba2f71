use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const DEFAULT_FILE_PREFIX: &str = "extract-";
pub const DEFAULT_FILE_SUFFIX: &str = ".xlsx";

pub fn write_output(target: &Path, language: &str, bytes: &[u8]) -> Result<PathBuf> {
    if target.is_dir() {
        return write_generated(target, language, bytes);
    }

    std::fs::write(target, bytes)
        .with_context(|| format!("出力ファイルの書き込みに失敗しました: {}", target.display()))?;
    Ok(target.to_path_buf())
}

fn write_generated(dir: &Path, language: &str, bytes: &[u8]) -> Result<PathBuf> {
    let suffix = format!("-{}{DEFAULT_FILE_SUFFIX}", file_name_safe(language));
    let mut file = tempfile::Builder::new()
        .prefix(DEFAULT_FILE_PREFIX)
        .suffix(&suffix)
        .tempfile_in(dir)
        .with_context(|| format!("出力ファイルを作成できませんでした: {}", dir.display()))?;
    file.write_all(bytes).with_context(|| {
        format!(
            "出力ファイルの書き込みに失敗しました: {}",
            file.path().display()
        )
    })?;
    let (_, path) = file
        .keep()
        .with_context(|| format!("出力ファイルを確定できませんでした: {}", dir.display()))?;
    Ok(path)
}

fn file_name_safe(language: &str) -> String {
    language
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_target_gets_a_generated_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_output(dir.path(), "java", b"PK").expect("write");

        assert_eq!(path.parent(), Some(dir.path()));
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .expect("file name");
        assert!(name.starts_with("extract-"), "name={name}");
        assert!(name.ends_with("-java.xlsx"), "name={name}");
        assert!(name.len() > "extract--java.xlsx".len(), "name={name}");
        assert_eq!(std::fs::read(&path).expect("read"), b"PK");
    }

    #[test]
    fn two_exports_into_one_directory_do_not_collide() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = write_output(dir.path(), "cpp,c", b"a").expect("write a");
        let b = write_output(dir.path(), "cpp,c", b"b").expect("write b");
        assert_ne!(a, b);
        assert!(
            a.to_string_lossy().ends_with("-cpp,c.xlsx"),
            "a={}",
            a.display()
        );
    }

    #[test]
    fn file_target_is_created_or_truncated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("rules.xlsx");
        std::fs::write(&target, b"previous content that is longer").expect("seed");

        let path = write_output(&target, "java", b"new").expect("write");
        assert_eq!(path, target);
        assert_eq!(std::fs::read(&target).expect("read"), b"new");
    }

    #[test]
    fn missing_parent_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("no/such/dir/rules.xlsx");
        assert!(write_output(&target, "java", b"x").is_err());
    }

    #[test]
    fn language_separators_are_not_path_components() {
        assert_eq!(file_name_safe("java/../x"), "java_.._x");
    }
}
