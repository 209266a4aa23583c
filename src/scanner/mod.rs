use crate::error::{InspectionError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// アップロード対象の写真1枚
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoInput {
    pub path: PathBuf,
    pub file_name: String,
}

impl PhotoInput {
    pub fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path: path.to_path_buf(),
            file_name,
        }
    }
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| is_image_extension(&ext.to_string_lossy()))
        .unwrap_or(false)
}

/// フォルダ直下の画像を列挙（ファイル名順）
pub fn scan_folder(folder: &Path) -> Result<Vec<PhotoInput>> {
    if !folder.is_dir() {
        return Err(InspectionError::FolderNotFound(folder.display().to_string()));
    }

    let mut photos: Vec<PhotoInput> = WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_image_path(e.path()))
        .map(|e| PhotoInput::from_path(e.path()))
        .collect();

    // ファイル名でソート
    photos.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(photos)
}

/// 入力（ファイルまたはフォルダ）から写真を集める
///
/// ファイルは指定順、フォルダはその位置に中身をファイル名順で展開する。
/// 明示指定のファイルは拡張子を問わない（読めなければ解析時に失敗扱い）。
pub fn collect_photos(inputs: &[PathBuf]) -> Result<Vec<PhotoInput>> {
    let mut photos = Vec::new();

    for input in inputs {
        if input.is_dir() {
            photos.extend(scan_folder(input)?);
        } else if input.is_file() {
            photos.push(PhotoInput::from_path(input));
        } else {
            return Err(InspectionError::FileNotFound(input.display().to_string()));
        }
    }

    Ok(photos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;

    #[test]
    fn test_is_image_extension() {
        assert!(is_image_extension("jpg"));
        assert!(is_image_extension("JPG"));
        assert!(is_image_extension("jpeg"));
        assert!(is_image_extension("PNG"));
        assert!(!is_image_extension("txt"));
        assert!(!is_image_extension("heic"));
        assert!(!is_image_extension("gif"));
    }

    #[test]
    fn test_scan_folder_not_found() {
        let result = scan_folder(Path::new("/nonexistent/folder"));
        assert!(matches!(result, Err(InspectionError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_folder_filters_and_sorts() {
        let temp_dir = std::env::temp_dir().join("inspection-ai-test-scan");
        fs::create_dir_all(&temp_dir).unwrap();

        for name in ["c.jpg", "a.PNG", "b.jpeg", "notes.txt"] {
            File::create(temp_dir.join(name)).unwrap().write_all(b"dummy").unwrap();
        }

        let result = scan_folder(&temp_dir).unwrap();
        let names: Vec<&str> = result.iter().map(|p| p.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.PNG", "b.jpeg", "c.jpg"]);

        fs::remove_dir_all(&temp_dir).ok();
    }

    #[test]
    fn test_collect_photos_keeps_file_order() {
        let temp_dir = std::env::temp_dir().join("inspection-ai-test-collect");
        fs::create_dir_all(&temp_dir).unwrap();
        let z = temp_dir.join("z.jpg");
        let a = temp_dir.join("a.jpg");
        File::create(&z).unwrap();
        File::create(&a).unwrap();

        let result = collect_photos(&[z.clone(), a.clone()]).unwrap();
        assert_eq!(result[0].path, z);
        assert_eq!(result[1].path, a);

        let missing = collect_photos(&[temp_dir.join("missing.jpg")]);
        assert!(matches!(missing, Err(InspectionError::FileNotFound(_))));

        fs::remove_dir_all(&temp_dir).ok();
    }
}
