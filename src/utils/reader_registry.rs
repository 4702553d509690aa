use serde_json::Value;

use crate::error::LoadError;
use crate::utils::reader::DocumentReader;

/// 读取器注册表
/// 管理所有可用的文档读取器，并根据文件扩展名匹配对应的读取器
pub struct ReaderRegistry {
    readers: Vec<Box<dyn DocumentReader>>,
}

impl ReaderRegistry {
    /// 创建新的读取器注册表，自动注册所有可用的读取器
    pub fn new() -> Self {
        let readers = crate::readers::get_all_readers();
        Self { readers }
    }

    /// 根据文件扩展名查找匹配的读取器
    /// extension: 文件扩展名（不含点号），例如 "json"
    pub fn find_reader(&self, extension: &str) -> Option<&dyn DocumentReader> {
        self.readers
            .iter()
            .find(|reader| reader.supports(extension))
            .map(|r| r.as_ref())
    }

    /// 根据文件路径查找匹配的读取器
    /// 自动提取文件扩展名，"results.json.gz" 取 "gz"
    pub fn find_reader_for_file(&self, file_path: &str) -> Option<(&dyn DocumentReader, String)> {
        let extension = std::path::Path::new(file_path)
            .extension()
            .and_then(|ext| ext.to_str())?
            .to_string();

        self.find_reader(&extension)
            .map(|reader| (reader, extension))
    }

    /// 按扩展名选择读取器并读取文档
    pub fn read_document(&self, file_path: &str) -> Result<Value, LoadError> {
        let (reader, _) =
            self.find_reader_for_file(file_path)
                .ok_or_else(|| LoadError::UnsupportedFormat {
                    path: file_path.to_string(),
                    supported: self.supported_extensions(),
                })?;
        reader.read_from_file(file_path)
    }

    /// 获取所有支持的扩展名列表
    pub fn supported_extensions(&self) -> Vec<String> {
        let mut extensions = Vec::new();
        for reader in &self.readers {
            extensions.extend(
                reader
                    .supported_extensions()
                    .iter()
                    .map(|s| s.to_lowercase()),
            );
        }
        extensions.sort();
        extensions.dedup();
        extensions
    }
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions_sorted() {
        let registry = ReaderRegistry::new();
        assert_eq!(registry.supported_extensions(), vec!["gz", "json"]);
    }

    #[test]
    fn test_find_reader_by_extension() {
        let registry = ReaderRegistry::new();
        let (reader, ext) = registry
            .find_reader_for_file("data/navier_stokes_results.JSON")
            .unwrap();
        assert_eq!(ext, "JSON");
        assert_eq!(reader.name(), "JSON Reader");

        let (reader, _) = registry.find_reader_for_file("initial_data.json.gz").unwrap();
        assert_eq!(reader.name(), "Gzip JSON Reader");
    }

    #[test]
    fn test_unknown_extension() {
        let registry = ReaderRegistry::new();
        assert!(registry.find_reader_for_file("results.vtk").is_none());
        assert!(registry.find_reader_for_file("no_extension").is_none());
    }

    #[test]
    fn test_read_document_unsupported_format() {
        let err = ReaderRegistry::new()
            .read_document("results.vtk")
            .unwrap_err();
        match err {
            LoadError::UnsupportedFormat { path, supported } => {
                assert_eq!(path, "results.vtk");
                assert_eq!(supported, vec!["gz", "json"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
