use serde_json::Value;

use crate::error::LoadError;

/// 输入文档读取器 trait
/// 不同文件格式（纯 JSON、gzip 压缩 JSON）需要实现这个 trait
pub trait DocumentReader: Send + Sync {
    /// 获取支持的文件扩展名（不含点号），例如: "json"
    fn supported_extensions(&self) -> Vec<&'static str>;

    /// 检查文件扩展名是否被支持
    fn supports(&self, extension: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }

    /// 从文件路径读取并解析 JSON 文档
    fn read_from_file(&self, file_path: &str) -> Result<Value, LoadError>;

    /// 获取读取器名称（用于日志和错误信息）
    fn name(&self) -> &'static str;
}
