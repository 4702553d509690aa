use std::fs::File;
use std::io::BufReader;

use flate2::read::GzDecoder;
use serde_json::Value;

use crate::error::LoadError;
use crate::utils::reader::DocumentReader;

/// gzip 压缩的 JSON 文档读取器
/// 大规模网格的历史数组通常以 .json.gz 形式归档
pub struct GzipJsonReader;

impl GzipJsonReader {
    pub fn new() -> Self {
        GzipJsonReader
    }
}

impl Default for GzipJsonReader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentReader for GzipJsonReader {
    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["gz"]
    }

    fn name(&self) -> &'static str {
        "Gzip JSON Reader"
    }

    fn read_from_file(&self, file_path: &str) -> Result<Value, LoadError> {
        let file = File::open(file_path).map_err(|source| LoadError::Io {
            path: file_path.to_string(),
            source,
        })?;
        let decoder = GzDecoder::new(BufReader::new(file));
        // 解压失败在 serde_json 中表现为 IO 类错误
        serde_json::from_reader(decoder).map_err(|source| LoadError::Json {
            path: file_path.to_string(),
            source,
        })
    }
}
