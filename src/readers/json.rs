use std::fs::File;
use std::io::BufReader;

use serde_json::Value;

use crate::error::LoadError;
use crate::utils::reader::DocumentReader;

/// 纯 JSON 文档读取器
pub struct JsonReader;

impl JsonReader {
    pub fn new() -> Self {
        JsonReader
    }
}

impl Default for JsonReader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentReader for JsonReader {
    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["json"]
    }

    fn name(&self) -> &'static str {
        "JSON Reader"
    }

    fn read_from_file(&self, file_path: &str) -> Result<Value, LoadError> {
        let file = File::open(file_path).map_err(|source| LoadError::Io {
            path: file_path.to_string(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| LoadError::Json {
            path: file_path.to_string(),
            source,
        })
    }
}
