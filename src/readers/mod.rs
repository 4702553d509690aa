mod gzip;
mod json;

pub use gzip::GzipJsonReader;
pub use json::JsonReader;

/// 获取所有可用的读取器
pub fn get_all_readers() -> Vec<Box<dyn crate::utils::reader::DocumentReader>> {
    vec![Box::new(JsonReader::new()), Box::new(GzipJsonReader::new())]
}
