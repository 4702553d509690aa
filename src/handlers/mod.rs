pub mod field;
pub mod health;
pub mod performance;
pub mod process;
pub mod volume;

pub use field::get_volume_field;
pub use health::hello;
pub use performance::get_performance;
pub use process::{process_volume, process_volume_inline};
pub use volume::get_volume;
