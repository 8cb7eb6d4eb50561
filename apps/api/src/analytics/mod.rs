pub mod influence;
pub mod time_range;
pub mod timeline;
pub mod trends;
