pub mod event;
pub mod series;
