pub mod bbox;
pub mod cluster;
pub mod labels;
pub mod similarity;
