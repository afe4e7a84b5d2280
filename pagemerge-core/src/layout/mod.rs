pub mod component;
pub mod element;
pub mod page;
