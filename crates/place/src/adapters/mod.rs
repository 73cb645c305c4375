pub mod grid_dto;
pub mod presenter;
pub mod render;
