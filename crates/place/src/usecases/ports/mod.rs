pub mod canvas_repository;
#[cfg(test)]
pub(crate) mod test_support;

pub use canvas_repository::CanvasRepository;
pub use canvas_repository::CanvasSnapshot;
pub use canvas_repository::GridSubscription;
