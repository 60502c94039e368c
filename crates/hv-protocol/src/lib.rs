pub mod entity;
pub mod plan;
pub mod schema;
pub mod service;
pub mod turn;

pub use entity::*;
pub use plan::*;
pub use schema::*;
pub use service::*;
pub use turn::*;
