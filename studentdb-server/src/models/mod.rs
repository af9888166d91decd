//! Request/response shapes owned by the server layer

pub mod pagination;

pub use pagination::{Paginated, Pagination, PaginationParams};
