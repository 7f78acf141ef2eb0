/// Business logic layer
pub mod bootstrap;
pub mod companies;

pub use companies::{page_size, CompanyService, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
