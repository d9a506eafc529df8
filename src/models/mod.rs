//! Data models for the library catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod form;
pub mod genre;
pub mod pagination;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::{Book, BookSummary};
pub use book_instance::{BookInstance, BookInstanceView, LoanStatus};
pub use genre::{Genre, Language};
pub use pagination::{PageQuery, Paginated, Pager};
pub use user::{Permission, User, UserClaims};
