pub mod error;
pub mod interface;
pub mod methods;
pub mod validate;

pub use error::ApiError;
pub use interface::ReviewApi;
pub use methods::ApiMethods;
