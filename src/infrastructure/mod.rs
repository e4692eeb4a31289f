pub mod bootstrap;
pub mod decode;
pub mod review_api;
