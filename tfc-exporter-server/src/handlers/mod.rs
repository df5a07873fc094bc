pub mod landing;
pub mod metrics;
