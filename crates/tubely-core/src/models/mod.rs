pub mod location;
pub mod orientation;
pub mod video;

pub use location::VideoLocation;
pub use orientation::{Orientation, VideoGeometry};
pub use video::{Video, VideoResponse};
