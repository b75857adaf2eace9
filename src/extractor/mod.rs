//! Metadata extraction: parsing, format catalog and URL resolution

pub mod catalog;
pub mod client;
pub mod models;
pub mod parser;
pub mod resolver;
pub mod traits;

pub use catalog::compare_formats;
pub use client::{extract_video_id, Endpoints, YoutubeClient};
pub use models::{Format, FormatList, Thumbnail, Video};
pub use parser::{parse, MetadataSource};
pub use resolver::StreamResolver;
pub use traits::{Decipherer, UnavailableDecipherer};
