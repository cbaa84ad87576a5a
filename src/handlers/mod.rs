mod fallback;
mod hit;
mod index;
mod metrics;
mod photo;
mod stats;

pub use fallback::fallback_handler;
pub use hit::hit_handler;
pub use index::index_handler;
pub use metrics::metrics_handler;
pub use photo::take_photo_handler;
pub use stats::stats_handler;
