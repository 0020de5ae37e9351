pub mod filter;
pub mod pipeline;
pub mod window;

pub use filter::{filter_by_moneyness, Moneyness};
pub use pipeline::ChainView;
pub use window::{select_window, MAX_WINDOW_SIZE};
