pub mod douban;

pub use douban::{DouBanApi, DouBanEndpoint, DouBanSettings};
