pub mod chains;
pub mod clock;
pub mod config;
pub mod eip1193;
pub mod notify;

pub use chains::ChainDirectoryAdapter;
pub use clock::SystemClockAdapter;
pub use config::WalletAdapterConfig;
pub use eip1193::Eip1193Adapter;
pub use notify::NotifierAdapter;
