pub mod bridge;
pub mod ethereum;
pub mod traits;

pub use bridge::{BridgeOrchestrator, BridgeProgress, BridgeReceipt, RestoreReceipt};
pub use ethereum::EthersNftContract;
pub use traits::NftBridgeContract;
