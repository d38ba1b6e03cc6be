pub mod identity_resolver;
pub mod investment_service;
pub mod transfer;
pub mod transfer_swap;
pub mod wallet_api;

pub use identity_resolver::{IdentityResolver, ResolutionSource};
pub use investment_service::{InvestmentReceipt, InvestmentService, InvestmentSubmission};
pub use transfer::{JsonRpcTransferCapability, TransferCapability, TransferRequest};
pub use transfer_swap::{TransferSwapOrchestrator, TransferSwapResult};
pub use wallet_api::{BatchSwapRequest, HttpWalletApi, SwapConfirmation, WalletApi, WalletDetails};
