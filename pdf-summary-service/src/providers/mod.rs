pub mod blob_store;
pub mod identity;
pub mod summarizer;

pub use blob_store::HttpBlobStore;
pub use identity::{
    HttpIdentityProvider, IdentityProvider, PaymentsPlanChecker, SubscriptionChecker, User,
};
pub use summarizer::LlmSummarizer;
