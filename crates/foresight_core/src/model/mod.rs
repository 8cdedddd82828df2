mod canonical;
mod events;
mod ids;
mod policy;
mod state;

pub use canonical::{AmountWithFrequency, CanonicalEvent, CanonicalMetadata, NormalizedEvent};
pub use events::{
    CashFlowFields, DebtFields, EventCategory, EventKind, EventPayload, Frequency, RawEvent,
    RealEstateFields,
};
pub use ids::EventId;
pub use policy::{
    ALL_BUCKETS, AccountKind, AmountCapability, EventPolicy, INVESTABLE_BUCKETS, RoutingRule,
    WITHDRAWABLE_BUCKETS,
};
pub use state::{
    AccountSet, AccountState, Holding, Liability, RealEstateAsset, SimulationState, TaxAccumulator,
};
