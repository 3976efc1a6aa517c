//! Service layer: lifecycle orchestration.
//!
//! [`LifecycleService`] turns voice-state changes into channel pair
//! transitions and emits events through the [`super::domain::EventBus`].
//! [`SetupService`] provisions the trigger channels.

pub mod checker;
pub mod factory;
pub mod lifecycle;
pub mod setup;

pub use checker::EventCheck;
pub use factory::{ChannelFactory, ChannelPair, PairFailure};
pub use lifecycle::{LifecycleService, Transition};
pub use setup::{SetupReport, SetupService};
