pub mod gateway;
pub mod guard;
pub mod orchestrator;

pub use gateway::{
    GatewayCallback, InstallmentBlock, OnceLoadedWidget, PaymentWidget, WidgetConfig,
    WidgetLoader, WidgetOutcome, WidgetPrefill,
};
pub use guard::{PlacementGuard, PlacementPermit};
pub use orchestrator::{PaymentOrchestrator, PaymentState};
