pub mod address;
pub mod cart;
pub mod coupon;
pub mod draft;
pub mod order;
pub mod serviceability;

pub use address::{Region, ShippingAddress, MOBILE_PATTERN, POSTAL_CODE_PATTERN};
pub use cart::{CartLine, CartSnapshot};
pub use coupon::AppliedCoupon;
pub use draft::{CheckoutDraft, CheckoutPhase, PaymentMethod};
pub use order::{
    GatewayOrder, OrderIntent, OrderReceipt, PaymentVerification, VerificationOutcome,
};
pub use serviceability::ServiceabilityResult;
