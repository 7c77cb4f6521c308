//! Domain types for the shop backend.

pub mod catalog;
pub mod email;
pub mod id;
pub mod phone;
pub mod shipping;
pub mod status;

pub use catalog::{Badge, BrandType, NotificationType};
pub use email::{Email, EmailError};
pub use id::*;
pub use phone::{Phone, PhoneError};
pub use shipping::{DeliveryArea, ShippingRates};
pub use status::OrderStatus;
