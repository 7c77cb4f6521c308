//! Domain models and their JSON projections.
//!
//! Domain structs are what repositories return. `*View` structs are the
//! wire shapes the storefront frontend consumes; they resolve image paths to
//! absolute URLs and use the frontend's field names.

pub mod cart;
pub mod catalog;
pub mod content;
pub mod media;
pub mod order;
pub mod page;
pub mod session;
pub mod user;

pub use cart::{Cart, CartItem, CartItemView, CartView};
pub use catalog::{
    Brand, BrandView, Category, CategoryView, NavbarCategory, NavbarCategoryView, Product,
    ProductDetailView, ProductSummary, SubcategoryView,
};
pub use content::{ContactSubmission, Notification, NotificationView};
pub use media::MediaUrls;
pub use order::{Order, OrderItem, OrderItemView, OrderView};
pub use page::{Page, PageQuery};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
