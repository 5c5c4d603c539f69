//! Pure data structures shared by the cart engine, the request layer and the tracker.

pub mod cart;
pub mod menu;
pub mod order;
pub mod session;

pub use cart::*;
pub use menu::*;
pub use order::*;
pub use session::*;
