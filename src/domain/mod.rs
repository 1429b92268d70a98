pub mod bet;
pub mod market;
pub mod user;

pub use bet::*;
pub use market::*;
pub use user::*;
