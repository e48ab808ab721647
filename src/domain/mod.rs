mod balance;
mod money;
mod session;
mod transaction;
mod verification;

pub use balance::*;
pub use money::*;
pub use session::*;
pub use transaction::*;
pub use verification::*;
