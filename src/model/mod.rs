mod result;
mod roast;
mod share_card;

pub use result::*;
pub use roast::*;
pub use share_card::*;
