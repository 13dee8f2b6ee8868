pub mod lead;
mod route;
pub mod util;
pub use lead::lead_route;
pub use route::main_route;
pub use util::util_route;
