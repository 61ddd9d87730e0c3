pub mod artifact;
pub mod inference;
pub mod train;
pub mod util;
