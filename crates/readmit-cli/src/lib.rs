pub mod serve;
pub mod train;
pub mod ui;
pub mod util;
