pub mod cmd;
pub mod ui;
pub mod util;
