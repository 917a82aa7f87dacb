pub mod broaden;
pub mod driver;
pub mod frames;
pub mod locator;
pub mod wait;
pub mod webdriver;
