// Adapters layer: concrete implementations of the domain ports (local files, WebDriver browsers)

pub mod storage;
pub mod webdriver;

pub use storage::LocalStorage;
pub use webdriver::{WebDriverFactory, WebDriverSession};
