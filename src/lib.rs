pub mod imaging;
pub mod logger;
