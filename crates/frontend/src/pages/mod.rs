pub mod account;
pub mod designer;
pub mod favorites;
pub mod history;
pub mod navigation;
