pub mod chat;
pub mod generate;
pub mod health;
pub mod widget_types;
pub mod widgets;
