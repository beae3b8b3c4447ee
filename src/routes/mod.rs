pub mod balloons;
pub mod health;
pub mod page;
