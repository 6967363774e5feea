pub mod acquire;
pub mod flux;
pub mod forecast;
pub mod humanizer;
pub mod megaframe;
