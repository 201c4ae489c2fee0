pub mod flash;
pub mod nav_bar;
pub mod route_map;
