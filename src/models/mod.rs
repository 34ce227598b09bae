pub mod acquisition;
pub mod figure;
pub mod figure_image;
pub mod master_data;
pub mod user;
