mod alias;

pub use alias::{
    click_handler, create_handler, get_all_handler, get_by_code_handler, redirect_handler,
};
