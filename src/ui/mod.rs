/// UI module exports
pub mod board;
pub mod line_item_row;
