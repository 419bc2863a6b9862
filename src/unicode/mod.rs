//! Unicode utilities for display width, wrapping and rune-slice search.

mod runes;
mod width;

pub use runes::{
    aggregate, equal_fold, equal_rune, has_prefix, has_prefix_fold, index_all, index_all_bck,
    index_all_bck_fold, index_all_fold, trim_space_left,
};
pub use width::{
    TAB_WIDTH, is_word_break, line_count, split_by_line, strip_ansi_color, width, width_all,
};
