//! UI module for the calculator window
//!
//! # Panel Structure
//! - `header` - Window heading
//! - `token_panel` - Access token entry
//! - `input_panel` - Location choice and the fields it requires
//! - `results_panel` - Volume, formula, coefficient, justification, export
//! - `status_bar` - Bottom status messages

pub mod header;
pub mod input_panel;
pub mod results_panel;
pub mod status_bar;
pub mod token_panel;
