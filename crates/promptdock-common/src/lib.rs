pub mod error;
pub mod html;
pub mod protocol;
pub mod selector;
pub mod sites;
