pub use ladle_core::*;
