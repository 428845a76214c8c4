mod canvas;

pub use canvas::{BrailleCanvas, FillCanvas};
