mod pdf;

pub use pdf::PdfExtractor;
