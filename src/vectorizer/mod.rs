pub mod aggregate;
pub mod compare;
pub mod matrix;
pub mod term;
pub mod vector;
pub mod vocabulary;
