//! Outbound service clients and the PDF renderer

pub mod gemini;
pub mod pipedrive;
pub mod renderer;
