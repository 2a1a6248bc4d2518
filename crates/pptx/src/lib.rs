//! PPTX (Office Open XML) backend for generated research decks.
//!
//! Builds an in-memory [`Deck`] from parsed slide records, writes it as a
//! .pptx ZIP package and reads saved packages back for verification.

pub mod builder;
pub mod deck;
pub mod package;
pub mod reader;
pub mod shape;
pub mod template;

pub use builder::{title_image_prompt, DeckBuilder, DeckStyle};
pub use deck::{Deck, LayoutKind, Slide};
pub use package::{write_package, PackageSink, ZipPackageSink};
pub use reader::{DeckReader, DeckSummary, ShapeKind, SlideSummary};
pub use shape::{Paragraph, Shape, TextContainer};
