pub mod error;
pub mod escape;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod selector;
pub mod serializer;
pub mod style;

pub use error::{DomError, ParseError, ParseResult, SelectorError};
pub use escape::{css_escape, css_unescape};
pub use node::{Dom, Element, NodeId, NodeKind, Position};
pub use selector::SelectorList;
pub use style::StyleDeclarations;
